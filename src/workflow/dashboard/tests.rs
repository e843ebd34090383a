use serde_json::json;

use super::*;
use crate::interfaces::document_store::to_document;
use crate::interfaces::DocumentStore;
use crate::test_utils::TestHarness;

fn session(uid: &str, role: Role) -> Session {
    Session::new(uid, format!("{}@example.com", uid), role)
}

async fn seed_project(harness: &TestHarness, id: &str, installer_id: &str, status: ProjectStatus) {
    let project = Project {
        installer_id: installer_id.to_string(),
        client_name: "Client".to_string(),
        details: "Patio awning".to_string(),
        status,
    };
    harness
        .store
        .put(PROJECTS, id, to_document(&project).unwrap())
        .await
        .unwrap();
}

#[test]
fn test_orders_report_counts_raw_status() {
    let orders: Vec<StoredDocument> = [
        json!({"status": "Completed"}),
        json!({"status": "Pending"}),
        json!({"status": "Pending"}),
        json!({"status": "Approved"}),
        json!({"status": "Shipped"}),
        json!({}),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, body)| StoredDocument {
        id: i.to_string(),
        data: to_document(&body).unwrap(),
    })
    .collect();

    let report = OrdersReport::from_orders(&orders);
    assert_eq!(
        report,
        OrdersReport {
            total: 6,
            completed: 1,
            pending: 2,
            approved: 1,
        }
    );
}

#[tokio::test]
async fn test_dealer_summary() {
    let harness = TestHarness::new();
    harness.seed_user("d1", "Dana", Role::Dealer, "ref-1-1").await;
    harness
        .store
        .array_union(USERS, "d1", "referrals", vec![json!("x"), json!("y")])
        .await
        .unwrap();
    harness.seed_quotation(100001, "d1", "Awning-X").await;
    harness.seed_quotation(100002, "d1", "Awning-Y").await;
    harness.seed_quotation(100003, "other", "Awning-Z").await;
    let dashboard = DashboardService::new(harness.ctx.clone());

    let summary = dashboard
        .dealer_summary(&session("d1", Role::Dealer))
        .await
        .unwrap();
    assert_eq!(summary.name, "Dana");
    assert_eq!(summary.total_earnings, Decimal::ZERO);
    assert_eq!(summary.quotations.len(), 2);
    assert_eq!(summary.referral_id, "ref-1-1");
    assert_eq!(summary.referral_count, 2);

    assert!(matches!(
        dashboard.dealer_summary(&session("d1", Role::Installer)).await,
        Err(WorkflowError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_admin_overview_and_installer_approval() {
    let harness = TestHarness::new();
    harness.seed_user("d1", "Dana", Role::Dealer, "ref-1-1").await;
    harness.seed_user("i1", "Ivo", Role::Installer, "ref-2-2").await;
    harness.seed_quotation(100001, "d1", "Awning-X").await;
    harness.seed_quotation(100002, "d1", "Awning-Y").await;
    harness
        .store
        .update(QUOTATIONS, "100002", to_document(&json!({"status": "Approved"})).unwrap())
        .await
        .unwrap();
    harness
        .store
        .create(ORDERS, to_document(&json!({"status": "Completed"})).unwrap())
        .await
        .unwrap();
    let dashboard = DashboardService::new(harness.ctx.clone());
    let admin = session("a1", Role::Admin);

    let overview = dashboard.admin_overview(&admin).await.unwrap();
    assert_eq!(overview.stats.total, 2);
    assert_eq!(overview.stats.approved, 1);
    assert_eq!(overview.stats.pending, 1);
    assert_eq!(overview.dealers.len(), 1);
    assert_eq!(overview.installers.len(), 1);
    assert_eq!(overview.installers[0].doc.status, Some(InstallerStatus::Pending));
    assert_eq!(overview.orders.completed, 1);

    dashboard.approve_installer(&admin, "i1").await.unwrap();
    assert_eq!(
        harness.user("i1").await.unwrap().status,
        Some(InstallerStatus::Approved)
    );

    assert!(matches!(
        dashboard.approve_installer(&admin, "d1").await,
        Err(WorkflowError::NotFound { .. })
    ));
    assert!(matches!(
        dashboard
            .approve_installer(&session("d1", Role::Dealer), "i1")
            .await,
        Err(WorkflowError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_installer_projects() {
    let harness = TestHarness::new();
    harness.seed_user("i1", "Ivo", Role::Installer, "ref-2-2").await;
    seed_project(&harness, "p1", "i1", ProjectStatus::Pending).await;
    seed_project(&harness, "p2", "i1", ProjectStatus::OnGoing).await;
    seed_project(&harness, "p3", "i1", ProjectStatus::OnGoing).await;
    seed_project(&harness, "p4", "i2", ProjectStatus::Stuck).await;
    let dashboard = DashboardService::new(harness.ctx.clone());
    let installer = session("i1", Role::Installer);

    let summary = dashboard.installer_summary(&installer).await.unwrap();
    assert_eq!(summary.status, InstallerStatus::Pending);
    assert_eq!(summary.projects.len(), 3);
    assert_eq!(summary.counts.get(ProjectStatus::OnGoing), 2);
    assert_eq!(summary.counts.get(ProjectStatus::Stuck), 0);
    assert_eq!(summary.counts.total(), 3);

    dashboard
        .update_project_status(&installer, "p1", ProjectStatus::InstallationStarted)
        .await
        .unwrap();
    let summary = dashboard.installer_summary(&installer).await.unwrap();
    assert_eq!(
        summary.counts.entries(),
        vec![
            (ProjectStatus::InstallationStarted, 1),
            (ProjectStatus::OnGoing, 2),
        ]
    );
    let stored = harness.store.get(PROJECTS, "p1").await.unwrap().unwrap();
    assert_eq!(stored.data["status"], json!("Installation Started"));

    assert!(matches!(
        dashboard
            .update_project_status(&installer, "p4", ProjectStatus::Completed)
            .await,
        Err(WorkflowError::NotFound { .. })
    ));
}
