use chrono::{TimeZone, Utc};

use super::*;
use crate::interfaces::document_store::to_document;
use crate::interfaces::DocumentStore;
use crate::model::{Role, REFERRAL_REWARD_TYPE};
use crate::test_utils::TestHarness;

fn reward(message: &str, status: RewardStatus, day: u32) -> Reward {
    Reward {
        user_id: "u1".to_string(),
        message: message.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap(),
        status,
        kind: REFERRAL_REWARD_TYPE.to_string(),
        coupon_number: format!("CPN-10000{}", day),
    }
}

async fn seed_rewards(harness: &TestHarness) {
    for r in [
        reward("Referral bonus for Bo", RewardStatus::Unclaimed, 1),
        reward("Signup bonus", RewardStatus::Claimed, 2),
        reward("Referral bonus for Cy", RewardStatus::Unclaimed, 3),
    ] {
        harness
            .store
            .create(REWARDS, to_document(&r).unwrap())
            .await
            .unwrap();
    }
}

fn session(uid: &str) -> Session {
    Session::new(uid, format!("{}@example.com", uid), Role::Dealer)
}

fn messages(rewards: &[Record<Reward>]) -> Vec<&str> {
    rewards.iter().map(|r| r.doc.message.as_str()).collect()
}

#[tokio::test]
async fn test_rewards_sorted_by_date() {
    let harness = TestHarness::new();
    seed_rewards(&harness).await;
    let service = RewardService::new(harness.ctx.clone());

    let rewards = service
        .rewards(&session("u1"), &RewardQuery::default())
        .await
        .unwrap();
    assert_eq!(
        messages(&rewards),
        vec!["Referral bonus for Cy", "Signup bonus", "Referral bonus for Bo"]
    );
    assert!(service
        .rewards(&session("u2"), &RewardQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_rewards_search_and_status_sort() {
    let harness = TestHarness::new();
    seed_rewards(&harness).await;
    let service = RewardService::new(harness.ctx.clone());

    let by_status = service
        .rewards(
            &session("u1"),
            &RewardQuery {
                search: String::new(),
                sort: RewardSort::Status,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        messages(&by_status),
        vec!["Signup bonus", "Referral bonus for Cy", "Referral bonus for Bo"]
    );

    let searched = service
        .rewards(
            &session("u1"),
            &RewardQuery {
                search: "REFERRAL".to_string(),
                sort: RewardSort::Date,
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.len(), 2);
}

#[tokio::test]
async fn test_referral_overview_resolves_referred_users() {
    let harness = TestHarness::new();
    harness.seed_user("u1", "Ann", Role::Dealer, "ref-1-1").await;
    harness.seed_user("u2", "Bo", Role::Installer, "ref-2-2").await;
    harness
        .store
        .array_union(
            USERS,
            "u1",
            "referrals",
            vec![serde_json::json!("u2"), serde_json::json!("ghost")],
        )
        .await
        .unwrap();
    seed_rewards(&harness).await;
    let service = RewardService::new(harness.ctx.clone());

    let overview = service.referrals(&session("u1")).await.unwrap();
    assert_eq!(overview.referral_id, "ref-1-1");
    assert_eq!(overview.referred.len(), 1);
    assert_eq!(overview.referred[0].name, "Bo");
    assert_eq!(overview.reward_count, 3);

    assert!(matches!(
        service.referrals(&session("nobody")).await,
        Err(WorkflowError::NotFound { .. })
    ));
}
