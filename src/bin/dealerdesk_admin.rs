//! dealerdesk-admin: operator CLI over the review workflow
//!
//! Runs admin decisions directly against the configured document store,
//! with the same notifications and compensation as the dashboard.
//!
//! ## Usage
//! ```text
//! dealerdesk-admin stats
//! dealerdesk-admin list
//! dealerdesk-admin approve <order-number> <estimate> <commission-%> [Pending|Completed|Canceled]
//! dealerdesk-admin reject <order-number>
//! dealerdesk-admin approve-installer <user-id>
//! dealerdesk-admin products [search]
//! ```
//!
//! ## Configuration
//! - DEALERDESK_CONFIG: Path to a YAML config file (optional)
//! - DEALERDESK_LOG: tracing filter (default: info)

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use dealerdesk::catalog::{Catalog, ALL_CATEGORIES};
use dealerdesk::config::Config;
use dealerdesk::identity::InMemoryIdentityProvider;
use dealerdesk::model::{PaymentStatus, Role};
use dealerdesk::session::Session;
use dealerdesk::storage::init_storage;
use dealerdesk::utils::bootstrap::init_tracing;
use dealerdesk::workflow::{ApprovalInput, DashboardService, ReviewService, WorkflowContext};

const OPERATOR_ID: &str = "dealerdesk-admin";

const USAGE: &str = "usage: dealerdesk-admin <stats | list | approve <id> <estimate> <percent> [payment] | reject <id> | approve-installer <id> | products [search]>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        return Err(USAGE.into());
    };

    let config = Config::load(None)?;
    let store = init_storage(&config.storage).await?;
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let ctx = WorkflowContext::new(store, identity, &config);
    let session = Session::new(OPERATOR_ID, OPERATOR_ID, Role::Admin);
    let review = ReviewService::new(ctx.clone());

    info!(command = %command, "dealerdesk-admin started");

    match (command.as_str(), &args[1..]) {
        ("stats", []) => {
            let stats = review.stats(&session).await?;
            println!(
                "total={} approved={} pending={} rejected={}",
                stats.total, stats.approved, stats.pending, stats.rejected
            );
        }
        ("list", []) => {
            for record in review.list(&session).await? {
                let q = &record.doc;
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    record.id,
                    q.status(),
                    q.payment_status(),
                    q.product.product_name,
                    q.client_name
                );
            }
        }
        ("approve", [id, estimate, percent, rest @ ..]) if rest.len() <= 1 => {
            let mut input = ApprovalInput::new(Decimal::from_str(estimate)?, Decimal::from_str(percent)?);
            if let Some(payment) = rest.first() {
                input = input.with_payment_status(PaymentStatus::from_str(payment)?);
            }
            let quotation = review.approve(&session, id, &input).await.map_err(report)?;
            println!(
                "approved #{} commission={}",
                quotation.order_number,
                quotation.commission_value.unwrap_or_default()
            );
        }
        ("reject", [id]) => {
            let quotation = review.reject(&session, id).await.map_err(report)?;
            println!("rejected #{}", quotation.order_number);
        }
        ("approve-installer", [id]) => {
            DashboardService::new(ctx)
                .approve_installer(&session, id)
                .await
                .map_err(report)?;
            println!("installer {} approved", id);
        }
        ("products", rest) if rest.len() <= 1 => {
            let catalog = Catalog::from_config(&config.catalog)?;
            let products = match rest.first() {
                Some(query) => catalog.search(query),
                None => catalog.by_category(ALL_CATEGORIES),
            };
            let page = Catalog::page(products, 1, config.workflow.catalog_page_size);
            for product in &page.items {
                println!("{}\t{}\t{}", product.id, product.category, product.name);
            }
            println!("{} of {} products", page.items.len(), page.total_items);
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn report(err: dealerdesk::workflow::WorkflowError) -> Box<dyn std::error::Error> {
    format!("{} ({})", err.user_message(), err).into()
}
