//! Quotation submission from the product page.

use tracing::{error, info};

use crate::catalog::Product;
use crate::interfaces::document_store::to_document;
use crate::model::{
    Notification, NotificationKind, ProductRequest, Quotation, QuotationStatus, QUOTATIONS,
};
use crate::session::Session;
use crate::workflow::error::{Result, ValidationError};
use crate::workflow::{notify, WorkflowContext};

/// Client contact block of the quotation form. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub postal_code: String,
}

impl ClientDetails {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let fields = [
            ("clientName", &self.name),
            ("clientPhone", &self.phone),
            ("clientEmail", &self.email),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        Ok(())
    }
}

/// Measurements as entered. Height and width are kept as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measurements {
    pub height: String,
    pub width: String,
    pub additional_requirements: String,
}

/// Products selected for quotation. The same product may be added twice.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: Product) {
        self.items.push(product);
    }

    /// Remove every entry for `product_id`.
    pub fn remove(&mut self, product_id: u32) {
        self.items.retain(|p| p.id != product_id);
    }

    pub fn get(&self, product_id: u32) -> Option<&Product> {
        self.items.iter().find(|p| p.id == product_id)
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A persisted quotation and its companion notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub order_number: u32,
    pub quotation: Quotation,
    pub notification_id: String,
}

impl Submission {
    pub fn confirmation(&self) -> String {
        format!(
            "Quotation submitted successfully! Order Number: {}",
            self.order_number
        )
    }
}

/// Turns quotation forms into stored quotations.
#[derive(Clone)]
pub struct QuotationService {
    ctx: WorkflowContext,
}

impl QuotationService {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Persist a quotation for `product_name` and notify its author.
    ///
    /// The quotation is keyed by its order number. If the notification
    /// cannot be written the quotation is removed again (when compensation
    /// is enabled).
    #[tracing::instrument(skip_all, fields(product = %product_name, user_id = %session.actor_id()))]
    pub async fn submit(
        &self,
        session: &Session,
        product_name: &str,
        client: &ClientDetails,
        measurements: &Measurements,
    ) -> Result<Submission> {
        client.validate()?;
        if product_name.trim().is_empty() {
            return Err(ValidationError::MissingField("productName").into());
        }

        let order_number = self.ctx.ids.order_number().await?;
        let quotation = Quotation {
            client_name: client.name.clone(),
            client_phone: client.phone.clone(),
            client_email: client.email.clone(),
            city: client.city.clone(),
            postal_code: client.postal_code.clone(),
            product: ProductRequest {
                product_name: product_name.to_string(),
                height: measurements.height.clone(),
                width: measurements.width.clone(),
                additional_requirements: measurements.additional_requirements.clone(),
                status: QuotationStatus::Pending,
            },
            user_id: session.actor_id().to_string(),
            order_number,
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: None,
            estimate_price: None,
            commission_percentage: None,
            commission_value: None,
            payment_status: None,
        };

        let notification = Notification::new(
            session.actor_id(),
            format!(
                "Your Quotation #{} for {} has been submitted to admin for review.",
                order_number, product_name
            ),
            NotificationKind::Alert,
        )
        .for_order(order_number);

        let mut saga = self.ctx.saga("submit_quotation");
        let written: Result<String> = async {
            saga.put(QUOTATIONS, &order_number.to_string(), to_document(&quotation)?)
                .await?;
            notify(&mut saga, &notification).await
        }
        .await;

        match written {
            Ok(notification_id) => {
                saga.commit();
                info!(order_number, "Quotation submitted");
                Ok(Submission {
                    order_number,
                    quotation,
                    notification_id,
                })
            }
            Err(e) => {
                error!(order_number, error = %e, "Quotation submission failed");
                saga.abort(&e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Submit the cart entry for `product_id`. On success that product
    /// leaves the cart; other entries are untouched. On failure the cart
    /// is unchanged.
    pub async fn submit_from_cart(
        &self,
        session: &Session,
        cart: &mut Cart,
        product_id: u32,
        client: &ClientDetails,
        measurements: &Measurements,
    ) -> Result<Submission> {
        let product_name = cart
            .get(product_id)
            .map(|p| p.name.clone())
            .ok_or(ValidationError::ProductNotInCart(product_id))?;

        let submission = self
            .submit(session, &product_name, client, measurements)
            .await?;
        cart.remove(product_id);
        Ok(submission)
    }
}
