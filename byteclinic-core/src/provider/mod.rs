// byteclinic-core/src/provider/mod.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

pub mod stripe;

pub use stripe::StripeProvider;

/// How the hosted checkout collects payment for the price being bought.
/// A property of the price, selected by the caller, never inferred here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

/// Parameters for a hosted checkout session. The success URL is expected
/// to carry the provider session id and, for code purchases, the original
/// redemption code, so the landing page can display both.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
    /// Redemption code tied to this purchase, echoed back by the
    /// provider's completion event.
    pub reference_code: Option<String>,
}

/// Provider-side product registered during issuance; kept so the
/// compensation step can deactivate both halves.
#[derive(Debug, Clone)]
pub struct RegisteredPrice {
    pub product_id: String,
    pub price_id: String,
}

/// Seam to the hosted payment processor. Everything the core needs from
/// it: register a priced product, deactivate one, open a checkout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a product and an attached price in the provider's
    /// minor-unit representation (cents).
    async fn register_price(
        &self,
        description: &str,
        unit_amount: i64,
        code: &str,
    ) -> Result<RegisteredPrice, Error>;

    /// Best-effort compensation for a failed issuance: flag the price and
    /// product inactive. Errors are returned so the caller can log them,
    /// but issuance never fails because compensation did.
    async fn deactivate(&self, registered: &RegisteredPrice) -> Result<(), Error>;

    /// Open a hosted checkout session and return its URL.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<String, Error>;
}

/// Convert a positive decimal price to the provider's integer cents,
/// rounding to the nearest cent.
pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}
