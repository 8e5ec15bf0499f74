use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One issued redemption code, bound at creation to a price, a label,
/// and a priced product registered with the payment provider.
///
/// `code` is always stored uppercase; lookups normalize before matching.
/// `used` only ever transitions false -> true.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PaymentCode {
    /// Rendered as `id` on the wire; the column keeps the long name.
    #[serde(rename = "id")]
    pub payment_code_id: Uuid,
    pub code: String,
    pub price: f64,
    pub description: String,
    pub stripe_price_id: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentCode {
    pub fn new(code: &str, price: f64, description: &str, stripe_price_id: &str) -> Self {
        Self {
            payment_code_id: Uuid::new_v4(),
            code: code.to_string(),
            price,
            description: description.to_string(),
            stripe_price_id: stripe_price_id.to_string(),
            used: false,
            created_at: Utc::now(),
        }
    }
}
