// byteclinic-core/src/services/checkout.rs

use std::sync::Arc;

use byteclinic_common::models::Caller;
use tracing::info;

use crate::provider::{CheckoutSessionRequest, PaymentProvider};
use crate::Error;

/// Hands a validated request to the payment provider and returns the
/// hosted checkout URL. Payment cannot be initiated anonymously.
pub struct CheckoutService {
    provider: Arc<dyn PaymentProvider>,
}

impl CheckoutService {
    pub fn new(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }

    pub async fn create_session(
        &self,
        caller: &Caller,
        request: CheckoutSessionRequest,
    ) -> Result<String, Error> {
        let user_id = caller.require_user()?;

        if request.price_id.trim().is_empty() {
            return Err(Error::InvalidInput("price_id is required".into()));
        }
        if request.success_url.trim().is_empty() || request.cancel_url.trim().is_empty() {
            return Err(Error::InvalidInput(
                "success_url and cancel_url are required".into(),
            ));
        }

        let url = self.provider.create_checkout_session(&request).await?;
        info!(
            "created checkout session for user {} on price {}",
            user_id, request.price_id
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CheckoutMode, MockPaymentProvider};
    use uuid::Uuid;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            price_id: "price_123".into(),
            mode: CheckoutMode::Payment,
            success_url: "https://shop.test/success".into(),
            cancel_url: "https://shop.test/payment".into(),
            reference_code: None,
        }
    }

    #[tokio::test]
    async fn delegates_to_the_provider() {
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_create_checkout_session()
            .returning(|_| Ok("https://checkout.test/cs_123".into()));
        let service = CheckoutService::new(Arc::new(provider));

        let caller = Caller::Authenticated {
            user_id: Uuid::new_v4(),
        };
        let url = service.create_session(&caller, request()).await.unwrap();
        assert_eq!(url, "https://checkout.test/cs_123");
    }

    #[tokio::test]
    async fn anonymous_callers_never_reach_the_provider() {
        let mut provider = MockPaymentProvider::new();
        provider.expect_create_checkout_session().never();
        let service = CheckoutService::new(Arc::new(provider));

        let r = service.create_session(&Caller::Anonymous, request()).await;
        assert!(matches!(r, Err(Error::Unauthenticated(_))));
    }
}
