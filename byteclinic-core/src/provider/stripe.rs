// byteclinic-core/src/provider/stripe.rs
//
// Stripe REST client over reqwest. Form-encoded requests, bounded
// timeout, bearer auth with the secret key. Only the handful of calls
// the core needs; card handling stays entirely on Stripe's hosted page.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::Error;

use super::{CheckoutSessionRequest, PaymentProvider, RegisteredPrice};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct StripeObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeProvider {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeProvider {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<StripeErrorBody>().await {
                Ok(body) => body.error.message.unwrap_or_else(|| status.to_string()),
                Err(_) => status.to_string(),
            };
            return Err(Error::Provider(format!("{} {}: {}", path, status, detail)));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn register_price(
        &self,
        description: &str,
        unit_amount: i64,
        code: &str,
    ) -> Result<RegisteredPrice, Error> {
        let product: StripeObject = self
            .post_form(
                "/v1/products",
                &[
                    ("name".into(), format!("Custom Service: {description}")),
                    ("description".into(), description.to_string()),
                    ("metadata[type]".into(), "custom_service".into()),
                    ("metadata[code]".into(), code.to_string()),
                ],
            )
            .await?;

        let price_result: Result<StripeObject, Error> = self
            .post_form(
                "/v1/prices",
                &[
                    ("product".into(), product.id.clone()),
                    ("unit_amount".into(), unit_amount.to_string()),
                    ("currency".into(), "usd".into()),
                    ("metadata[code]".into(), code.to_string()),
                ],
            )
            .await;

        let price = match price_result {
            Ok(price) => price,
            Err(e) => {
                // The product exists but has no price; flag it inactive so
                // it does not linger in the catalog. Best effort.
                if let Err(cleanup) = self.set_inactive("products", &product.id).await {
                    warn!("failed to deactivate orphaned product {}: {}", product.id, cleanup);
                }
                return Err(e);
            }
        };

        Ok(RegisteredPrice {
            product_id: product.id,
            price_id: price.id,
        })
    }

    async fn deactivate(&self, registered: &RegisteredPrice) -> Result<(), Error> {
        self.set_inactive("prices", &registered.price_id).await?;
        self.set_inactive("products", &registered.product_id).await?;
        Ok(())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<String, Error> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), request.mode.as_str().into()),
            ("line_items[0][price]".into(), request.price_id.clone()),
            ("line_items[0][quantity]".into(), "1".into()),
            ("success_url".into(), request.success_url.clone()),
            ("cancel_url".into(), request.cancel_url.clone()),
        ];
        if let Some(code) = &request.reference_code {
            form.push(("client_reference_id".into(), code.clone()));
            form.push(("metadata[code]".into(), code.clone()));
        }

        let session: StripeCheckoutSession =
            self.post_form("/v1/checkout/sessions", &form).await?;
        Ok(session.url)
    }
}

impl StripeProvider {
    async fn set_inactive(&self, kind: &str, id: &str) -> Result<(), Error> {
        let _: StripeObject = self
            .post_form(
                &format!("/v1/{kind}/{id}"),
                &[("active".into(), "false".into())],
            )
            .await?;
        Ok(())
    }
}
