// byteclinic-core/src/services/code_issuance.rs
//
// Two-phase create across the payment provider and the code store with no
// shared transaction. The unique index on `code` is the real uniqueness
// guard; the pre-insert existence check only keeps the common path cheap.
// If the store insert fails after the provider half succeeded, the
// provider product/price is deactivated as a best-effort compensation.

use std::sync::Arc;

use byteclinic_common::models::{Caller, PaymentCode};
use tracing::{error, info, warn};

use crate::codegen::CodeGenerator;
use crate::provider::{to_minor_units, PaymentProvider, RegisteredPrice};
use crate::repositories::PaymentCodeRepo;
use crate::Error;

/// Bound on candidate generation plus insert retries. Practically
/// unreachable with 36^8 codes, but never assumed away.
const MAX_CODE_ATTEMPTS: u32 = 10;

pub struct CodeIssuanceService {
    codes: Arc<dyn PaymentCodeRepo + Send + Sync>,
    provider: Arc<dyn PaymentProvider>,
    generator: Arc<dyn CodeGenerator>,
}

impl CodeIssuanceService {
    pub fn new(
        codes: Arc<dyn PaymentCodeRepo + Send + Sync>,
        provider: Arc<dyn PaymentProvider>,
        generator: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            codes,
            provider,
            generator,
        }
    }

    pub async fn issue(
        &self,
        caller: &Caller,
        price: f64,
        description: &str,
    ) -> Result<PaymentCode, Error> {
        caller.require_user()?;

        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidInput("price must be a positive number".into()));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::InvalidInput("description is required".into()));
        }

        let unit_amount = to_minor_units(price);

        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = self.generator.generate();

            // Advisory pre-check; the insert below still decides.
            if self.codes.get_by_code(&candidate).await?.is_some() {
                continue;
            }

            let registered = self
                .provider
                .register_price(description, unit_amount, &candidate)
                .await?;

            let row = PaymentCode::new(&candidate, price, description, &registered.price_id);
            match self.codes.create(&row).await {
                Ok(()) => {
                    info!("issued payment code {} ({} cents)", row.code, unit_amount);
                    return Ok(row);
                }
                Err(Error::DuplicateCode(code)) => {
                    // Lost the insert race to a concurrent issuance. Undo
                    // the provider half and try a fresh candidate.
                    warn!("code {} collided at insert, retrying", code);
                    self.compensate(&registered).await;
                    continue;
                }
                Err(e) => {
                    error!("failed to persist payment code: {}", e);
                    self.compensate(&registered).await;
                    return Err(e);
                }
            }
        }

        Err(Error::CodeSpaceExhausted)
    }

    /// Deactivate the provider-side product/price created for a failed
    /// issuance. Failure here only leaves an inactive-able orphan in the
    /// provider catalog, never an inconsistent code row, so it is logged
    /// and swallowed.
    async fn compensate(&self, registered: &RegisteredPrice) {
        if let Err(e) = self.provider.deactivate(registered).await {
            warn!(
                "compensation failed for provider price {}: {}",
                registered.price_id, e
            );
        }
    }
}
