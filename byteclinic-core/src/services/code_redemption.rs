// byteclinic-core/src/services/code_redemption.rs
//
// Public lookup so an anonymous visitor can see what they are about to
// pay for. A pure read: the used flag is only ever set by the payment
// confirmation webhook, never here.

use std::sync::Arc;

use byteclinic_common::models::PaymentCode;

use crate::codegen::normalize_code;
use crate::repositories::PaymentCodeRepo;
use crate::Error;

pub struct CodeRedemptionService {
    codes: Arc<dyn PaymentCodeRepo + Send + Sync>,
}

impl CodeRedemptionService {
    pub fn new(codes: Arc<dyn PaymentCodeRepo + Send + Sync>) -> Self {
        Self { codes }
    }

    /// `NotFound` and `AlreadyUsed` are distinct so the client can show
    /// the right message.
    pub async fn redeem(&self, submitted: &str) -> Result<PaymentCode, Error> {
        let code = normalize_code(submitted);
        if code.is_empty() {
            return Err(Error::InvalidInput("payment code is required".into()));
        }

        match self.codes.get_by_code(&code).await? {
            None => Err(Error::NotFound(format!("no payment code {code}"))),
            Some(found) if found.used => {
                Err(Error::AlreadyUsed(format!("payment code {code} has already been used")))
            }
            Some(found) => Ok(found),
        }
    }
}
