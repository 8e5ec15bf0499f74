// byteclinic-core/src/services/admin_gate.rs
//
// Admin is a binary state derived from AdminGrant existence. Promotion is
// shared-secret self-service: a logged-in user presenting the master key
// becomes admin. The key lives in an explicit config struct handed to the
// gate at construction and is only ever compared server-side.

use std::sync::Arc;

use byteclinic_common::models::{AdminGrant, Caller};
use tracing::info;
use uuid::Uuid;

use crate::repositories::AdminGrantRepo;
use crate::Error;

/// Process-wide master key, injected at construction.
#[derive(Clone)]
pub struct MasterKeyConfig {
    master_key: String,
}

impl MasterKeyConfig {
    pub fn new(master_key: impl Into<String>) -> Self {
        Self {
            master_key: master_key.into(),
        }
    }

    /// Constant-time comparison; the early length check leaks only the
    /// key length, not its contents.
    pub fn matches(&self, supplied: &str) -> bool {
        let expected = self.master_key.as_bytes();
        let supplied = supplied.as_bytes();
        if expected.len() != supplied.len() {
            return false;
        }
        expected
            .iter()
            .zip(supplied)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionOutcome {
    Promoted,
    AlreadyAdmin,
}

pub struct AdminGate {
    grants: Arc<dyn AdminGrantRepo + Send + Sync>,
    config: MasterKeyConfig,
}

impl AdminGate {
    pub fn new(grants: Arc<dyn AdminGrantRepo + Send + Sync>, config: MasterKeyConfig) -> Self {
        Self { grants, config }
    }

    /// Storage errors propagate rather than silently demoting every admin
    /// during an outage; the caller decides what an unknown state means.
    pub async fn is_admin(&self, user_id: Uuid) -> Result<bool, Error> {
        Ok(self.grants.get(user_id).await?.is_some())
    }

    /// Self-service promotion. Idempotent: promoting an existing admin
    /// succeeds without creating a duplicate grant.
    pub async fn promote(
        &self,
        caller: &Caller,
        supplied_key: &str,
    ) -> Result<PromotionOutcome, Error> {
        let user_id = caller.require_user()?;
        self.check_key(supplied_key)?;

        if self.grants.get(user_id).await?.is_some() {
            return Ok(PromotionOutcome::AlreadyAdmin);
        }

        let grant = AdminGrant::new(user_id, user_id);
        self.grants.create(&grant).await?;
        info!("promoted user {} to admin (self-service)", user_id);
        Ok(PromotionOutcome::Promoted)
    }

    /// Master-key-gated management: grant admin to an arbitrary user.
    pub async fn grant(
        &self,
        supplied_key: &str,
        user_id: Uuid,
        granted_by: Uuid,
    ) -> Result<PromotionOutcome, Error> {
        self.check_key(supplied_key)?;

        if self.grants.get(user_id).await?.is_some() {
            return Ok(PromotionOutcome::AlreadyAdmin);
        }

        let grant = AdminGrant::new(user_id, granted_by);
        self.grants.create(&grant).await?;
        info!("granted admin to user {} by {}", user_id, granted_by);
        Ok(PromotionOutcome::Promoted)
    }

    /// Master-key-gated management: revoke admin. Idempotent; revoking a
    /// non-admin is a no-op success.
    pub async fn revoke(&self, supplied_key: &str, user_id: Uuid) -> Result<(), Error> {
        self.check_key(supplied_key)?;
        self.grants.delete(user_id).await?;
        info!("revoked admin from user {}", user_id);
        Ok(())
    }

    fn check_key(&self, supplied_key: &str) -> Result<(), Error> {
        if self.config.matches(supplied_key) {
            Ok(())
        } else {
            Err(Error::Unauthenticated("invalid master key".into()))
        }
    }
}
