// byteclinic-server/src/state.rs

use std::sync::Arc;

use byteclinic_core::auth::SessionVerifier;
use byteclinic_core::services::{
    AdminGate, CheckoutService, CodeIssuanceService, CodeRedemptionService, WebhookService,
};

#[derive(Clone)]
pub struct AppState {
    pub issuance: Arc<CodeIssuanceService>,
    pub redemption: Arc<CodeRedemptionService>,
    pub checkout: Arc<CheckoutService>,
    pub admin_gate: Arc<AdminGate>,
    pub webhook: Arc<WebhookService>,
    pub sessions: Arc<dyn SessionVerifier>,
}
