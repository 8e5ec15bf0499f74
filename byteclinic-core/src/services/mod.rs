// byteclinic-core/src/services/mod.rs

pub mod admin_gate;
pub mod checkout;
pub mod code_issuance;
pub mod code_redemption;
pub mod webhook;

pub use admin_gate::{AdminGate, MasterKeyConfig, PromotionOutcome};
pub use checkout::CheckoutService;
pub use code_issuance::CodeIssuanceService;
pub use code_redemption::CodeRedemptionService;
pub use webhook::WebhookService;
