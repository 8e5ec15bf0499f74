// byteclinic-common/src/models/mod.rs

pub mod admin;
pub mod caller;
pub mod payment_code;

pub use admin::AdminGrant;
pub use caller::Caller;
pub use payment_code::PaymentCode;
