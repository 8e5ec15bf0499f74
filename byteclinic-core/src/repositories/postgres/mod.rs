// byteclinic-core/src/repositories/postgres/mod.rs

pub mod admin_grant;
pub mod payment_code;

pub use admin_grant::PostgresAdminGrantRepository;
pub use payment_code::PostgresPaymentCodeRepository;
