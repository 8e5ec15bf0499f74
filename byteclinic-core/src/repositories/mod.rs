// byteclinic-core/src/repositories/mod.rs

pub mod postgres;

pub use postgres::admin_grant::AdminGrantRepo;
pub use postgres::payment_code::PaymentCodeRepo;
