// byteclinic-core/src/lib.rs

pub mod auth;
pub mod codegen;
pub mod db;
pub mod provider;
pub mod repositories;
pub mod services;
pub mod test_utils;

pub use byteclinic_common::error::Error;
pub use byteclinic_common::models;
pub use db::Database;
