// Billing records for spraying jobs

pub mod handlers;
pub mod models;
pub mod repository;

pub use repository::{BillingRepository, PgBillingRepository};
