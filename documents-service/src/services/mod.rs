//! Database-backed stores for documents-service.

mod customers;
mod database;
mod documents;
pub mod metrics;
mod products;

pub use database::{format_document_number, Database};
