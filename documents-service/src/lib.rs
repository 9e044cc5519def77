//! documents-service: business documents (invoices, quotes, and order
//! verifications) with customers, products, and company settings.

pub mod http;
pub mod models;
pub mod services;
