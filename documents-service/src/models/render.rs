//! The finalized bundle handed to the external renderer.

use serde::Serialize;

use super::{Customer, Document, LineItem, Settings, ShippingAddress};

/// Everything a PDF or HTML renderer needs to lay out one document.
/// Totals are already rounded and items already ordered; the renderer
/// performs no business logic.
#[derive(Debug, Clone, Serialize)]
pub struct RenderBundle {
    pub document: Document,
    pub items: Vec<LineItem>,
    pub customer: Customer,
    pub shipping_address: Option<ShippingAddress>,
    pub company: Settings,
}
