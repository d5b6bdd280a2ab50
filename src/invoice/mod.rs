//! Invoice generation for a customer's most recent purchase.

mod core;
mod endpoint;
mod pdf;
mod render;

pub use core::{Invoice, build_invoice};
pub use endpoint::generate_invoice_endpoint;
pub use render::render_invoice_pdf;
