//! Purchase recording for the shop ledger.
//!
//! This module contains everything related to purchases:
//! - The `Purchase` model and the amount formula
//! - The atomic write path that records a purchase and updates the customer's balance
//! - The JSON endpoint for recording purchases

mod add_endpoint;
mod core;

pub use add_endpoint::add_purchase_endpoint;
pub use core::{
    NewPurchase, Purchase, PurchaseReceipt, compute_amount, create_purchase_table,
    get_purchases_for_customer, record_purchase,
};

#[cfg(test)]
pub use core::count_purchases;
