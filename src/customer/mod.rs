//! Customer registration and lookup.

mod core;
mod register_endpoint;
mod search_endpoint;

pub use core::{Customer, NewCustomer, create_customer, create_customer_table, get_customer};
pub use register_endpoint::register_customer_endpoint;
pub use search_endpoint::{CustomerLedger, find_customer_by_name, search_customer_endpoint};
