//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/generate-invoice/{customer_id}', use [format_endpoint].

/// The root route which responds with a welcome message.
pub const ROOT: &str = "/";
/// The route for registering a new customer.
pub const REGISTER_CUSTOMER: &str = "/register-customer";
/// The route for looking up a customer and their purchases by name.
pub const SEARCH_CUSTOMER: &str = "/search-customer";
/// The route for recording a purchase.
pub const ADD_PURCHASE: &str = "/add-purchase";
/// The route for downloading the invoice for a customer's latest purchase.
pub const GENERATE_INVOICE: &str = "/generate-invoice/{customer_id}";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// Paths without a parameter are returned unchanged.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
