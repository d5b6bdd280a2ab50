//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState, Error,
    customer::{register_customer_endpoint, search_customer_endpoint},
    endpoints,
    invoice::generate_invoice_endpoint,
    purchase::add_purchase_endpoint,
};

/// The greeting served from the root path.
pub const WELCOME_MESSAGE: &str = "Welcome to S.K Ornaments Invoice System";

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index))
        .route(
            endpoints::REGISTER_CUSTOMER,
            post(register_customer_endpoint),
        )
        .route(endpoints::SEARCH_CUSTOMER, get(search_customer_endpoint))
        .route(endpoints::ADD_PURCHASE, post(add_purchase_endpoint))
        .route(endpoints::GENERATE_INVOICE, get(generate_invoice_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_index() -> &'static str {
    WELCOME_MESSAGE
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, LedgerConfig, build_router, endpoints, endpoints::format_endpoint};

    use super::WELCOME_MESSAGE;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            LedgerConfig::default(),
        )
        .unwrap();

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn root_serves_welcome_message() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        response.assert_text(WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let server = get_test_server();

        let response = server.get("/does-not-exist").await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn register_purchase_search_and_invoice() {
        let server = get_test_server();

        let customer: Value = server
            .post(endpoints::REGISTER_CUSTOMER)
            .json(&json!({ "name": "Asha" }))
            .await
            .json();
        let customer_id = customer["id"].as_i64().unwrap();

        for (item_name, weight, percentage, want_balance) in
            [("Ring", 10.0, 91.6, 45_800.0), ("Bangle", 5.0, 100.0, 70_800.0)]
        {
            let response = server
                .post(endpoints::ADD_PURCHASE)
                .json(&json!({
                    "customerId": customer_id,
                    "itemName": item_name,
                    "weight": weight,
                    "percentage": percentage
                }))
                .await;

            response.assert_status_ok();
            let receipt: Value = response.json();
            let new_balance = receipt["newBalance"].as_f64().unwrap();
            assert!(
                (new_balance - want_balance).abs() < 1e-6,
                "got balance {new_balance}, want {want_balance}"
            );
        }

        let search: Value = server
            .get(endpoints::SEARCH_CUSTOMER)
            .add_query_param("customerName", "Asha")
            .await
            .json();
        assert_eq!(search["customer"]["transactions"].as_array().unwrap().len(), 2);

        let invoice = server
            .get(&format_endpoint(endpoints::GENERATE_INVOICE, customer_id))
            .await;
        invoice.assert_status_ok();
        assert!(invoice.as_bytes().starts_with(b"%PDF"));
    }
}
