//! Defines the customer lookup and the endpoint for searching customers by name.

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    customer::{Customer, core::get_customer_by_name},
    database_id::CustomerId,
    db::Database,
    purchase::{Purchase, get_purchases_for_customer},
};

/// A customer together with their full purchase history, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerLedger {
    /// The customer.
    pub customer: Customer,
    /// Every purchase the customer has made, in the order they were recorded.
    pub purchases: Vec<Purchase>,
}

/// Find the customer named exactly `name` and load their purchase history.
///
/// # Errors
/// This function will return a:
/// - [Error::CustomerNotFound] if no customer has the name `name`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn find_customer_by_name(name: &str, connection: &Connection) -> Result<CustomerLedger, Error> {
    let customer = get_customer_by_name(name, connection)?;
    let purchases = get_purchases_for_customer(customer.id, connection)?;

    Ok(CustomerLedger {
        customer,
        purchases,
    })
}

/// The state needed to search for customers.
#[derive(Debug, Clone)]
pub struct SearchCustomerState {
    /// The database handle for reading customers and purchases.
    pub database: Database,
}

impl FromRef<AppState> for SearchCustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
        }
    }
}

/// The query string for searching customers.
#[derive(Debug, Deserialize)]
pub struct SearchCustomerQuery {
    /// The exact name of the customer.
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchCustomerResponse {
    customer: CustomerSummary,
}

#[derive(Debug, Serialize)]
struct CustomerSummary {
    id: CustomerId,
    name: String,
    /// The customer's current total balance.
    past_balance: f64,
    transactions: Vec<Purchase>,
}

impl From<CustomerLedger> for SearchCustomerResponse {
    fn from(ledger: CustomerLedger) -> Self {
        Self {
            customer: CustomerSummary {
                id: ledger.customer.id,
                name: ledger.customer.name,
                past_balance: ledger.customer.total_balance,
                transactions: ledger.purchases,
            },
        }
    }
}

/// A route handler for looking up a customer and their purchases by name.
pub async fn search_customer_endpoint(
    State(state): State<SearchCustomerState>,
    query: Result<Query<SearchCustomerQuery>, QueryRejection>,
) -> Response {
    let customer_name = match query {
        Ok(Query(SearchCustomerQuery {
            customer_name: Some(name),
        })) if !name.trim().is_empty() => name,
        Ok(_) => {
            return Error::Validation("missing required parameter \"customerName\"".to_owned())
                .into_response();
        }
        Err(rejection) => return Error::from(rejection).into_response(),
    };

    let result = state
        .database
        .call(move |connection| find_customer_by_name(&customer_name, connection))
        .await;

    match result {
        Ok(ledger) => Json(SearchCustomerResponse::from(ledger)).into_response(),
        Err(error) => error.into_response(),
    }
}
