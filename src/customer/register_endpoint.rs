//! Defines the endpoint for registering a new customer.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    customer::{NewCustomer, create_customer},
    db::Database,
};

/// The state needed to register a customer.
#[derive(Debug, Clone)]
pub struct RegisterCustomerState {
    /// The database handle for managing customers.
    pub database: Database,
}

impl FromRef<AppState> for RegisterCustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
        }
    }
}

/// The request body for registering a customer.
#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterCustomerRequest {
    /// The customer's name.
    pub name: String,
    /// An optional contact email.
    #[serde(default)]
    pub email: Option<String>,
}

/// A route handler for registering a new customer, responds with the created customer.
pub async fn register_customer_endpoint(
    State(state): State<RegisterCustomerState>,
    payload: Result<Json<RegisterCustomerRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return Error::from(rejection).into_response(),
    };

    let new_customer = match NewCustomer::new(&request.name, request.email.as_deref()) {
        Ok(new_customer) => new_customer,
        Err(error) => return error.into_response(),
    };

    let name = new_customer.name().to_owned();

    match state
        .database
        .call(move |connection| create_customer(new_customer, connection))
        .await
    {
        Ok(customer) => {
            tracing::info!("Registered customer {} ({name})", customer.id);
            (StatusCode::CREATED, Json(customer)).into_response()
        }
        Err(error) => {
            tracing::error!("Could not register customer {name}: {error}");
            error.into_response()
        }
    }
}
