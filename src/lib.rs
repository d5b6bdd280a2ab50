//! Ornaments Ledger is the invoicing back end for a jewellery shop.
//!
//! The library provides a JSON API for registering customers, recording
//! purchases against a running customer balance, and rendering the latest
//! purchase as a PDF invoice.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod config;
mod currency;
mod customer;
mod database_id;
mod db;
mod endpoints;
mod invoice;
mod logging;
mod purchase;
mod routing;
mod timezone;

pub use app_state::AppState;
pub use config::{LedgerConfig, UnitPrice};
pub use customer::{
    Customer, CustomerLedger, NewCustomer, create_customer, find_customer_by_name,
};
pub use database_id::{CustomerId, DatabaseId, PurchaseId};
pub use db::{Database, initialize as initialize_db};
pub use invoice::{Invoice, build_invoice, render_invoice_pdf};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use purchase::{NewPurchase, Purchase, PurchaseReceipt, compute_amount, record_purchase};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The customer ID or name does not refer to a registered customer.
    #[error("Customer not found")]
    CustomerNotFound,

    /// A request field was missing or outside its allowed range.
    ///
    /// The string describes which field was rejected and is safe to show to
    /// the client.
    #[error("{0}")]
    Validation(String),

    /// The operation cannot be carried out in the current state of the
    /// ledger, e.g. rendering an invoice for a customer with no purchases.
    #[error("{0}")]
    InvalidState(String),

    /// There was an error formatting a date for display.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not format date: {0}")]
    InvalidDateFormat(String),

    /// The configured timezone is not a valid, canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The blocking task running a database call panicked or was cancelled.
    #[error("the database task did not complete: {0}")]
    DatabaseTaskError(String),

    /// A database call did not finish within the configured timeout.
    #[error("the database did not respond in time")]
    Timeout,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::CustomerNotFound => StatusCode::NOT_FOUND,
            Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::NotFound => "Not found".to_owned(),
            Error::CustomerNotFound | Error::Validation(_) | Error::InvalidState(_) => {
                self.to_string()
            }
            Error::Timeout => {
                tracing::warn!("Responding with a timeout: {}", self);
                "The server is busy, try again later".to_owned()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
