//! Defines the endpoint for downloading a customer's latest invoice.

use axum::{
    extract::{FromRef, Path, State, rejection::PathRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error,
    database_id::CustomerId,
    db::Database,
    invoice::{build_invoice, render_invoice_pdf},
};

/// The state needed to generate invoices.
#[derive(Debug, Clone)]
pub struct InvoiceState {
    /// The database handle for reading customers and purchases.
    pub database: Database,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The shop name printed at the top of invoices.
    pub shop_name: String,
}

impl FromRef<AppState> for InvoiceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
            local_timezone: state.local_timezone.clone(),
            shop_name: state.shop_name.clone(),
        }
    }
}

/// A route handler that responds with the invoice for a customer's latest
/// purchase as a PDF attachment.
pub async fn generate_invoice_endpoint(
    State(state): State<InvoiceState>,
    path: Result<Path<CustomerId>, PathRejection>,
) -> Response {
    let customer_id = match path {
        Ok(Path(customer_id)) => customer_id,
        Err(rejection) => return Error::from(rejection).into_response(),
    };

    let invoice = match state
        .database
        .call(move |connection| build_invoice(customer_id, connection))
        .await
    {
        Ok(invoice) => invoice,
        Err(error) => {
            tracing::debug!("Could not build invoice for customer {customer_id}: {error}");
            return error.into_response();
        }
    };

    match render_invoice_pdf(&invoice, &state.shop_name, &state.local_timezone) {
        Ok(document) => {
            tracing::info!(
                "Generated invoice for customer {customer_id}, purchase {}",
                invoice.current_purchase.id
            );
            (
                [
                    (CONTENT_TYPE, "application/pdf".to_owned()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"invoice_{customer_id}.pdf\""),
                    ),
                ],
                document,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not render invoice for customer {customer_id}: {error}");
            error.into_response()
        }
    }
}
