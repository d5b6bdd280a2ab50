//! Defines the endpoint for recording a purchase against a customer's balance.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UnitPrice,
    database_id::CustomerId,
    db::Database,
    purchase::{NewPurchase, core::record_purchase},
};

/// The state needed to record a purchase.
#[derive(Debug, Clone)]
pub struct AddPurchaseState {
    /// The database handle for managing customers and purchases.
    pub database: Database,
    /// The price per gram used to compute purchase amounts.
    pub unit_price: UnitPrice,
}

impl FromRef<AppState> for AddPurchaseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
            unit_price: state.unit_price,
        }
    }
}

/// The request body for recording a purchase.
///
/// Every field is required. They are optional here so that a missing field is
/// reported with the field's name instead of a generic deserialization error.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPurchaseRequest {
    /// The customer making the purchase.
    pub customer_id: Option<CustomerId>,
    /// What is being bought.
    pub item_name: Option<String>,
    /// The weight of the item in grams.
    pub weight: Option<f64>,
    /// The purity of the metal as a percentage.
    pub percentage: Option<f64>,
}

impl AddPurchaseRequest {
    /// Check that every field is present and within range.
    ///
    /// # Errors
    /// Returns an [Error::Validation] naming the first missing or invalid field.
    pub fn validate(self) -> Result<NewPurchase, Error> {
        let customer_id = self.customer_id.ok_or_else(|| missing_field("customerId"))?;
        let item_name = self.item_name.ok_or_else(|| missing_field("itemName"))?;
        let weight = self.weight.ok_or_else(|| missing_field("weight"))?;
        let percentage = self.percentage.ok_or_else(|| missing_field("percentage"))?;

        NewPurchase::new(customer_id, &item_name, weight, percentage)
    }
}

fn missing_field(field: &str) -> Error {
    Error::Validation(format!("missing required field \"{field}\""))
}

/// A route handler for recording a purchase.
///
/// Responds with the customer's name, their new balance and the amount added.
pub async fn add_purchase_endpoint(
    State(state): State<AddPurchaseState>,
    payload: Result<Json<AddPurchaseRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return Error::from(rejection).into_response(),
    };

    let purchase = match request.validate() {
        Ok(purchase) => purchase,
        Err(error) => {
            tracing::debug!("Rejected purchase: {error}");
            return error.into_response();
        }
    };

    let customer_id = purchase.customer_id();
    let unit_price = state.unit_price;

    match state
        .database
        .call(move |connection| record_purchase(purchase, unit_price, connection))
        .await
    {
        Ok(receipt) => {
            tracing::info!(
                "Recorded purchase {} for customer {customer_id}: amount {}, new balance {}",
                receipt.purchase.id,
                receipt.amount_added,
                receipt.new_balance
            );
            Json(receipt).into_response()
        }
        Err(Error::CustomerNotFound) => {
            tracing::debug!("Tried to record a purchase for unknown customer {customer_id}");
            Error::CustomerNotFound.into_response()
        }
        Err(error) => {
            tracing::error!("Could not record purchase for customer {customer_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod validate_tests {
    use crate::{Error, purchase::NewPurchase};

    use super::AddPurchaseRequest;

    fn complete_request() -> AddPurchaseRequest {
        AddPurchaseRequest {
            customer_id: Some(1),
            item_name: Some("Ring".to_owned()),
            weight: Some(10.0),
            percentage: Some(91.6),
        }
    }

    #[test]
    fn complete_request_is_valid() {
        let got = complete_request().validate();

        assert_eq!(got, NewPurchase::new(1, "Ring", 10.0, 91.6));
    }

    #[test]
    fn names_missing_field() {
        let cases = [
            (
                AddPurchaseRequest {
                    customer_id: None,
                    ..complete_request()
                },
                "customerId",
            ),
            (
                AddPurchaseRequest {
                    item_name: None,
                    ..complete_request()
                },
                "itemName",
            ),
            (
                AddPurchaseRequest {
                    weight: None,
                    ..complete_request()
                },
                "weight",
            ),
            (
                AddPurchaseRequest {
                    percentage: None,
                    ..complete_request()
                },
                "percentage",
            ),
        ];

        for (request, field) in cases {
            match request.validate() {
                Err(Error::Validation(message)) => assert!(
                    message.contains(field),
                    "'{message}' does not mention '{field}'"
                ),
                other => panic!("want validation error for missing {field}, got {other:?}"),
            }
        }
    }
}
