//! Builds the data shown on an invoice from the ledger.

use rusqlite::Connection;

use crate::{
    Error,
    customer::{Customer, get_customer},
    database_id::CustomerId,
    purchase::{Purchase, get_purchases_for_customer},
};

/// A snapshot of a customer's ledger for invoicing their latest purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    /// The customer being invoiced.
    pub customer: Customer,
    /// The customer's most recent purchase.
    pub current_purchase: Purchase,
    /// The customer's balance immediately before the current purchase.
    pub past_balance: f64,
    /// The customer's balance including the current purchase.
    pub total_balance: f64,
}

/// Load the invoice for a customer's most recent purchase.
///
/// # Errors
/// This function will return a:
/// - [Error::CustomerNotFound] if `customer_id` does not refer to a registered customer,
/// - [Error::InvalidState] if the customer has not made any purchases,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn build_invoice(customer_id: CustomerId, connection: &Connection) -> Result<Invoice, Error> {
    let customer = get_customer(customer_id, connection)?;
    let mut purchases = get_purchases_for_customer(customer_id, connection)?;

    let Some(current_purchase) = purchases.pop() else {
        return Err(Error::InvalidState(format!(
            "Customer {} has no purchases to invoice",
            customer.name
        )));
    };

    let total_balance = customer.total_balance;
    let past_balance = total_balance - current_purchase.amount;

    Ok(Invoice {
        customer,
        current_purchase,
        past_balance,
        total_balance,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error, UnitPrice,
        customer::{Customer, NewCustomer, create_customer},
        db::initialize,
        invoice::build_invoice,
        purchase::{NewPurchase, record_purchase},
    };

    const TOLERANCE: f64 = 1e-6;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_asha(connection: &Connection) -> Customer {
        create_customer(NewCustomer::new("Asha", None).unwrap(), connection).unwrap()
    }

    fn buy(customer: &Customer, item_name: &str, weight: f64, percentage: f64, conn: &Connection) {
        record_purchase(
            NewPurchase::new(customer.id, item_name, weight, percentage).unwrap(),
            UnitPrice::new(5000.0).unwrap(),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn past_balance_excludes_latest_purchase() {
        let conn = get_test_connection();
        let asha = create_asha(&conn);
        buy(&asha, "Ring", 10.0, 91.6, &conn);
        buy(&asha, "Bangle", 5.0, 100.0, &conn);

        let invoice = build_invoice(asha.id, &conn).unwrap();

        assert_eq!(invoice.customer.name, "Asha");
        assert_eq!(invoice.current_purchase.item_name, "Bangle");
        assert!((invoice.past_balance - 45_800.0).abs() < TOLERANCE);
        assert!((invoice.total_balance - 70_800.0).abs() < TOLERANCE);
        assert!(
            (invoice.total_balance - invoice.current_purchase.amount - invoice.past_balance).abs()
                < TOLERANCE
        );
    }

    #[test]
    fn first_purchase_has_zero_past_balance() {
        let conn = get_test_connection();
        let asha = create_asha(&conn);
        buy(&asha, "Ring", 10.0, 91.6, &conn);

        let invoice = build_invoice(asha.id, &conn).unwrap();

        assert!(invoice.past_balance.abs() < TOLERANCE);
    }

    #[test]
    fn unknown_customer_is_not_found() {
        let conn = get_test_connection();

        assert_eq!(build_invoice(7, &conn), Err(Error::CustomerNotFound));
    }

    #[test]
    fn customer_without_purchases_is_invalid_state() {
        let conn = get_test_connection();
        let asha = create_asha(&conn);

        let result = build_invoice(asha.id, &conn);

        assert!(
            matches!(result, Err(Error::InvalidState(_))),
            "want invalid state error, got {result:?}"
        );
    }
}
