//! Defines the purchase model, the amount formula and the ledger write path.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error, UnitPrice,
    customer::get_customer,
    database_id::{CustomerId, PurchaseId},
};

// ============================================================================
// MODELS
// ============================================================================

/// A purchase of a jewellery item by a customer.
///
/// Purchases are immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    /// The ID of the purchase.
    pub id: PurchaseId,
    /// The customer who made the purchase.
    pub customer_id: CustomerId,
    /// What was bought, e.g. "Ring".
    pub item_name: String,
    /// The weight of the item in grams.
    pub weight: f64,
    /// The purity of the metal as a percentage, e.g. 91.6 for 22 karat gold.
    pub percentage: f64,
    /// The price charged, see [compute_amount].
    pub amount: f64,
    /// When the purchase was recorded (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The validated details of a purchase that has not been recorded yet.
///
/// To create a `NewPurchase`, use [NewPurchase::new].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    customer_id: CustomerId,
    item_name: String,
    weight: f64,
    percentage: f64,
}

impl NewPurchase {
    /// Validate the details of a purchase.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if:
    /// - `item_name` is empty or only whitespace,
    /// - `weight` is negative or not a finite number,
    /// - `percentage` is outside of the range 0 to 100 (inclusive).
    pub fn new(
        customer_id: CustomerId,
        item_name: &str,
        weight: f64,
        percentage: f64,
    ) -> Result<Self, Error> {
        let item_name = item_name.trim();

        if item_name.is_empty() {
            return Err(Error::Validation("item name cannot be empty".to_owned()));
        }

        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::Validation(format!(
                "weight must be a non-negative number of grams, got {weight}"
            )));
        }

        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(Error::Validation(format!(
                "percentage must be between 0 and 100, got {percentage}"
            )));
        }

        Ok(Self {
            customer_id,
            item_name: item_name.to_owned(),
            weight,
            percentage,
        })
    }

    /// The customer the purchase is for.
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }
}

/// The outcome of recording a purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// The name of the customer who made the purchase.
    pub customer_name: String,
    /// The customer's total balance including this purchase.
    pub new_balance: f64,
    /// The amount of this purchase.
    pub amount_added: f64,
    /// The recorded purchase.
    #[serde(skip)]
    pub purchase: Purchase,
}

/// Compute the price of an item.
///
/// `amount = weight * (percentage / 100) * unit price`, where `weight` is in
/// grams and `percentage` is the purity of the metal.
pub fn compute_amount(weight: f64, percentage: f64, unit_price: UnitPrice) -> f64 {
    weight * (percentage / 100.0) * unit_price.as_f64()
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the purchase table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_purchase_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS purchase (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL,
                item_name TEXT NOT NULL,
                weight REAL NOT NULL,
                percentage REAL NOT NULL,
                amount REAL NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(customer_id) REFERENCES customer(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_purchase_customer ON purchase(customer_id, id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Purchase].
pub fn map_purchase_row(row: &Row) -> Result<Purchase, rusqlite::Error> {
    let id = row.get(0)?;
    let customer_id = row.get(1)?;
    let item_name = row.get(2)?;
    let weight = row.get(3)?;
    let percentage = row.get(4)?;
    let amount = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Purchase {
        id,
        customer_id,
        item_name,
        weight,
        percentage,
        amount,
        created_at,
    })
}

/// Record a purchase and add its amount to the customer's balance.
///
/// The purchase insert and the balance update are committed together in a
/// single SQL transaction: if either fails, neither is applied.
///
/// The purchase is timestamped with the current time, or with the timestamp of
/// the previous purchase if the system clock has gone backwards, so purchase
/// timestamps never decrease.
///
/// # Errors
/// This function will return a:
/// - [Error::CustomerNotFound] if the customer does not exist,
/// - [Error::Validation] if the amount or the new balance is too large to
///   represent, in which case nothing is recorded,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn record_purchase(
    purchase: NewPurchase,
    unit_price: UnitPrice,
    connection: &Connection,
) -> Result<PurchaseReceipt, Error> {
    let transaction = connection.unchecked_transaction()?;

    let customer = get_customer(purchase.customer_id, &transaction)?;
    let amount = compute_amount(purchase.weight, purchase.percentage, unit_price);

    if !amount.is_finite() {
        return Err(Error::Validation(format!(
            "the amount for {} grams at {}% purity is too large",
            purchase.weight, purchase.percentage
        )));
    }

    if !(customer.total_balance + amount).is_finite() {
        return Err(Error::Validation(format!(
            "adding {amount} would overflow the balance of customer {}",
            customer.name
        )));
    }

    let created_at = next_timestamp(&transaction)?;

    let recorded = transaction
        .prepare(
            "INSERT INTO purchase (customer_id, item_name, weight, percentage, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, customer_id, item_name, weight, percentage, amount, created_at",
        )?
        .query_row(
            (
                purchase.customer_id,
                purchase.item_name,
                purchase.weight,
                purchase.percentage,
                amount,
                created_at,
            ),
            map_purchase_row,
        )?;

    let new_balance: f64 = transaction.query_row(
        "UPDATE customer SET total_balance = total_balance + ?1 WHERE id = ?2
         RETURNING total_balance",
        (amount, purchase.customer_id),
        |row| row.get(0),
    )?;

    transaction.commit()?;

    Ok(PurchaseReceipt {
        customer_name: customer.name,
        new_balance,
        amount_added: amount,
        purchase: recorded,
    })
}

fn next_timestamp(connection: &Connection) -> Result<OffsetDateTime, Error> {
    let now = OffsetDateTime::now_utc();

    let previous: Option<OffsetDateTime> = match connection.query_row(
        "SELECT created_at FROM purchase ORDER BY id DESC LIMIT 1",
        [],
        |row| row.get(0),
    ) {
        Ok(previous) => Some(previous),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(error) => return Err(error.into()),
    };

    Ok(previous.map_or(now, |previous| previous.max(now)))
}

/// Get every purchase made by a customer, oldest first.
///
/// Returns an empty list if the customer has no purchases or does not exist.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_purchases_for_customer(
    customer_id: CustomerId,
    connection: &Connection,
) -> Result<Vec<Purchase>, Error> {
    connection
        .prepare(
            "SELECT id, customer_id, item_name, weight, percentage, amount, created_at
             FROM purchase WHERE customer_id = :customer_id ORDER BY id ASC",
        )?
        .query_map(&[(":customer_id", &customer_id)], map_purchase_row)?
        .map(|maybe_purchase| maybe_purchase.map_err(Error::from))
        .collect()
}

/// Get the total number of purchases in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
#[cfg(test)]
pub fn count_purchases(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM purchase;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

// ============================================================================
// TESTS
// ============================================================================



#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error, UnitPrice,
        customer::{Customer, NewCustomer, create_customer, get_customer},
        db::initialize,
        purchase::{NewPurchase, count_purchases, get_purchases_for_customer, record_purchase},
    };

    const TOLERANCE: f64 = 1e-6;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_customer(name: &str, connection: &Connection) -> Customer {
        create_customer(NewCustomer::new(name, None).unwrap(), connection)
            .expect("Could not create customer")
    }

    fn price() -> UnitPrice {
        UnitPrice::new(5000.0).unwrap()
    }

    #[test]
    fn asha_scenario() {
        let conn = get_test_connection();
        let asha = create_test_customer("Asha", &conn);

        let first = record_purchase(
            NewPurchase::new(asha.id, "Ring", 10.0, 91.6).unwrap(),
            price(),
            &conn,
        )
        .unwrap();

        assert_eq!(first.customer_name, "Asha");
        assert!((first.amount_added - 45_800.0).abs() < TOLERANCE);
        assert!((first.new_balance - 45_800.0).abs() < TOLERANCE);

        let second = record_purchase(
            NewPurchase::new(asha.id, "Bangle", 5.0, 100.0).unwrap(),
            price(),
            &conn,
        )
        .unwrap();

        assert!((second.amount_added - 25_000.0).abs() < TOLERANCE);
        assert!((second.new_balance - 70_800.0).abs() < TOLERANCE);
    }

    #[test]
    fn balance_equals_sum_of_amounts_after_each_purchase() {
        let conn = get_test_connection();
        let customer = create_test_customer("Meera", &conn);
        let purchases = [
            ("Ring", 10.0, 91.6),
            ("Chain", 23.4, 75.0),
            ("Earrings", 4.1, 58.5),
            ("Coin", 8.0, 99.9),
            ("Anklet", 0.0, 91.6),
        ];

        for (item_name, weight, percentage) in purchases {
            record_purchase(
                NewPurchase::new(customer.id, item_name, weight, percentage).unwrap(),
                price(),
                &conn,
            )
            .unwrap();

            let balance = get_customer(customer.id, &conn).unwrap().total_balance;
            let sum: f64 = get_purchases_for_customer(customer.id, &conn)
                .unwrap()
                .iter()
                .map(|purchase| purchase.amount)
                .sum();

            assert!(
                (balance - sum).abs() < TOLERANCE,
                "balance {balance} != sum of amounts {sum}"
            );
        }
    }

    #[test]
    fn unknown_customer_changes_nothing() {
        let conn = get_test_connection();
        let customer = create_test_customer("Asha", &conn);
        record_purchase(
            NewPurchase::new(customer.id, "Ring", 10.0, 91.6).unwrap(),
            price(),
            &conn,
        )
        .unwrap();

        let result = record_purchase(
            NewPurchase::new(999, "Ring", 10.0, 91.6).unwrap(),
            price(),
            &conn,
        );

        assert_eq!(result, Err(Error::CustomerNotFound));
        assert_eq!(count_purchases(&conn).unwrap(), 1);
        let balance = get_customer(customer.id, &conn).unwrap().total_balance;
        assert!((balance - 45_800.0).abs() < TOLERANCE);
    }

    #[test]
    fn overflowing_amount_changes_nothing() {
        let conn = get_test_connection();
        let customer = create_test_customer("Asha", &conn);

        let result = record_purchase(
            NewPurchase::new(customer.id, "Ring", 1e306, 100.0).unwrap(),
            price(),
            &conn,
        );

        assert!(matches!(result, Err(Error::Validation(_))), "got {result:?}");
        assert_eq!(count_purchases(&conn).unwrap(), 0);
        assert_eq!(get_customer(customer.id, &conn).unwrap().total_balance, 0.0);
    }

    #[test]
    fn overflowing_balance_changes_nothing() {
        let conn = get_test_connection();
        let customer = create_test_customer("Asha", &conn);
        // Each amount is finite but their sum is not.
        let weight = f64::MAX / 7500.0;
        let first = record_purchase(
            NewPurchase::new(customer.id, "Ring", weight, 100.0).unwrap(),
            price(),
            &conn,
        )
        .unwrap();
        assert!(first.new_balance.is_finite());

        let result = record_purchase(
            NewPurchase::new(customer.id, "Ring", weight, 100.0).unwrap(),
            price(),
            &conn,
        );

        assert!(matches!(result, Err(Error::Validation(_))), "got {result:?}");
        assert_eq!(count_purchases(&conn).unwrap(), 1);
        assert_eq!(
            get_customer(customer.id, &conn).unwrap().total_balance,
            first.new_balance
        );
    }

    #[test]
    fn failed_balance_update_rolls_back_insert() {
        let conn = get_test_connection();
        let customer = create_test_customer("Asha", &conn);
        // Make the balance update fail after the purchase row has been inserted.
        conn.execute_batch(
            "CREATE TRIGGER reject_balance_update BEFORE UPDATE OF total_balance ON customer
             BEGIN SELECT RAISE(ABORT, 'balance is frozen'); END;",
        )
        .unwrap();

        let result = record_purchase(
            NewPurchase::new(customer.id, "Ring", 10.0, 91.6).unwrap(),
            price(),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
        assert_eq!(count_purchases(&conn).unwrap(), 0);
        assert_eq!(get_customer(customer.id, &conn).unwrap().total_balance, 0.0);
    }

    #[test]
    fn purchases_are_returned_in_recording_order() {
        let conn = get_test_connection();
        let customer = create_test_customer("Asha", &conn);
        let other = create_test_customer("Ravi", &conn);
        let items = ["Ring", "Chain", "Bangle", "Nose pin"];

        for item_name in items {
            record_purchase(
                NewPurchase::new(customer.id, item_name, 1.0, 91.6).unwrap(),
                price(),
                &conn,
            )
            .unwrap();
            record_purchase(
                NewPurchase::new(other.id, "Coin", 1.0, 99.9).unwrap(),
                price(),
                &conn,
            )
            .unwrap();
        }

        let purchases = get_purchases_for_customer(customer.id, &conn).unwrap();

        let got: Vec<&str> = purchases
            .iter()
            .map(|purchase| purchase.item_name.as_str())
            .collect();
        assert_eq!(got, items);
        assert!(
            purchases
                .windows(2)
                .all(|pair| pair[0].created_at <= pair[1].created_at),
            "timestamps must not decrease"
        );
    }

    #[test]
    fn customer_without_purchases_has_empty_history() {
        let conn = get_test_connection();
        let customer = create_test_customer("Asha", &conn);

        let purchases = get_purchases_for_customer(customer.id, &conn).unwrap();

        assert!(purchases.is_empty());
    }
}
