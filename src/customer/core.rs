//! Defines the customer model and its database queries.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, database_id::CustomerId};

// ============================================================================
// MODELS
// ============================================================================

/// A registered customer of the shop and their running balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    /// The ID of the customer.
    pub id: CustomerId,
    /// The customer's name, as printed on invoices.
    pub name: String,
    /// An optional contact email.
    pub email: Option<String>,
    /// The sum of the amounts of every purchase the customer has made.
    ///
    /// This is updated incrementally each time a purchase is recorded and is
    /// never recomputed from the purchase history.
    pub total_balance: f64,
}

/// The validated details for registering a new customer.
///
/// To create a `NewCustomer`, use [NewCustomer::new].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    name: String,
    email: Option<String>,
}

impl NewCustomer {
    /// Validate the details for a new customer.
    ///
    /// Leading and trailing whitespace is removed from both fields, and an
    /// empty email is treated as no email.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if `name` is empty or `email` does not
    /// look like an email address.
    pub fn new(name: &str, email: Option<&str>) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::Validation("customer name cannot be empty".to_owned()));
        }

        let email = match email.map(str::trim) {
            None | Some("") => None,
            Some(email) => match email.split_once('@') {
                Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                    Some(email.to_owned())
                }
                _ => {
                    return Err(Error::Validation(format!(
                        "\"{email}\" is not a valid email address"
                    )));
                }
            },
        };

        Ok(Self {
            name: name.to_owned(),
            email,
        })
    }

    /// The customer's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the customer table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customer (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            total_balance REAL NOT NULL DEFAULT 0
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_customer_name ON customer(name);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Customer].
pub fn map_customer_row(row: &Row) -> Result<Customer, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let email = row.get(2)?;
    let total_balance = row.get(3)?;

    Ok(Customer {
        id,
        name,
        email,
        total_balance,
    })
}

/// Register a new customer with a balance of zero.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_customer(customer: NewCustomer, connection: &Connection) -> Result<Customer, Error> {
    let customer = connection
        .prepare(
            "INSERT INTO customer (name, email, total_balance) VALUES (?1, ?2, 0)
             RETURNING id, name, email, total_balance",
        )?
        .query_row((customer.name, customer.email), map_customer_row)?;

    Ok(customer)
}

/// Retrieve a customer by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::CustomerNotFound] if `id` does not refer to a registered customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_customer(id: CustomerId, connection: &Connection) -> Result<Customer, Error> {
    connection
        .prepare("SELECT id, name, email, total_balance FROM customer WHERE id = :id")?
        .query_one(&[(":id", &id)], map_customer_row)
        .map_err(not_found_as_customer_not_found)
}

/// Retrieve the customer whose name exactly matches `name`.
///
/// The match is case sensitive. If more than one customer has the same name,
/// the one registered first is returned.
///
/// # Errors
/// This function will return a:
/// - [Error::CustomerNotFound] if no customer has the name `name`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_customer_by_name(name: &str, connection: &Connection) -> Result<Customer, Error> {
    connection
        .prepare(
            "SELECT id, name, email, total_balance FROM customer
             WHERE name = :name ORDER BY id ASC LIMIT 1",
        )?
        .query_one(&[(":name", &name)], map_customer_row)
        .map_err(not_found_as_customer_not_found)
}

fn not_found_as_customer_not_found(error: rusqlite::Error) -> Error {
    match Error::from(error) {
        Error::NotFound => Error::CustomerNotFound,
        error => error,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod new_customer_tests {
    use crate::{Error, customer::NewCustomer};

    #[test]
    fn trims_name_and_email() {
        let customer = NewCustomer::new("  Asha  ", Some(" asha@example.com ")).unwrap();

        assert_eq!(customer.name(), "Asha");
        assert_eq!(customer.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn empty_email_is_none() {
        let customer = NewCustomer::new("Asha", Some("   ")).unwrap();

        assert_eq!(customer.email, None);
    }

    #[test]
    fn rejects_blank_name() {
        let result = NewCustomer::new("   ", None);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_email_without_at_sign() {
        for email in ["asha.example.com", "@example.com", "asha@"] {
            let result = NewCustomer::new("Asha", Some(email));

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "want validation error for {email:?}, got {result:?}"
            );
        }
    }
}
