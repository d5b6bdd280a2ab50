//! Implements a struct that holds the state of the REST server.

use rusqlite::Connection;

use crate::{Error, LedgerConfig, UnitPrice, db::Database};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The handle to the ledger database.
    pub database: Database,

    /// The price per gram used to compute purchase amounts.
    pub unit_price: UnitPrice,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,

    /// The shop name printed at the top of invoices.
    pub shop_name: String,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid or the database cannot be initialized.
    pub fn new(db_connection: Connection, config: LedgerConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            database: Database::new(db_connection, config.db_timeout)?,
            unit_price: config.unit_price,
            local_timezone: config.local_timezone,
            shop_name: config.shop_name,
        })
    }
}
