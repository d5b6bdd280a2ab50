//! Database initialization and the shared connection handle.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, customer::create_customer_table, purchase::create_purchase_table};

/// Enable foreign keys and create the tables for the domain models.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if a table could not be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, SQLite ignores it otherwise.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_customer_table(&transaction)?;
    create_purchase_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// A handle to the application database.
///
/// Every call runs on tokio's blocking thread pool while holding the
/// connection lock, and is abandoned with [Error::Timeout] if it does not
/// finish within the configured timeout.
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl Database {
    /// Initialize `connection` and wrap it in a shareable handle.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(connection: Connection, timeout: Duration) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            timeout,
        })
    }

    /// Run `operation` against the database connection.
    ///
    /// A timeout only stops the caller from waiting: an operation that has
    /// already started runs to completion, so a write is either fully committed
    /// or fully rolled back even if the caller saw [Error::Timeout].
    ///
    /// # Errors
    /// Returns the error from `operation`, or:
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - [Error::DatabaseTaskError] if the blocking task panicked,
    /// - [Error::Timeout] if the call took longer than the configured timeout.
    pub async fn call<F, T>(&self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();

        let task = tokio::task::spawn_blocking(move || {
            let connection = connection.lock().map_err(|error| {
                tracing::error!("could not acquire database lock: {error}");
                Error::DatabaseLockError
            })?;

            operation(&connection)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                tracing::error!("database task failed: {error}");
                Err(Error::DatabaseTaskError(error.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    "database call exceeded the timeout of {} ms",
                    self.timeout.as_millis()
                );
                Err(Error::Timeout)
            }
        }
    }
}
