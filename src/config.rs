//! Runtime settings for the ledger and invoice renderer.

use std::{fmt::Display, time::Duration};

use crate::{Error, timezone::get_local_offset};

/// The price of one gram of pure metal.
///
/// Purchase amounts are computed as `weight * (percentage / 100) * unit price`,
/// so the unit price must be a positive, finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPrice(f64);

impl UnitPrice {
    /// The price per gram used when none is configured.
    pub const DEFAULT: UnitPrice = UnitPrice(5000.0);

    /// Create a unit price.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if `price` is not finite or not greater than zero.
    pub fn new(price: f64) -> Result<Self, Error> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::Validation(format!(
                "unit price must be a positive number, got {price}"
            )));
        }

        Ok(Self(price))
    }

    /// The price per gram as a float.
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl Display for UnitPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Settings shared by the ledger service and the invoice renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// The price per gram used to compute purchase amounts.
    pub unit_price: UnitPrice,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The shop name printed at the top of invoices.
    pub shop_name: String,
    /// How long a single database call may take before the request is abandoned.
    pub db_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            unit_price: UnitPrice::DEFAULT,
            local_timezone: "Etc/UTC".to_owned(),
            shop_name: "S.K Ornaments".to_owned(),
            db_timeout: Duration::from_secs(5),
        }
    }
}

impl LedgerConfig {
    /// Check that the settings can be used to serve requests.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezone] if `local_timezone` is not a canonical
    /// timezone name, or an [Error::Validation] if the shop name is empty or the
    /// database timeout is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if get_local_offset(&self.local_timezone).is_none() {
            return Err(Error::InvalidTimezone(self.local_timezone.clone()));
        }

        if self.shop_name.trim().is_empty() {
            return Err(Error::Validation("shop name cannot be empty".to_owned()));
        }

        if self.db_timeout.is_zero() {
            return Err(Error::Validation(
                "database timeout must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}
