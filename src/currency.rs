//! Formatting of money amounts for invoices.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// The symbol printed in front of amounts.
///
/// The standard PDF fonts cannot draw the rupee sign, so the abbreviation is used.
pub const CURRENCY_PREFIX: &str = "Rs. ";

/// Format `number` as rupees with thousands separators and two decimal places,
/// e.g. "Rs. 45,800.00" or "-Rs. 12.50".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency(CURRENCY_PREFIX)
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency(&format!("-{CURRENCY_PREFIX}"))
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    let formatted_string = match (positive_fmt, negative_fmt) {
        _ if number == 0.0 || !number.is_finite() => {
            // Zero is hardcoded as "0", so we must specify the formatted string for zero
            return format!("{CURRENCY_PREFIX}0.00");
        }
        (Some(positive_fmt), _) if number > 0.0 => positive_fmt.fmt_string(number),
        (_, Some(negative_fmt)) if number < 0.0 => negative_fmt.fmt_string(number.abs()),
        _ => {
            tracing::warn!("Could not create currency formatter, falling back to plain formatting");
            return plain_currency(number);
        }
    };

    pad_decimals(formatted_string)
}

/// numfmt omits trailing zeros, e.g. "12.30" is rendered as "12.3" and
/// "12.00" as "12", so we add them back ourselves.
fn pad_decimals(formatted_string: String) -> String {
    // Skip the prefix since it contains a full stop of its own.
    let digits_start = formatted_string
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(0);

    match formatted_string[digits_start..].rfind('.') {
        None => format!("{formatted_string}.00"),
        Some(position) if formatted_string.len() - (digits_start + position) == 2 => {
            format!("{formatted_string}0")
        }
        Some(_) => formatted_string,
    }
}

fn plain_currency(number: f64) -> String {
    if number < 0.0 {
        format!("-{CURRENCY_PREFIX}{:.2}", number.abs())
    } else {
        format!("{CURRENCY_PREFIX}{number:.2}")
    }
}
