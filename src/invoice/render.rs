//! Lays out an [Invoice] as a one page PDF.

use crate::{
    Error,
    currency::format_currency,
    invoice::{
        Invoice,
        pdf::{Font, PAGE_HEIGHT, PAGE_WIDTH, PdfPage},
    },
    timezone::format_local_date,
};

const MARGIN: f32 = 50.0;
const LINE_HEIGHT: f32 = 20.0;
const BODY_SIZE: f32 = 11.0;

/// The x position of each column in the purchase table.
const COLUMNS: [f32; 4] = [MARGIN, 260.0, 350.0, 440.0];

/// The last line of every invoice.
pub const CLOSING_LINE: &str = "Thank you for your purchase. Please visit again!";

/// Render `invoice` as a PDF document.
///
/// The invoice date is the date of the current purchase in `local_timezone`.
///
/// # Errors
/// Returns an [Error::InvalidTimezone] if `local_timezone` is not a canonical
/// timezone name, or an [Error::InvalidDateFormat] if the date cannot be formatted.
pub fn render_invoice_pdf(
    invoice: &Invoice,
    shop_name: &str,
    local_timezone: &str,
) -> Result<Vec<u8>, Error> {
    let date = format_local_date(invoice.current_purchase.created_at, local_timezone)?;
    let purchase = &invoice.current_purchase;

    let mut page = PdfPage::new();
    page.title(&format!(
        "{shop_name} Invoice No. {} for {}",
        purchase.id, invoice.customer.name
    ));
    let mut y = PAGE_HEIGHT - MARGIN - 10.0;
    let right_edge = PAGE_WIDTH - MARGIN;

    page.text(MARGIN, y, Font::Bold, 22.0, shop_name);
    y -= LINE_HEIGHT;
    page.text(
        MARGIN,
        y,
        Font::Regular,
        BODY_SIZE,
        &format!("Invoice No. {}", purchase.id),
    );
    y -= LINE_HEIGHT / 2.0;
    page.rule(MARGIN, right_edge, y);

    y -= LINE_HEIGHT * 1.5;
    for (label, value) in [
        ("Customer", invoice.customer.name.clone()),
        ("Invoice date", date),
        ("Past balance", format_currency(invoice.past_balance)),
    ] {
        page.text(MARGIN, y, Font::Bold, BODY_SIZE, label)
            .text(COLUMNS[1], y, Font::Regular, BODY_SIZE, &value);
        y -= LINE_HEIGHT;
    }

    y -= LINE_HEIGHT / 2.0;
    for (x, heading) in COLUMNS
        .iter()
        .zip(["Item", "Weight (g)", "Purity (%)", "Amount"])
    {
        page.text(*x, y, Font::Bold, BODY_SIZE, heading);
    }
    y -= LINE_HEIGHT / 2.0;
    page.rule(MARGIN, right_edge, y);

    y -= LINE_HEIGHT;
    let row = [
        purchase.item_name.clone(),
        format!("{:.2}", purchase.weight),
        format!("{:.2}", purchase.percentage),
        format_currency(purchase.amount),
    ];
    for (x, cell) in COLUMNS.iter().zip(row.iter()) {
        page.text(*x, y, Font::Regular, BODY_SIZE, cell);
    }
    y -= LINE_HEIGHT / 2.0;
    page.rule(MARGIN, right_edge, y);

    y -= LINE_HEIGHT * 1.5;
    page.text(MARGIN, y, Font::Bold, 13.0, "Total balance")
        .text(
            COLUMNS[3],
            y,
            Font::Bold,
            13.0,
            &format_currency(invoice.total_balance),
        );

    y -= LINE_HEIGHT * 3.0;
    page.text(MARGIN, y, Font::Regular, BODY_SIZE, CLOSING_LINE);

    Ok(page.into_bytes())
}
