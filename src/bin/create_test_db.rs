use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use ornaments_ledger::{
    NewCustomer, NewPurchase, UnitPrice, create_customer, initialize_db, record_purchase,
};

/// A utility for creating a test database for the ledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The price of one gram of pure metal used for the sample purchases.
    #[arg(long, default_value_t = 5000.0)]
    unit_price: f64,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let unit_price = UnitPrice::new(args.unit_price)?;

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test customers...");

    let asha = create_customer(NewCustomer::new("Asha", Some("asha@example.com"))?, &conn)?;
    let ravi = create_customer(NewCustomer::new("Ravi", None)?, &conn)?;
    create_customer(NewCustomer::new("Meera", None)?, &conn)?;

    println!("Recording test purchases...");

    for (customer_id, item_name, weight, percentage) in [
        (asha.id, "Ring", 10.0, 91.6),
        (asha.id, "Bangle", 5.0, 100.0),
        (ravi.id, "Chain", 12.5, 75.0),
    ] {
        let receipt = record_purchase(
            NewPurchase::new(customer_id, item_name, weight, percentage)?,
            unit_price,
            &conn,
        )?;
        println!(
            "  {} bought a {item_name}, new balance {}",
            receipt.customer_name, receipt.new_balance
        );
    }

    println!("Success!");

    Ok(())
}
