use std::{fs::OpenOptions, net::SocketAddr, process::exit, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use ornaments_ledger::{
    AppState, LedgerConfig, UnitPrice, build_router, graceful_shutdown, logging_middleware,
};

/// The JSON API server for the shop ledger and invoices.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The price of one gram of pure metal, used to compute purchase amounts.
    #[arg(long, default_value_t = 5000.0)]
    unit_price: f64,

    /// The shop's timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The name printed at the top of invoices.
    #[arg(long, default_value = "S.K Ornaments")]
    shop_name: String,

    /// How long a database call may take, in milliseconds, before the request fails.
    #[arg(long, default_value_t = 5000)]
    db_timeout_ms: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let unit_price = match UnitPrice::new(args.unit_price) {
        Ok(unit_price) => unit_price,
        Err(error) => {
            tracing::error!("Invalid unit price: {error}");
            exit(1);
        }
    };

    let config = LedgerConfig {
        unit_price,
        local_timezone: args.timezone,
        shop_name: args.shop_name,
        db_timeout: Duration::from_millis(args.db_timeout_ms),
    };

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let state = match AppState::new(conn, config) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not start the server: {error}");
            exit(1);
        }
    };

    tracing::info!(
        "Using a unit price of {} per gram in timezone {}",
        state.unit_price,
        state.local_timezone
    );

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
