//! Pricewatch - headless price alert monitor.
//!
//! Evaluates user price alerts on a fixed cadence and serves the alert CRUD
//! API. Passes run to completion one at a time; a failed pass is reported to
//! the operator channel and retried on the next tick.

mod api;

use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use pricewatch_alerts::{FailureReporter, HttpPushProvider, NotificationRouter, OperatorTopic};
use pricewatch_engine::EvaluationRunner;
use pricewatch_feeds::CoinGeckoClient;
use pricewatch_store::Database;

/// Pricewatch CLI
#[derive(Parser, Debug)]
#[command(name = "pricewatch")]
#[command(about = "Market price alert monitor", long_about = None)]
struct Args {
    /// Seconds between evaluation passes
    #[arg(short, long, default_value_t = 300)]
    interval_secs: u64,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Bind address for the alert CRUD API
    #[arg(long, default_value = "127.0.0.1:8080")]
    http_addr: String,

    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn origin_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "pricewatch".to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    let database_url = args
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://pricewatch.db".to_string());
    let push_url =
        std::env::var("PUSH_GATEWAY_URL").unwrap_or_else(|_| "http://127.0.0.1:9300".to_string());
    let operator_channel =
        std::env::var("OPERATOR_CHANNEL").unwrap_or_else(|_| "pricewatch-operator".to_string());

    let db = match Database::connect(&database_url).await {
        Ok(db) => db,
        Err(err) => {
            error!(error = %err, url = %database_url, "failed to open database");
            std::process::exit(1);
        }
    };

    let provider = HttpPushProvider::new(push_url);
    let operator = match OperatorTopic::create(provider.clone(), &operator_channel).await {
        Ok(topic) => topic,
        Err(err) => {
            error!(error = %err, channel = %operator_channel, "failed to provision operator channel");
            std::process::exit(1);
        }
    };
    let reporter = FailureReporter::new(operator, origin_hostname());

    let runner = EvaluationRunner::new(
        db.clone(),
        CoinGeckoClient::new(),
        NotificationRouter::new(provider),
    );

    let api_db = db.clone();
    let http_addr = args.http_addr.clone();
    tokio::spawn(async move {
        if let Err(err) = api::serve(api_db, &http_addr).await {
            error!(error = %err, "alert API server exited");
        }
    });

    info!(
        interval_secs = args.interval_secs,
        "starting evaluation scheduler"
    );
    let mut interval = tokio::time::interval(Duration::from_secs(args.interval_secs));
    loop {
        interval.tick().await;

        // Awaited inline: a slow pass delays the next tick instead of
        // overlapping it.
        match reporter.run(runner.run()).await {
            Ok(summary) => info!(
                evaluated = summary.alerts_evaluated,
                fired = summary.triggers_fired,
                skipped = summary.alerts_skipped,
                errors = summary.notification_errors,
                symbols = summary.symbols_fetched,
                "pass complete"
            ),
            Err(err) => error!(error = %err, "pass failed"),
        }
    }
}
