//! Promokit CLI
//!
//! Evaluates the promotions of a YAML fixture against one or more of its orders and prints a
//! rewards report for each.

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use promokit::{
    coupons::{CodeComparison, CouponFilter},
    engine::PromotionEngine,
    fixtures::Fixture,
    fulfillment::RequestedStatuses,
    report::RewardReport,
    rewards::StaticLocalization,
};

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Evaluate fixture promotions against fixture orders.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Fixture file
    #[arg(short, long, env = "PROMOKIT_FIXTURE", default_value = "fixtures/demo.yml")]
    fixture: PathBuf,

    /// Order to evaluate; every order in the fixture when omitted
    #[arg(short, long)]
    order: Option<String>,

    /// Coupon code entered on the order (repeatable)
    #[arg(short, long = "coupon")]
    coupons: Vec<String>,

    /// Compare coupon codes exactly instead of ignoring case
    #[arg(long, default_value_t = false)]
    exact_coupons: bool,

    /// Only report fulfilled and partially fulfilled promotions
    #[arg(long, default_value_t = false)]
    applied_only: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

fn init_subscriber(args: &Args) -> Result<()> {
    match args.log_format {
        LogFormat::Compact => init_with_layer(
            args,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(io::stderr),
        ),
        LogFormat::Json => init_with_layer(
            args,
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_writer(io::stderr),
        ),
    }
}

fn init_with_layer<L>(args: &Args, fmt_layer: L) -> Result<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("failed to initialise logging")
}

/// Rewards report for every selected order
fn main() -> Result<()> {
    let args = Args::parse();

    init_subscriber(&args)?;

    let fixture = Fixture::from_path(&args.fixture)
        .with_context(|| format!("failed to load fixture {}", args.fixture.display()))?;

    let localization = StaticLocalization::new();

    for (key, error) in fixture.validate(&localization) {
        tracing::warn!(promotion = key, %error, "promotion is misconfigured");
    }

    let comparison = if args.exact_coupons {
        CodeComparison::Exact
    } else {
        CodeComparison::CaseInsensitive
    };

    let requested = if args.applied_only {
        RequestedStatuses::FULFILLED | RequestedStatuses::PARTIALLY_FULFILLED
    } else {
        RequestedStatuses::ALL
    };

    let engine = PromotionEngine::new(fixture.catalog(), localization)
        .with_coupon_filter(CouponFilter::new().with_comparison(comparison));

    let order_names: Vec<&str> = match args.order.as_deref() {
        Some(name) => vec![name],
        None => fixture.order_names().collect(),
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for name in order_names {
        let order = fixture.order(name)?;

        let start = Instant::now();
        let pass = engine.evaluate(order, fixture.promotions(), args.coupons.as_slice(), requested);
        let elapsed = start.elapsed();

        let report = RewardReport::build(&pass, fixture.promotions(), fixture.catalog())?;

        writeln!(handle, "\n Order: {name}")?;

        report.write_to(&mut handle)?;

        writeln!(
            handle,
            " {} ({}s)",
            elapsed.human(Truncate::Nano),
            elapsed.as_secs_f32()
        )?;
    }

    Ok(())
}
