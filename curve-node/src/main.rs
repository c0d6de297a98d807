//! Curve Engine Node
//!
//! Builds a `CurveEngine` (with a sled-backed event log when a data
//! directory is given) and drives a complete curve lifecycle end to end:
//! create, trade, quote, freeze, launch.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use lib_curve::{CurveEngine, CurveState, EngineConfig, Owner, SledEventLog};
use lib_types::{keys, AccountId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_cli_args();

    let config = if args.strict_thresholds {
        EngineConfig::default()
    } else {
        EngineConfig::for_testing()
    };

    let engine = match &args.data_dir {
        Some(path) => {
            let log = SledEventLog::open(path)?;
            tracing::info!(path = %path.display(), "event log opened");
            CurveEngine::with_sink(config, Arc::new(log))?
        }
        None => CurveEngine::new(config)?,
    };

    run_session(&engine).await?;
    engine.flush_sink();
    Ok(())
}

/// Drive one full curve lifecycle and log every step
async fn run_session(engine: &CurveEngine) -> anyhow::Result<()> {
    let owner_account = account(1);
    let owner = Owner::User(owner_account);

    let curve = engine.create_curve(owner).await?;
    tracing::info!(curve = %curve.id, "curve created");

    // Four participants buy in; one buy carries a referrer.
    for (participant, amount, referrer) in [
        (account(2), 400u64, None),
        (account(3), 300, Some(account(2))),
        (account(4), 200, None),
        (account(5), 100, None),
    ] {
        let quote = engine.quote_buy(&curve.id, keys(amount)).await?;
        let receipt = engine.buy(&curve.id, participant, keys(amount), referrer).await?;
        tracing::info!(
            participant = %participant,
            keys = amount,
            cost = receipt.notional,
            quoted = quote.cost,
            spot = receipt.spot_price,
            "buy committed"
        );
    }

    // One participant takes profit before the launch.
    let sell = engine.sell(&curve.id, account(2), keys(50)).await?;
    tracing::info!(
        gross = sell.notional,
        tax = sell.fees.tax,
        payout = sell.payout,
        "sell committed"
    );

    let stats = engine.stats(&curve.id).await?;
    tracing::info!(
        spot = stats.spot_price,
        market_cap = stats.market_cap,
        volume_24h = stats.volume_24h,
        holders = stats.top_holders.len(),
        eligible = stats.progress.eligible,
        "pre-freeze stats"
    );

    let frozen = engine.freeze(&curve.id, owner_account).await?;
    tracing::info!(state = %frozen.state, "curve frozen");

    let outcome = engine.launch(&curve.id, owner_account, 1_000).await?;
    tracing::info!(
        mint = %outcome.token_mint,
        distributed = outcome.distributed_total,
        holders = outcome.distributions.len(),
        "curve launched"
    );
    for allocation in &outcome.distributions {
        tracing::info!(
            account = %allocation.account,
            share_bps = allocation.share_bps,
            amount = allocation.amount,
            "allocation"
        );
    }

    let stats = engine.registry_stats().await;
    tracing::info!(
        created = stats.total_created,
        launched = stats.launched,
        "session complete"
    );
    debug_assert_eq!(engine.list_by_state(CurveState::Launched).await.len(), 1);

    Ok(())
}

fn account(n: u8) -> AccountId {
    AccountId::new([n; 32])
}

struct CliArgs {
    data_dir: Option<PathBuf>,
    strict_thresholds: bool,
}

/// Simple argument parser
fn parse_cli_args() -> CliArgs {
    let args: Vec<String> = env::args().collect();
    let mut data_dir = None;
    let mut strict_thresholds = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--strict-thresholds" => {
                strict_thresholds = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    CliArgs {
        data_dir,
        strict_thresholds,
    }
}
