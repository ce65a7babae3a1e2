//! Demo host for the trading simulator.
//!
//! Construction order is market data source, risk engine, order manager,
//! strategies; teardown runs in reverse. The host owns the fan-out: it
//! registers the single tick callback and the single execution-report
//! callback, each iterating over the strategy list.

use anyhow::Result;
use clap::Parser;
use execution_engine::{OrderManager, RiskConfig, RiskEngine, SimulatedExchange};
use log::info;
use market_data::MockMarketDataSource;
use sim_api::{MarketDataSource, Strategy};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use strategies::{MeanReversionStrategy, MomentumStrategy};

#[derive(Parser, Debug)]
#[command(about = "In-process trading simulator")]
struct Args {
    /// How long to let the strategies run, in seconds.
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Synthetic ticks per second per subscribed instrument.
    #[arg(long, default_value_t = 2.0)]
    tick_rate: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let market_data: Arc<dyn MarketDataSource> =
        Arc::new(MockMarketDataSource::new(args.tick_rate));

    let risk = Arc::new(RiskEngine::new(RiskConfig {
        max_order_size: 1000,
        max_open_contracts_per_instrument: 500,
        max_daily_volume_per_instrument: 2000,
        allowed_instruments: ["AAPL", "SPY", "MSFT"].iter().map(|s| s.to_string()).collect(),
        ..RiskConfig::default()
    }));

    let order_manager = Arc::new(OrderManager::new(
        Arc::clone(&risk),
        Box::new(SimulatedExchange::new()),
    ));

    let strategies: Vec<Arc<dyn Strategy>> = vec![
        Arc::new(MeanReversionStrategy::new(
            "MeanRevAAPL",
            "AAPL",
            20,
            2.0,
            10,
            Arc::clone(&order_manager),
            Arc::clone(&market_data),
        )),
        Arc::new(MomentumStrategy::new(
            "MomentumSPY",
            "SPY",
            10,
            30,
            5,
            Arc::clone(&order_manager),
            Arc::clone(&market_data),
        )?),
    ];

    let tick_consumers = strategies.clone();
    market_data.set_market_data_callback(Arc::new(move |tick| {
        for strategy in &tick_consumers {
            strategy.on_market_data(tick);
        }
    }));

    let report_consumers = strategies.clone();
    order_manager.set_execution_report_callback(Arc::new(move |report| {
        for strategy in &report_consumers {
            strategy.on_execution_report(report);
        }
    }));

    for strategy in &strategies {
        strategy.start();
    }
    market_data.start();

    info!("pipeline running for {}s", args.duration_secs);
    thread::sleep(Duration::from_secs(args.duration_secs));

    for strategy in strategies.iter().rev() {
        strategy.stop();
    }
    market_data.stop();

    for position in order_manager.positions() {
        info!(
            "final position {}: qty={} avg={:.4} realized_pnl={:.2}",
            position.instrument_id,
            position.quantity,
            position.average_entry_price,
            position.realized_pnl
        );
    }

    Ok(())
}
