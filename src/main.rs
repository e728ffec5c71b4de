use std::sync::Arc;

use anyhow::Context;
use stock_forecast::{
    Database, EngineConfig, HistoricalPriceProvider, PredictionEngine, SqlitePriceProvider,
    SyntheticPriceProvider,
};
use tracing::{error, info};

/// Usage: stock-forecast [--config <path>] [TICKER...]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_forecast=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config = if args.first().map(String::as_str) == Some("--config") {
        anyhow::ensure!(args.len() >= 2, "--config needs a path");
        let path = args.remove(1);
        args.remove(0);
        EngineConfig::from_file(&path).with_context(|| format!("loading {}", path))?
    } else {
        EngineConfig::default()
    }
    .apply_env()?;

    let tickers = if args.is_empty() { vec!["AAPL".to_string()] } else { args };

    match config.database_path.clone() {
        Some(path) => {
            info!(path = %path, "using SQLite price history");
            let db = Database::open(&path).with_context(|| format!("opening {}", path))?;
            let engine = PredictionEngine::new(SqlitePriceProvider::new(Arc::new(db)), config);
            run(&engine, &tickers).await
        }
        None => {
            info!("using synthetic price history");
            let provider = SyntheticPriceProvider::new().with_default_universe();
            let engine = PredictionEngine::new(provider, config);
            run(&engine, &tickers).await
        }
    }
}

async fn run<P: HistoricalPriceProvider>(
    engine: &PredictionEngine<P>,
    tickers: &[String],
) -> anyhow::Result<()> {
    let mut failures = 0;
    for ticker in tickers {
        match engine.predict(ticker, None, None).await {
            Ok(result) => println!("{}", serde_json::to_string_pretty(result.as_ref())?),
            Err(e) => {
                error!(ticker = %ticker, "prediction failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures == tickers.len() {
        anyhow::bail!("no predictions produced");
    }
    Ok(())
}
