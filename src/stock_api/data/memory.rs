use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;

use super::provider::{normalize_bars, HistoricalPriceProvider};
use crate::error::Result;
use crate::stock_api::types::PricePoint;

/// Fixed bars held in memory, keyed by ticker.
#[derive(Debug, Default)]
pub struct InMemoryPriceProvider {
    bars: RwLock<HashMap<String, Vec<PricePoint>>>,
}

impl InMemoryPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(ticker: &str, bars: Vec<PricePoint>) -> Self {
        let mut map = HashMap::new();
        map.insert(ticker.to_string(), normalize_bars(bars, usize::MAX));
        InMemoryPriceProvider {
            bars: RwLock::new(map),
        }
    }

    pub async fn set_bars(&self, ticker: &str, bars: Vec<PricePoint>) {
        let mut map = self.bars.write().await;
        map.insert(ticker.to_string(), normalize_bars(bars, usize::MAX));
    }
}

impl HistoricalPriceProvider for InMemoryPriceProvider {
    fn get_historical_bars(
        &self,
        ticker: &str,
        days: usize,
    ) -> impl Future<Output = Result<Vec<PricePoint>>> + Send {
        async move {
            let map = self.bars.read().await;
            let bars = map.get(ticker).cloned().unwrap_or_default();
            Ok(normalize_bars(bars, days))
        }
    }
}
