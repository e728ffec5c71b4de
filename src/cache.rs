use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::stock_api::types::PredictionResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub ticker: String,
    pub lookback_days: usize,
    pub forecast_days: usize,
}

impl CacheKey {
    pub fn new(ticker: &str, lookback_days: usize, forecast_days: usize) -> Self {
        CacheKey {
            ticker: ticker.to_string(),
            lookback_days,
            forecast_days,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.ticker, self.lookback_days, self.forecast_days)
    }
}

/// Finished predictions keyed by request. Concurrent identical requests are
/// not coalesced: each computes and the last insert wins.
#[derive(Clone)]
pub struct PredictionCache {
    results: Cache<CacheKey, Arc<PredictionResult>>,
}

impl PredictionCache {
    /// Without a `ttl` entries live until evicted for capacity or cleared.
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        let results = builder.build();

        Self { results }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_max_capacity, config.cache_ttl())
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<PredictionResult>> {
        self.results.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, result: Arc<PredictionResult>) {
        self.results.insert(key, result).await;
    }

    /// Drops every cached result for `ticker`, whatever its horizon. Returns
    /// how many entries were invalidated.
    pub async fn invalidate_ticker(&self, ticker: &str) -> usize {
        let keys: Vec<Arc<CacheKey>> = self
            .results
            .iter()
            .filter(|(k, _)| k.ticker == ticker)
            .map(|(k, _)| k)
            .collect();

        for key in &keys {
            self.results.invalidate(key.as_ref()).await;
        }
        keys.len()
    }

    pub async fn invalidate_all(&self) {
        self.results.invalidate_all();
        self.results.run_pending_tasks().await;
    }

    pub async fn entry_count(&self) -> u64 {
        self.results.run_pending_tasks().await;
        self.results.entry_count()
    }
}

impl Default for PredictionCache {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl std::fmt::Debug for PredictionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionCache")
            .field("entries", &self.results.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(CacheKey::new("AAPL", 90, 30).to_string(), "AAPL-90-30");
    }

    #[tokio::test]
    async fn test_invalidate_ticker_counts_matching_entries() {
        let cache = PredictionCache::new(100, Some(Duration::from_secs(60)));
        let result = Arc::new(sample_result("AAPL"));
        cache.insert(CacheKey::new("AAPL", 90, 30), Arc::clone(&result)).await;
        cache.insert(CacheKey::new("AAPL", 60, 10), Arc::clone(&result)).await;
        cache.insert(CacheKey::new("AAPLX", 90, 30), Arc::clone(&result)).await;

        assert_eq!(cache.invalidate_ticker("AAPL").await, 2);
        assert!(cache.get(&CacheKey::new("AAPL", 90, 30)).await.is_none());
        assert!(cache.get(&CacheKey::new("AAPLX", 90, 30)).await.is_some());
    }

    fn sample_result(ticker: &str) -> PredictionResult {
        use crate::stock_api::types::*;
        let insight = |model: &str| ModelInsight {
            model: model.to_string(),
            accuracy: 80.0,
            mape: 20.0,
            rmse: 5.0,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            best_for: String::new(),
            confidence_score: 8.0,
        };
        PredictionResult {
            ticker: ticker.to_string(),
            historical_data: Vec::new(),
            predictions: Vec::new(),
            insights: Insights {
                trend: Trend::Neutral,
                confidence: 85.0,
                change_percent: 0.0,
                volatility: 0.2,
                support: 0.0,
                resistance: 0.0,
                rsi: 50.0,
                macd: MacdSnapshot::default(),
                next_key_date: None,
                anomalies: Vec::new(),
                data_quality: DataQuality::Insufficient,
                fallbacks: Vec::new(),
            },
            model_insights: ModelInsights {
                arima: insight("ARIMA"),
                lstm: insight("LSTM"),
            },
        }
    }
}
