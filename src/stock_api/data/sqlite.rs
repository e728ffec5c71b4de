use std::future::Future;
use std::sync::Arc;

use super::provider::HistoricalPriceProvider;
use crate::database::Database;
use crate::error::{PredictionError, Result};
use crate::stock_api::types::PricePoint;

/// Reads daily bars previously stored in SQLite.
#[derive(Debug, Clone)]
pub struct SqlitePriceProvider {
    db: Arc<Database>,
}

impl SqlitePriceProvider {
    pub fn new(db: Arc<Database>) -> Self {
        SqlitePriceProvider { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl HistoricalPriceProvider for SqlitePriceProvider {
    fn get_historical_bars(
        &self,
        ticker: &str,
        days: usize,
    ) -> impl Future<Output = Result<Vec<PricePoint>>> + Send {
        let db = Arc::clone(&self.db);
        let ticker = ticker.to_string();
        async move {
            // rusqlite is blocking; keep it off the async workers
            tokio::task::spawn_blocking(move || db.get_bars(&ticker, days))
                .await
                .map_err(|e| PredictionError::Provider(format!("Database task failed: {}", e)))?
        }
    }
}
