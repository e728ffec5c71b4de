use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::stock_api::types::PricePoint;

/// Source of daily bars for the prediction engine.
///
/// Implementations return at most `days` bars, ascending by date with no
/// duplicate dates. An unknown ticker yields an empty vector, not an error.
pub trait HistoricalPriceProvider: Send + Sync {
    fn get_historical_bars(
        &self,
        ticker: &str,
        days: usize,
    ) -> impl Future<Output = Result<Vec<PricePoint>>> + Send;
}

impl<P: HistoricalPriceProvider> HistoricalPriceProvider for Arc<P> {
    fn get_historical_bars(
        &self,
        ticker: &str,
        days: usize,
    ) -> impl Future<Output = Result<Vec<PricePoint>>> + Send {
        (**self).get_historical_bars(ticker, days)
    }
}

/// Sorts by date, drops duplicate dates (last one wins) and keeps the most
/// recent `days` bars.
pub fn normalize_bars(mut bars: Vec<PricePoint>, days: usize) -> Vec<PricePoint> {
    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => deduped.push(bar),
        }
    }
    let skip = deduped.len().saturating_sub(days);
    deduped.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
            adj_close: None,
        }
    }

    #[test]
    fn test_normalize_sorts_dedupes_and_truncates() {
        let bars = vec![bar(4, 4.0), bar(2, 2.0), bar(3, 3.0), bar(2, 2.5), bar(5, 5.0)];
        let normalized = normalize_bars(bars, 3);
        let closes: Vec<f64> = normalized.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![3.0, 4.0, 5.0]);

        let all = normalize_bars(vec![bar(2, 2.0), bar(2, 2.5)], 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].close, 2.5);
    }
}
