use std::collections::HashSet;
use std::f64::consts::PI;
use std::future::Future;

use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::HistoricalPriceProvider;
use crate::error::Result;
use crate::stock_api::types::PricePoint;
use crate::stock_api::utils::is_weekend;

pub const DEFAULT_TICKERS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "JPM", "BTC-USD", "ETH-USD",
];

const DAILY_DRIFT: f64 = 0.0004;
const DAILY_VOLATILITY: f64 = 0.018;

/// Weekday-only random-walk bars. Each ticker gets its own seeded walk, so
/// repeated calls return the same history and a longer lookback only
/// extends it further into the past.
#[derive(Debug, Clone)]
pub struct SyntheticPriceProvider {
    as_of: NaiveDate,
    universe: Option<HashSet<String>>,
    seed: u64,
}

impl Default for SyntheticPriceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticPriceProvider {
    /// Generates bars for any ticker, ending today.
    pub fn new() -> Self {
        SyntheticPriceProvider {
            as_of: Local::now().date_naive(),
            universe: None,
            seed: 0,
        }
    }

    /// Only the given tickers have data; anything else comes back empty.
    pub fn with_universe<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.universe = Some(tickers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default_universe(self) -> Self {
        self.with_universe(DEFAULT_TICKERS)
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn knows(&self, ticker: &str) -> bool {
        self.universe.as_ref().map_or(true, |u| u.contains(ticker))
    }

    pub fn generate(&self, ticker: &str, days: usize) -> Vec<PricePoint> {
        if days == 0 || !self.knows(ticker) {
            return Vec::new();
        }

        let ticker_seed = fnv1a(ticker.as_bytes()) ^ self.seed;
        let mut rng = StdRng::seed_from_u64(ticker_seed);
        let mut close = 20.0 + (ticker_seed % 480) as f64 + rng.gen::<f64>();

        let mut date = self.as_of;
        while is_weekend(&date) {
            date -= Duration::days(1);
        }

        // walk backwards from the anchor so the tail is stable across lookbacks
        let mut bars = Vec::with_capacity(days);
        for _ in 0..days {
            let ret = DAILY_DRIFT + DAILY_VOLATILITY * standard_normal(&mut rng);
            let open = close / (1.0 + ret * rng.gen_range(0.2..0.8));
            let wick = rng.gen_range(0.0..0.01);
            let high = open.max(close) * (1.0 + wick);
            let low = open.min(close) * (1.0 - wick);
            let volume = rng.gen_range(500_000..5_000_000);

            bars.push(PricePoint {
                date,
                open,
                high,
                low,
                close,
                volume,
                adj_close: Some(close),
            });

            close = (close / (1.0 + ret)).max(0.01);
            date -= Duration::days(1);
            while is_weekend(&date) {
                date -= Duration::days(1);
            }
        }

        bars.reverse();
        bars
    }
}

impl HistoricalPriceProvider for SyntheticPriceProvider {
    fn get_historical_bars(
        &self,
        ticker: &str,
        days: usize,
    ) -> impl Future<Output = Result<Vec<PricePoint>>> + Send {
        let bars = self.generate(ticker, days);
        async move { Ok(bars) }
    }
}

/// Box-Muller transform.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
