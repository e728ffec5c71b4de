//! Data-sufficiency thresholds and the fallback values substituted when a
//! computation cannot run on the data it was given.

use serde::{Deserialize, Serialize};

use super::types::{AccuracyMetrics, MacdSnapshot};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized volatility used when no valid returns exist.
pub const DEFAULT_VOLATILITY: f64 = 0.2;

pub const ARIMA_AR_COEFF: f64 = 0.7;
pub const ARIMA_MA_COEFF: f64 = 0.3;
/// Noise amplitude as a fraction of the last value.
pub const ARIMA_NOISE_PCT: f64 = 0.01;

pub const LSTM_SHORT_WINDOW: usize = 5;
pub const LSTM_LONG_WINDOW: usize = 20;
pub const LSTM_VOLATILITY_WINDOW: usize = 10;
pub const LSTM_CYCLE_PERIOD: f64 = 30.0;
pub const LSTM_CYCLE_AMPLITUDE: f64 = 0.01;
/// Points needed for both LSTM trend windows.
pub const LSTM_MIN_POINTS: usize = 2 * LSTM_LONG_WINDOW;

pub const CI_HORIZON_GROWTH: f64 = 0.5;
/// Averaging two models shrinks the ensemble's variance.
pub const ENSEMBLE_VOLATILITY_FACTOR: f64 = 0.9;

pub const RSI_PERIOD: usize = 14;
pub const RSI_NEUTRAL: f64 = 50.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const MACD_FALLBACK: MacdSnapshot = MacdSnapshot { signal: 0.0, histogram: 0.0 };

pub const LEVELS_WINDOW: usize = 30;
pub const LEVELS_MIN_POINTS: usize = 5;
pub const SUPPORT_PERCENTILE: f64 = 0.2;
pub const RESISTANCE_PERCENTILE: f64 = 0.8;
/// Support/resistance offset from the first price when levels can't be computed.
pub const LEVELS_FALLBACK_BAND: f64 = 0.05;

pub const ACCURACY_MAPE_CAP: f64 = 99.0;
pub const ACCURACY_MAX: f64 = 99.0;
pub const ACCURACY_FALLBACK: AccuracyMetrics = AccuracyMetrics { accuracy: 80.0, mape: 20.0, rmse: 5.0 };

pub const BACKTEST_HOLDOUT: usize = 20;
pub const ANNOTATED_HISTORY: usize = 10;
/// Perturbation range for the retrospective annotations, as fractions.
pub const ANNOTATION_NOISE_ENSEMBLE: f64 = 0.02;
pub const ANNOTATION_NOISE_MODEL: f64 = 0.03;

pub const TREND_THRESHOLD_PCT: f64 = 1.0;
pub const BASE_CONFIDENCE: f64 = 85.0;
pub const MAX_CONFIDENCE_PENALTY: f64 = 15.0;
pub const LARGE_MOVE_PCT: f64 = 15.0;

/// A value that was either computed from the data or substituted because the
/// data was too sparse or degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Computed<T> {
    Value(T),
    InsufficientData(T),
}

impl<T> Computed<T> {
    pub fn value(self) -> T {
        match self {
            Computed::Value(v) | Computed::InsufficientData(v) => v,
        }
    }

    pub fn as_ref(&self) -> &T {
        match self {
            Computed::Value(v) | Computed::InsufficientData(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Computed::InsufficientData(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Computed<U> {
        match self {
            Computed::Value(v) => Computed::Value(f(v)),
            Computed::InsufficientData(v) => Computed::InsufficientData(f(v)),
        }
    }
}

/// Returns `value` if finite, otherwise `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_accessors() {
        let real = Computed::Value(3.0);
        let fallback = Computed::InsufficientData(50.0);
        assert!(!real.is_fallback());
        assert!(fallback.is_fallback());
        assert_eq!(*fallback.as_ref(), 50.0);
        assert_eq!(fallback.map(|v| v * 2.0), Computed::InsufficientData(100.0));
        assert_eq!(real.value(), 3.0);
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(1.5, 0.0), 1.5);
        assert_eq!(finite_or(f64::NAN, 7.0), 7.0);
        assert_eq!(finite_or(f64::NEG_INFINITY, 7.0), 7.0);
    }
}
