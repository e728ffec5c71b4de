use serde::{Deserialize, Serialize};

use super::policy::{
    finite_or, Computed, LEVELS_FALLBACK_BAND, LEVELS_MIN_POINTS, LEVELS_WINDOW, MACD_FALLBACK,
    MACD_FAST, MACD_SIGNAL, MACD_SLOW, RESISTANCE_PERCENTILE, RSI_NEUTRAL, RSI_PERIOD,
    SUPPORT_PERCENTILE,
};
use super::types::{MacdSnapshot, TechnicalSnapshot};
use super::utils::{mean, validate_data};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub support: f64,
    pub resistance: f64,
}

/// Indicator values with a record of which ones fell back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorReport {
    pub rsi: Computed<f64>,
    pub macd: Computed<MacdSnapshot>,
    pub levels: Computed<PriceLevels>,
}

impl IndicatorReport {
    pub fn snapshot(&self) -> TechnicalSnapshot {
        let levels = *self.levels.as_ref();
        TechnicalSnapshot {
            rsi: *self.rsi.as_ref(),
            macd: *self.macd.as_ref(),
            support: levels.support,
            resistance: levels.resistance,
        }
    }

    pub fn fallbacks(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.rsi.is_fallback() {
            names.push("rsi");
        }
        if self.macd.is_fallback() {
            names.push("macd");
        }
        if self.levels.is_fallback() {
            names.push("support_resistance");
        }
        names
    }
}

pub fn calculate_indicators(closes: &[f64]) -> TechnicalSnapshot {
    calculate_indicators_checked(closes).snapshot()
}

pub fn calculate_indicators_checked(closes: &[f64]) -> IndicatorReport {
    let valid = validate_data(closes);
    let deltas = valid.len().saturating_sub(1);

    if deltas < RSI_PERIOD {
        return IndicatorReport {
            rsi: Computed::InsufficientData(RSI_NEUTRAL),
            macd: Computed::InsufficientData(MACD_FALLBACK),
            levels: Computed::InsufficientData(fallback_levels(&valid)),
        };
    }

    IndicatorReport {
        rsi: calculate_rsi(&valid, RSI_PERIOD),
        macd: calculate_macd(&valid),
        levels: calculate_levels(&valid),
    }
}

/// Simple mean of the last `period` values. Assumes validated input.
pub fn calculate_sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    Some(mean(&data[data.len() - period..]))
}

/// RSI over the last `period` day-over-day deltas.
pub fn calculate_rsi(data: &[f64], period: usize) -> Computed<f64> {
    if period == 0 || data.len() < period + 1 {
        return Computed::InsufficientData(RSI_NEUTRAL);
    }

    let window = &data[data.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for w in window.windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 {
            Computed::Value(RSI_NEUTRAL)
        } else {
            Computed::Value(100.0)
        };
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    if rsi.is_finite() {
        Computed::Value(rsi)
    } else {
        Computed::InsufficientData(RSI_NEUTRAL)
    }
}

/// SMA-based MACD line at the end of `data`.
fn macd_line(data: &[f64]) -> Option<f64> {
    let fast = calculate_sma(data, MACD_FAST)?;
    let slow = calculate_sma(data, MACD_SLOW)?;
    let line = fast - slow;
    line.is_finite().then_some(line)
}

/// Simplified MACD: SMA12 - SMA26, with the signal taken as the average of
/// the current line and the mean of the line over the last 9 positions.
pub fn calculate_macd(data: &[f64]) -> Computed<MacdSnapshot> {
    let Some(line) = macd_line(data) else {
        return Computed::InsufficientData(MACD_FALLBACK);
    };

    let positions = (data.len() - MACD_SLOW + 1).min(MACD_SIGNAL);
    let recent_lines: Vec<f64> = (0..positions)
        .filter_map(|k| macd_line(&data[..data.len() - k]))
        .collect();

    let signal = (line + mean(&recent_lines)) / 2.0;
    let histogram = line - signal;

    if signal.is_finite() && histogram.is_finite() {
        Computed::Value(MacdSnapshot { signal, histogram })
    } else {
        Computed::InsufficientData(MACD_FALLBACK)
    }
}

fn fallback_levels(valid: &[f64]) -> PriceLevels {
    let first = valid.first().copied().unwrap_or(0.0);
    PriceLevels {
        support: first * (1.0 - LEVELS_FALLBACK_BAND),
        resistance: first * (1.0 + LEVELS_FALLBACK_BAND),
    }
}

/// 20th/80th percentile of the last 30 closes.
pub fn calculate_levels(valid: &[f64]) -> Computed<PriceLevels> {
    let recent = &valid[valid.len().saturating_sub(LEVELS_WINDOW)..];
    if recent.len() < LEVELS_MIN_POINTS {
        return Computed::InsufficientData(fallback_levels(valid));
    }

    let mut sorted = recent.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let at = |pct: f64| {
        let idx = ((sorted.len() as f64 * pct).floor() as usize).min(sorted.len() - 1);
        sorted[idx]
    };

    let fallback = fallback_levels(valid);
    Computed::Value(PriceLevels {
        support: finite_or(at(SUPPORT_PERCENTILE), fallback.support),
        resistance: finite_or(at(RESISTANCE_PERCENTILE), fallback.resistance),
    })
}
