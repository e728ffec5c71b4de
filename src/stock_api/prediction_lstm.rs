use std::f64::consts::PI;

use rand::Rng;

use super::policy::{
    finite_or, LSTM_CYCLE_AMPLITUDE, LSTM_CYCLE_PERIOD, LSTM_LONG_WINDOW, LSTM_SHORT_WINDOW,
    LSTM_VOLATILITY_WINDOW,
};
use super::utils::{calculate_returns, mean, std_dev, validate_data};

/// Signals extracted from history that drive the LSTM-like walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSignals {
    /// Per-step growth implied by the last 5 vs the preceding 5 values.
    pub short_trend: f64,
    /// Per-step growth implied by the last 20 vs the preceding 20 values.
    pub long_trend: f64,
    pub cycle: f64,
    pub volatility: f64,
}

impl TrendSignals {
    pub fn from_history(valid: &[f64]) -> Self {
        let short = window_growth(valid, LSTM_SHORT_WINDOW);
        let long = window_growth(valid, LSTM_LONG_WINDOW);

        let short_trend = short.unwrap_or(0.0);
        // fall back to the short window when the long one can't be sliced
        let long_trend = long.unwrap_or(short_trend);

        let n = valid.len() as f64;
        let cycle = (PI * n / LSTM_CYCLE_PERIOD).sin() * LSTM_CYCLE_AMPLITUDE;

        let recent = &valid[valid.len().saturating_sub(LSTM_VOLATILITY_WINDOW + 1)..];
        let volatility = finite_or(std_dev(&calculate_returns(recent)), 0.0);

        TrendSignals {
            short_trend,
            long_trend,
            cycle,
            volatility,
        }
    }
}

/// Growth per step between the mean of the last `window` values and the mean
/// of the `window` before them. `None` without `2 * window` values.
fn window_growth(valid: &[f64], window: usize) -> Option<f64> {
    let n = valid.len();
    if window == 0 || n < 2 * window {
        return None;
    }
    let recent = mean(&valid[n - window..]);
    let previous = mean(&valid[n - 2 * window..n - window]);
    if previous <= 0.0 {
        return None;
    }
    let growth = (recent / previous - 1.0) / window as f64;
    growth.is_finite().then_some(growth)
}

/// Forecasts `periods` future values by compounding blended trend, cycle and
/// noise onto the last price. Needs 40 points for both trend windows; with
/// less it degrades to whatever windows can be sliced.
pub fn simulate_lstm<R: Rng + ?Sized>(closes: &[f64], periods: usize, rng: &mut R) -> Vec<f64> {
    let valid = validate_data(closes);
    let Some(&last) = valid.last() else {
        return vec![0.0; periods];
    };

    let signals = TrendSignals::from_history(&valid);
    let mut value = last;
    let mut forecast = Vec::with_capacity(periods);

    for i in 0..periods {
        let long_weight = i as f64 / periods as f64;
        let short_weight = 1.0 - long_weight;
        let trend = short_weight * signals.short_trend + long_weight * signals.long_trend;

        let cyclical = signals.cycle * (i + 1) as f64 / periods as f64;
        let noise = (rng.gen::<f64>() - 0.5) * signals.volatility;

        let next = value * (1.0 + trend + cyclical + noise);
        if next.is_finite() && next >= 0.0 {
            value = next;
        }
        forecast.push(value);
    }

    forecast
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn linear(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_window_growth() {
        let data = linear(10);
        // last 5 mean 107, previous 5 mean 102
        let growth = window_growth(&data, 5).unwrap();
        assert!((growth - (107.0 / 102.0 - 1.0) / 5.0).abs() < 1e-12);
        assert!(window_growth(&data, 20).is_none());
    }

    #[test]
    fn test_linear_series_continues_trend() {
        let closes = linear(100);
        let mut rng = StdRng::seed_from_u64(11);
        let forecast = simulate_lstm(&closes, 30, &mut rng);
        assert_eq!(forecast.len(), 30);

        let expected = 200.0;
        assert!((forecast[0] - expected).abs() / expected < 0.03, "got {}", forecast[0]);
        assert!(forecast[29] > closes[99]);
    }

    #[test]
    fn test_signals_on_linear_series() {
        let signals = TrendSignals::from_history(&linear(100));
        assert!(signals.short_trend > 0.0);
        assert!(signals.long_trend > 0.0);
        assert!(signals.volatility < 0.001);
        assert!(signals.cycle.abs() <= LSTM_CYCLE_AMPLITUDE);
    }

    #[test]
    fn test_short_history_degrades_without_panicking() {
        let mut rng = StdRng::seed_from_u64(5);
        for n in [1, 3, 9, 15, 39] {
            let forecast = simulate_lstm(&linear(n), 10, &mut rng);
            assert_eq!(forecast.len(), 10);
            assert!(forecast.iter().all(|v| v.is_finite() && *v > 0.0));
        }
        assert_eq!(simulate_lstm(&[], 4, &mut rng), vec![0.0; 4]);
    }

    #[test]
    fn test_flat_series_stays_near_flat() {
        let closes = vec![50.0; 60];
        let mut rng = StdRng::seed_from_u64(2);
        let forecast = simulate_lstm(&closes, 5, &mut rng);
        // only the cycle term moves a flat series
        assert!(forecast.iter().all(|v| (v - 50.0).abs() / 50.0 < 0.02));
    }
}
