use serde::{Deserialize, Serialize};

use super::policy::{finite_or, CI_HORIZON_GROWTH, DEFAULT_VOLATILITY, ENSEMBLE_VOLATILITY_FACTOR};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ConfidenceBand {
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn width(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }
}

/// Horizon-widening band: `u_i = volatility * sqrt(1 + 0.5 i)`, with
/// `lower_i = p_i (1 - u_i)` clamped at zero and `upper_i = p_i (1 + u_i)`.
pub fn build_confidence_band(predicted: &[f64], volatility: f64) -> ConfidenceBand {
    let volatility = finite_or(volatility, DEFAULT_VOLATILITY).abs();
    let mut band = ConfidenceBand {
        lower: Vec::with_capacity(predicted.len()),
        upper: Vec::with_capacity(predicted.len()),
    };

    for (i, &p) in predicted.iter().enumerate() {
        let p = finite_or(p, 0.0).max(0.0);
        let uncertainty = volatility * (1.0 + i as f64 * CI_HORIZON_GROWTH).sqrt();
        band.lower.push((p * (1.0 - uncertainty)).max(0.0));
        band.upper.push(finite_or(p * (1.0 + uncertainty), p));
    }

    band
}

/// Elementwise mean of the two model forecasts, up to the shorter one.
pub fn combine_forecasts(arima: &[f64], lstm: &[f64]) -> Vec<f64> {
    arima.iter().zip(lstm).map(|(a, l)| (a + l) / 2.0).collect()
}

pub fn ensemble_volatility(volatility: f64) -> f64 {
    volatility * ENSEMBLE_VOLATILITY_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_band_brackets_prediction() {
        let predicted = [100.0, 101.5, 99.0, 120.0, 0.0];
        for vol in [0.0, 0.05, 0.2, 0.9, 3.0] {
            let band = build_confidence_band(&predicted, vol);
            for (i, &p) in predicted.iter().enumerate() {
                assert!(band.lower[i] <= p && p <= band.upper[i]);
                assert!(band.lower[i] >= 0.0);
            }
        }
    }

    #[test]
    fn test_band_width_grows_with_horizon() {
        let predicted = vec![50.0; 40];
        for vol in [0.1, 0.4, 2.5] {
            let band = build_confidence_band(&predicted, vol);
            for i in 1..band.len() {
                assert!(band.width(i) >= band.width(i - 1));
            }
        }
    }

    #[test]
    fn test_first_step_uses_base_volatility() {
        let band = build_confidence_band(&[200.0, 200.0], 0.1);
        assert_relative_eq!(band.lower[0], 180.0, epsilon = 1e-9);
        assert_relative_eq!(band.upper[0], 220.0, epsilon = 1e-9);
        let u1 = 0.1 * 1.5f64.sqrt();
        assert_relative_eq!(band.upper[1], 200.0 * (1.0 + u1), epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_volatility_uses_default() {
        let band = build_confidence_band(&[10.0], f64::NAN);
        assert_relative_eq!(band.upper[0], 10.0 * (1.0 + DEFAULT_VOLATILITY), epsilon = 1e-12);
    }

    #[test]
    fn test_combine_forecasts() {
        assert_eq!(combine_forecasts(&[10.0, 20.0, 30.0], &[20.0, 40.0]), vec![15.0, 30.0]);
        assert_relative_eq!(ensemble_volatility(0.2), 0.18, epsilon = 1e-12);
    }
}
