use rand::Rng;

use super::policy::{Computed, ACCURACY_FALLBACK, ACCURACY_MAPE_CAP, ACCURACY_MAX, BACKTEST_HOLDOUT};
use super::prediction_arima::simulate_arima;
use super::prediction_lstm::simulate_lstm;
use super::types::{AccuracyMetrics, ModelInsight, ModelKind};

pub fn calculate_model_accuracy(actual: &[f64], predicted: &[f64]) -> AccuracyMetrics {
    calculate_model_accuracy_checked(actual, predicted).value()
}

/// Position-wise MAPE/RMSE over pairs with a non-zero, finite actual and a
/// finite prediction. Falls back to fixed metrics when no pair qualifies.
pub fn calculate_model_accuracy_checked(actual: &[f64], predicted: &[f64]) -> Computed<AccuracyMetrics> {
    let mut abs_pct_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut count = 0usize;

    for (&a, &p) in actual.iter().zip(predicted) {
        if a == 0.0 || !a.is_finite() || !p.is_finite() {
            continue;
        }
        let err = a - p;
        abs_pct_sum += (err / a).abs();
        sq_sum += err * err;
        count += 1;
    }

    if count == 0 {
        return Computed::InsufficientData(ACCURACY_FALLBACK);
    }

    let mape = abs_pct_sum / count as f64 * 100.0;
    let rmse = (sq_sum / count as f64).sqrt();
    if !mape.is_finite() || !rmse.is_finite() {
        return Computed::InsufficientData(ACCURACY_FALLBACK);
    }

    let accuracy = (100.0 - mape.min(ACCURACY_MAPE_CAP)).min(ACCURACY_MAX);
    Computed::Value(AccuracyMetrics { accuracy, mape, rmse })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestReport {
    pub arima: Computed<AccuracyMetrics>,
    pub lstm: Computed<AccuracyMetrics>,
}

/// Re-runs both simulators on everything but the last 20 closes and scores
/// them against those 20.
pub fn backtest_models<R: Rng + ?Sized>(closes: &[f64], rng: &mut R) -> BacktestReport {
    let n = closes.len();
    if n <= BACKTEST_HOLDOUT {
        return BacktestReport {
            arima: Computed::InsufficientData(ACCURACY_FALLBACK),
            lstm: Computed::InsufficientData(ACCURACY_FALLBACK),
        };
    }

    let (train, holdout) = closes.split_at(n - BACKTEST_HOLDOUT);
    let arima_forecast = simulate_arima(train, holdout.len(), rng);
    let lstm_forecast = simulate_lstm(train, holdout.len(), rng);

    BacktestReport {
        arima: calculate_model_accuracy_checked(holdout, &arima_forecast),
        lstm: calculate_model_accuracy_checked(holdout, &lstm_forecast),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn build_model_insight(kind: ModelKind, metrics: AccuracyMetrics) -> ModelInsight {
    let (strengths, weaknesses, best_for) = match kind {
        ModelKind::Arima => (
            strings(&[
                "Captures short-term autocorrelation in price changes",
                "Stable on range-bound, mean-reverting series",
                "Cheap to compute",
            ]),
            strings(&[
                "Linear structure misses regime changes",
                "Uncertainty compounds quickly over long horizons",
            ]),
            "Short-horizon forecasts on liquid, range-bound assets",
        ),
        ModelKind::Lstm => (
            strings(&[
                "Blends short and long trend momentum",
                "Models cyclical behaviour",
                "Adapts noise to recent volatility",
            ]),
            strings(&[
                "Needs at least 40 days of history",
                "Can overshoot when a trend reverses",
            ]),
            "Trending assets over multi-week horizons",
        ),
    };

    ModelInsight {
        model: kind.name().to_string(),
        accuracy: metrics.accuracy,
        mape: metrics.mape,
        rmse: metrics.rmse,
        strengths,
        weaknesses,
        best_for: best_for.to_string(),
        confidence_score: ((metrics.accuracy / 10.0).clamp(0.0, 10.0) * 10.0).round() / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_all_zero_actuals_use_defaults() {
        let metrics = calculate_model_accuracy(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]);
        assert_eq!(metrics, AccuracyMetrics { accuracy: 80.0, mape: 20.0, rmse: 5.0 });
        assert!(calculate_model_accuracy_checked(&[], &[]).is_fallback());
    }

    #[test]
    fn test_perfect_prediction_is_capped() {
        let data = [10.0, 11.0, 12.5];
        let metrics = calculate_model_accuracy(&data, &data);
        assert_eq!(metrics.accuracy, 99.0);
        assert_eq!(metrics.mape, 0.0);
        assert_eq!(metrics.rmse, 0.0);
    }

    #[test]
    fn test_known_errors() {
        let metrics = calculate_model_accuracy(&[100.0, 200.0], &[110.0, 180.0]);
        // |10/100| and |20/200| -> 10%
        assert_relative_eq!(metrics.mape, 10.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.rmse, (250.0f64).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(metrics.accuracy, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_pairs_are_skipped() {
        let actual = [0.0, 100.0, f64::NAN, 50.0, 20.0];
        let predicted = [5.0, 100.0, 3.0, f64::INFINITY];
        let metrics = calculate_model_accuracy(&actual, &predicted);
        assert_eq!(metrics.mape, 0.0);
        assert_eq!(metrics.accuracy, 99.0);
    }

    #[test]
    fn test_huge_error_keeps_accuracy_positive() {
        let metrics = calculate_model_accuracy(&[1.0], &[1000.0]);
        assert_eq!(metrics.accuracy, 1.0);
        assert!(metrics.mape > 99.0);
    }

    #[test]
    fn test_backtest_short_history_falls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let report = backtest_models(&[100.0; 20], &mut rng);
        assert!(report.arima.is_fallback());
        assert!(report.lstm.is_fallback());
    }

    #[test]
    fn test_backtest_on_flat_series() {
        let mut rng = StdRng::seed_from_u64(4);
        let report = backtest_models(&[100.0; 90], &mut rng);
        let arima = report.arima.value();
        let lstm = report.lstm.value();
        assert!(!report.arima.is_fallback());
        assert!(arima.accuracy >= 1.0 && arima.accuracy <= 99.0);
        assert!(arima.mape.is_finite() && arima.rmse.is_finite());
        // only the cycle term moves a flat series
        assert!(lstm.accuracy > 90.0 && lstm.accuracy <= 99.0);
    }

    #[test]
    fn test_model_insight() {
        let insight = build_model_insight(
            ModelKind::Lstm,
            AccuracyMetrics { accuracy: 87.46, mape: 12.54, rmse: 3.2 },
        );
        assert_eq!(insight.model, "LSTM");
        assert_eq!(insight.confidence_score, 8.7);
        assert!(!insight.strengths.is_empty());
        assert!(!insight.weaknesses.is_empty());
    }
}
