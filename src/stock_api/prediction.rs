use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::backtest::{backtest_models, build_model_insight};
use super::confidence::{build_confidence_band, combine_forecasts, ensemble_volatility, ConfidenceBand};
use super::data::HistoricalPriceProvider;
use super::policy::{
    finite_or, ANNOTATED_HISTORY, ANNOTATION_NOISE_ENSEMBLE, ANNOTATION_NOISE_MODEL, BASE_CONFIDENCE,
    LARGE_MOVE_PCT, LSTM_MIN_POINTS, MAX_CONFIDENCE_PENALTY, RSI_OVERBOUGHT, RSI_OVERSOLD,
    TREND_THRESHOLD_PCT,
};
use super::prediction_arima::simulate_arima;
use super::prediction_lstm::simulate_lstm;
use super::technical_indicators::calculate_indicators_checked;
use super::types::{
    Anomaly, AnomalyKind, DataQuality, Insights, ModelInsights, ModelKind, PredictionPoint,
    PredictionResult, PricePoint, Trend,
};
use super::utils::{
    annualized_volatility, calculate_returns, next_business_days, percent_change, validate_data,
};
use crate::cache::{CacheKey, PredictionCache};
use crate::config::EngineConfig;
use crate::error::{PredictionError, Result};

/// Produces ARIMA-like, LSTM-like and ensemble forecasts for a ticker and
/// caches the assembled result per `(ticker, lookback, forecast)`.
pub struct PredictionEngine<P> {
    provider: P,
    cache: PredictionCache,
    config: EngineConfig,
    rng: Mutex<StdRng>,
}

impl<P: HistoricalPriceProvider> PredictionEngine<P> {
    pub fn new(provider: P, config: EngineConfig) -> Self {
        let cache = PredictionCache::from_config(&config);
        Self::with_cache(provider, config, cache)
    }

    pub fn with_cache(provider: P, config: EngineConfig, cache: PredictionCache) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        PredictionEngine {
            provider,
            cache,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &PredictionCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forecast for `ticker`; `None` horizons use the configured defaults
    /// (90 days of history, 30 days ahead).
    pub async fn predict(
        &self,
        ticker: &str,
        lookback_days: Option<usize>,
        forecast_days: Option<usize>,
    ) -> Result<Arc<PredictionResult>> {
        let ticker = ticker.trim();
        let lookback_days = lookback_days.unwrap_or(self.config.default_lookback_days);
        let forecast_days = forecast_days.unwrap_or(self.config.default_forecast_days);

        if ticker.is_empty() {
            return Err(PredictionError::InvalidRequest("ticker must not be empty".to_string()));
        }
        if lookback_days == 0 || forecast_days == 0 {
            return Err(PredictionError::InvalidRequest(format!(
                "lookback_days and forecast_days must be positive (got {} and {})",
                lookback_days, forecast_days
            )));
        }

        let key = CacheKey::new(ticker, lookback_days, forecast_days);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %key, "prediction cache hit");
            return Ok(hit);
        }

        info!(ticker, lookback_days, forecast_days, "computing prediction");
        let bars = self.provider.get_historical_bars(ticker, lookback_days).await?;
        if bars.is_empty() {
            warn!(ticker, "price provider returned no bars");
            return Err(PredictionError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let result = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            build_prediction(ticker, &bars, forecast_days, &mut *rng)
        };

        if !result.insights.fallbacks.is_empty() {
            debug!(ticker, fallbacks = ?result.insights.fallbacks, "prediction used fallback values");
        }

        let result = Arc::new(result);
        self.cache.insert(key, Arc::clone(&result)).await;
        Ok(result)
    }

    /// Invalidates cached results for one ticker, or all of them.
    pub async fn clear_cache(&self, ticker: Option<&str>) {
        match ticker {
            Some(t) => {
                let removed = self.cache.invalidate_ticker(t.trim()).await;
                info!(ticker = t, removed, "cleared cached predictions");
            }
            None => {
                self.cache.invalidate_all().await;
                info!("cleared all cached predictions");
            }
        }
    }
}

/// Assembles a full prediction from already-fetched bars. Pure apart from `rng`.
/// Returns empty series and default insights for empty `bars`.
pub fn build_prediction<R: Rng + ?Sized>(
    ticker: &str,
    bars: &[PricePoint],
    forecast_days: usize,
    rng: &mut R,
) -> PredictionResult {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    // the simulators continue from the last valid close, so trend is measured from it too
    let valid = validate_data(&closes);
    let last_close = valid.last().copied().unwrap_or(0.0);
    let mut fallbacks: Vec<String> = Vec::new();

    let returns = calculate_returns(&valid);
    if returns.is_empty() {
        fallbacks.push("volatility".to_string());
    }
    let volatility = annualized_volatility(&returns);

    let arima = simulate_arima(&closes, forecast_days, rng);
    let lstm = simulate_lstm(&closes, forecast_days, rng);
    let combined = combine_forecasts(&arima, &lstm);

    let arima_band = build_confidence_band(&arima, volatility);
    let lstm_band = build_confidence_band(&lstm, volatility);
    let combined_band = build_confidence_band(&combined, ensemble_volatility(volatility));

    let indicators = calculate_indicators_checked(&closes);
    fallbacks.extend(indicators.fallbacks().into_iter().map(String::from));
    let technical = indicators.snapshot();

    let historical_data = annotate_history(bars, rng);

    let predictions = match bars.last() {
        Some(last) => future_points(last.date, &arima, &lstm, &combined, &arima_band, &lstm_band, &combined_band),
        None => Vec::new(),
    };

    let backtest = backtest_models(&closes, rng);
    if backtest.arima.is_fallback() {
        fallbacks.push("arima_accuracy".to_string());
    }
    if backtest.lstm.is_fallback() {
        fallbacks.push("lstm_accuracy".to_string());
    }

    let final_forecast = combined.last().copied().unwrap_or(last_close);
    let change_percent = percent_change(last_close, final_forecast);
    let trend = classify_trend(change_percent);
    let confidence = trend_confidence(change_percent);
    let anomalies = detect_anomalies(change_percent, technical.rsi);

    let data_quality = if closes.len() < LSTM_MIN_POINTS {
        DataQuality::Insufficient
    } else if !fallbacks.is_empty() {
        DataQuality::Partial
    } else {
        DataQuality::Full
    };

    PredictionResult {
        ticker: ticker.to_string(),
        historical_data,
        insights: Insights {
            trend,
            confidence,
            change_percent,
            volatility,
            support: technical.support,
            resistance: technical.resistance,
            rsi: technical.rsi,
            macd: technical.macd,
            next_key_date: next_key_date(last_close, &predictions),
            anomalies,
            data_quality,
            fallbacks,
        },
        predictions,
        model_insights: ModelInsights {
            arima: build_model_insight(ModelKind::Arima, backtest.arima.value()),
            lstm: build_model_insight(ModelKind::Lstm, backtest.lstm.value()),
        },
    }
}

/// Historical bars as prediction points; the last 10 carry illustrative
/// retrospective predictions (actual perturbed by a small random percentage).
fn annotate_history<R: Rng + ?Sized>(bars: &[PricePoint], rng: &mut R) -> Vec<PredictionPoint> {
    let annotate_from = bars.len().saturating_sub(ANNOTATED_HISTORY);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let actual = finite_or(bar.close, 0.0);
            let mut point = PredictionPoint {
                date: bar.date,
                actual,
                ..Default::default()
            };
            if i >= annotate_from {
                let mut perturb = |range: f64| actual * (1.0 + rng.gen_range(-range..=range));
                point.predicted = Some(perturb(ANNOTATION_NOISE_ENSEMBLE));
                point.arima_predict = Some(perturb(ANNOTATION_NOISE_MODEL));
                point.lstm_predict = Some(perturb(ANNOTATION_NOISE_MODEL));
            }
            point
        })
        .collect()
}

fn future_points(
    last_date: NaiveDate,
    arima: &[f64],
    lstm: &[f64],
    combined: &[f64],
    arima_band: &ConfidenceBand,
    lstm_band: &ConfidenceBand,
    combined_band: &ConfidenceBand,
) -> Vec<PredictionPoint> {
    next_business_days(last_date, combined.len())
        .into_iter()
        .enumerate()
        .map(|(i, date)| PredictionPoint {
            date,
            actual: 0.0,
            predicted: Some(combined[i]),
            arima_predict: Some(arima[i]),
            lstm_predict: Some(lstm[i]),
            lower: Some(combined_band.lower[i]),
            upper: Some(combined_band.upper[i]),
            arima_lower: Some(arima_band.lower[i]),
            arima_upper: Some(arima_band.upper[i]),
            lstm_lower: Some(lstm_band.lower[i]),
            lstm_upper: Some(lstm_band.upper[i]),
        })
        .collect()
}

pub fn classify_trend(change_percent: f64) -> Trend {
    if change_percent > TREND_THRESHOLD_PCT {
        Trend::Up
    } else if change_percent < -TREND_THRESHOLD_PCT {
        Trend::Down
    } else {
        Trend::Neutral
    }
}

/// `85 - min(|change%|, 15)`.
pub fn trend_confidence(change_percent: f64) -> f64 {
    BASE_CONFIDENCE - change_percent.abs().min(MAX_CONFIDENCE_PENALTY)
}

pub fn detect_anomalies(change_percent: f64, rsi: f64) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if change_percent.abs() > LARGE_MOVE_PCT {
        let direction = if change_percent > 0.0 { "rise" } else { "drop" };
        anomalies.push(Anomaly {
            kind: AnomalyKind::LargePredictedMove,
            description: format!("Predicted {} of {:.1}% over the forecast horizon", direction, change_percent.abs()),
            value: change_percent,
        });
    }
    if rsi > RSI_OVERBOUGHT {
        anomalies.push(Anomaly {
            kind: AnomalyKind::Overbought,
            description: format!("RSI {:.1} is above {}", rsi, RSI_OVERBOUGHT),
            value: rsi,
        });
    }
    if rsi < RSI_OVERSOLD {
        anomalies.push(Anomaly {
            kind: AnomalyKind::Oversold,
            description: format!("RSI {:.1} is below {}", rsi, RSI_OVERSOLD),
            value: rsi,
        });
    }

    anomalies
}

/// Date of the largest single-step ensemble move; the first step is measured
/// against the last close.
fn next_key_date(last_close: f64, predictions: &[PredictionPoint]) -> Option<NaiveDate> {
    let mut previous = last_close;
    let mut best: Option<(NaiveDate, f64)> = None;

    for point in predictions {
        let value = point.predicted.unwrap_or(previous);
        let step = (value - previous).abs();
        if best.map_or(true, |(_, b)| step > b) {
            best = Some((point.date, step));
        }
        previous = value;
    }

    best.map(|(date, _)| date)
}
