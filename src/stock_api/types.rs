use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar as returned by a price provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<f64>,
}

/// A historical bar annotated with retrospective model output, or a future
/// bar carrying only model output (`actual == 0.0`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub actual: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arima_predict: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstm_predict: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arima_lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arima_upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstm_lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstm_upper: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    pub accuracy: f64,
    pub mape: f64,
    pub rmse: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Arima,
    Lstm,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Arima => "ARIMA",
            ModelKind::Lstm => "LSTM",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelInsight {
    pub model: String,
    pub accuracy: f64,
    pub mape: f64,
    pub rmse: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub best_for: String,
    pub confidence_score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelInsights {
    pub arima: ModelInsight,
    pub lstm: ModelInsight,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct MacdSnapshot {
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TechnicalSnapshot {
    pub rsi: f64,
    pub macd: MacdSnapshot,
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    LargePredictedMove,
    Overbought,
    Oversold,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub description: String,
    pub value: f64,
}

/// How much of the result came from real computation versus fallbacks.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Full,
    Partial,
    Insufficient,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Insights {
    pub trend: Trend,
    pub confidence: f64,
    pub change_percent: f64,
    pub volatility: f64,
    pub support: f64,
    pub resistance: f64,
    pub rsi: f64,
    pub macd: MacdSnapshot,
    pub next_key_date: Option<NaiveDate>,
    pub anomalies: Vec<Anomaly>,
    pub data_quality: DataQuality,
    /// Names of sub-computations that substituted a fallback value.
    pub fallbacks: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub ticker: String,
    pub historical_data: Vec<PredictionPoint>,
    pub predictions: Vec<PredictionPoint>,
    pub insights: Insights,
    pub model_insights: ModelInsights,
}
