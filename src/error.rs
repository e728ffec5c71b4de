use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictionError {
    /// The price provider has no bars for this ticker.
    #[error("no historical data for ticker {ticker}")]
    NoData { ticker: String },

    #[error("invalid prediction request: {0}")]
    InvalidRequest(String),

    #[error("price provider error: {0}")]
    Provider(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictionError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, PredictionError::NoData { .. })
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;
