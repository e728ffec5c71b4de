//! Synthetic price-prediction engine: ARIMA-like and LSTM-like forecast
//! simulation, confidence bands, technical indicators and backtested model
//! accuracy over a ticker's daily close history.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod stock_api;

pub use cache::{CacheKey, PredictionCache};
pub use config::EngineConfig;
pub use database::Database;
pub use error::{PredictionError, Result};
pub use stock_api::*;
