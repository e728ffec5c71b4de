pub mod backtest;
pub mod confidence;
pub mod data;
pub mod policy;
pub mod prediction;
pub mod prediction_arima;
pub mod prediction_lstm;
pub mod technical_indicators;
pub mod types;
pub mod utils;

pub use backtest::*;
pub use confidence::*;
pub use data::*;
pub use policy::Computed;
pub use prediction::*;
pub use prediction_arima::*;
pub use prediction_lstm::*;
pub use technical_indicators::*;
pub use types::*;
