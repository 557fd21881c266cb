pub mod candle_buffer;
pub mod file_source;
pub mod source;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle_buffer::{Candle, CandleBuffer, CandleKey};
pub use file_source::JsonFileSource;
pub use source::{validate_series, SeriesSource};
