//! 공통 타입 정의.

pub mod candle;
pub mod interval;
pub mod window;

pub use candle::{Candle, CandleKey};
pub use interval::{interval_duration, Interval, DEFAULT_INTERVAL};
pub use window::Window;
