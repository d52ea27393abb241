//! 기술적 지표 모듈.
//!
//! 트레이딩 전략과 피처 파이프라인에서 사용되는 기술적 지표를 제공합니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA**: 단순 이동평균 (Simple Moving Average)
//! - **EMA**: 지수 이동평균 (Exponential Moving Average)
//! - **MACD**: 이동평균 수렴/확산 (Moving Average Convergence Divergence)
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI**: 상대강도지수 (Relative Strength Index)
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **Bollinger Bands**: 볼린저 밴드
//! - **ATR**: 평균 실제 범위 (Average True Range)
//!
//! 모든 지표는 `f64` 시계열을 받아 `Vec<Option<f64>>`를 돌려줍니다.
//! 계산에 필요한 데이터가 부족한 워밍업 구간은 `None`입니다.

pub mod momentum;
pub mod trend;
pub mod volatility;

use thiserror::Error;

pub use momentum::rsi;
pub use trend::{ema, macd, sma, MacdParams, MacdResult};
pub use volatility::{atr, bollinger_bands, BollingerBandsParams, BollingerBandsResult};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 데이터 부족 오류
    #[error("Insufficient data: required {required}, provided {provided}")]
    InsufficientData {
        /// 필요한 데이터 수
        required: usize,
        /// 제공된 데이터 수
        provided: usize,
    },

    /// 잘못된 파라미터
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 Result 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 기간 파라미터가 유효한지 확인합니다.
pub(crate) fn check_period(period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "period must be positive".to_string(),
        ));
    }
    Ok(())
}

/// 입력 길이가 기간 이상인지 확인합니다.
pub(crate) fn check_len(values: &[f64], required: usize) -> IndicatorResult<()> {
    if values.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            provided: values.len(),
        });
    }
    Ok(())
}
