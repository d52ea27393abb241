//! OHLCV 캔들 레코드 정의.
//!
//! 이 모듈은 캐시와 다운로더 전반에서 사용되는 단일 관측값 타입을 정의합니다.
//! 캔들은 (symbol, ts, interval, source) 튜플로 고유하게 식별되며,
//! 같은 키로 다시 저장하면 마지막 쓰기가 이전 값을 대체합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 하나의 OHLCV 관측값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 자산 식별자 (예: "BTCUSDT", "AAPL")
    pub symbol: String,
    /// 캔들 시작 시간 (초 단위 해상도)
    pub ts: DateTime<Utc>,
    /// 간격 라벨 (예: "1h", "1d")
    pub interval: String,
    /// 데이터 소스 라벨 (예: "binance")
    pub source: String,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량
    pub volume: f64,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        ts: DateTime<Utc>,
        interval: impl Into<String>,
        source: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            ts,
            interval: interval.into(),
            source: source.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 고유 키 (ts, symbol, interval, source)를 반환합니다.
    ///
    /// 키 정렬 순서는 시간 우선이므로 `BTreeMap<CandleKey, _>`에 넣으면
    /// 시간순으로 정렬된 시계열을 얻습니다.
    pub fn key(&self) -> CandleKey {
        CandleKey {
            ts_epoch: self.ts.timestamp(),
            symbol: self.symbol.clone(),
            interval: self.interval.clone(),
            source: self.source.clone(),
        }
    }

    /// 캔들 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 대표가(고가+저가+종가 평균)를 반환합니다.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// 캔들 고유 키.
///
/// 파생된 `Ord`는 필드 선언 순서를 따르므로 시간 → 심볼 → 간격 → 소스
/// 순으로 정렬됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandleKey {
    /// 에포크 초 단위 타임스탬프
    pub ts_epoch: i64,
    /// 자산 식별자
    pub symbol: String,
    /// 간격 라벨
    pub interval: String,
    /// 데이터 소스 라벨
    pub source: String,
}
