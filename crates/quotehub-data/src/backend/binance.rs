//! Binance 공개 API 백엔드.
//!
//! 인증 없이 사용할 수 있는 `/api/v3/klines` 엔드포인트로 OHLCV 캔들을
//! 수집합니다. Binance는 호출당 최대 1000개의 캔들을 돌려주므로
//! `batch_limit`으로 이 한도를 알립니다.
//!
//! 간격 라벨("1m".."1M")은 Binance 표기와 동일하여 변환 없이 전달합니다.

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use quotehub_core::config::SourceConfig;
use quotehub_core::types::{Candle, Window};

use crate::backend::SourceBackend;
use crate::error::{DataError, Result};

/// Binance REST API 기본 URL.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance API의 호출당 캔들 한도.
const MAX_CANDLES_PER_REQUEST: usize = 1000;

/// 백엔드 등록용 소스 이름.
const SOURCE_NAME: &str = "binance";

/// Binance 시장 데이터 백엔드.
#[derive(Clone)]
pub struct BinanceBackend {
    client: reqwest::Client,
    base_url: String,
    batch_limit: usize,
}

impl BinanceBackend {
    /// 기본 설정으로 백엔드를 생성합니다.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_limit: MAX_CANDLES_PER_REQUEST,
        }
    }

    /// 기본 URL을 교체합니다 (프록시/테스트 서버용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 소스 설정을 반영하여 백엔드를 생성합니다.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DataError::Configuration(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            batch_limit: config.batch_limit.unwrap_or(MAX_CANDLES_PER_REQUEST),
        })
    }

    /// 단일 심볼의 캔들을 조회합니다.
    async fn fetch_symbol(
        &self,
        symbol: &str,
        window: &Window,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let start_ms = window.start.timestamp_millis().to_string();
        let end_ms = window.end.timestamp_millis().to_string();
        let limit = self.batch_limit.to_string();

        debug!(symbol, interval, %window, "Binance API 호출");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("startTime", start_ms.as_str()),
                ("endTime", end_ms.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DataError::Fetch(format!("Binance request failed ({}): {}", symbol, e)))?;

        let response = response
            .error_for_status()
            .map_err(|e| DataError::Fetch(format!("Binance API error ({}): {}", symbol, e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| DataError::Fetch(format!("Binance body read failed ({}): {}", symbol, e)))?;

        parse_klines(symbol, interval, &body)
    }
}

impl Default for BinanceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceBackend for BinanceBackend {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn batch_limit(&self) -> Option<usize> {
        Some(self.batch_limit)
    }

    async fn fetch(
        &self,
        symbols: &[&str],
        window: &Window,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let mut candles = Vec::new();
        for symbol in symbols {
            candles.extend(self.fetch_symbol(symbol, window, interval).await?);
        }
        Ok(candles)
    }
}

/// klines 응답 본문을 캔들로 변환합니다.
///
/// 응답은 행 배열이며 각 행은
/// `[open_time_ms, open, high, low, close, volume, close_time_ms, ...]`
/// 형태입니다. 가격/거래량은 문자열로 인코딩되어 있습니다.
fn parse_klines(symbol: &str, interval: &str, body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| DataError::Parse(format!("Invalid klines payload ({}): {}", symbol, e)))?;

    rows.iter()
        .map(|row| {
            let open_time_ms = row
                .first()
                .and_then(Value::as_i64)
                .ok_or_else(|| DataError::Parse(format!("Missing open time ({})", symbol)))?;
            let ts = DateTime::from_timestamp_millis(open_time_ms)
                .ok_or_else(|| DataError::Parse(format!("Invalid open time ({})", symbol)))?;

            let field = |idx: usize, name: &str| -> Result<f64> {
                row.get(idx)
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| {
                        DataError::Parse(format!("Invalid {} field ({})", name, symbol))
                    })
            };

            Ok(Candle::new(
                symbol,
                ts,
                interval,
                SOURCE_NAME,
                field(1, "open")?,
                field(2, "high")?,
                field(3, "low")?,
                field(4, "close")?,
                field(5, "volume")?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_klines() {
        let body = r#"[
            [1704067200000, "42283.58", "42554.57", "42261.02", "42475.23", "1271.68", 1704070799999, "53900000.0", 48292, "612.1", "25900000.0", "0"],
            [1704070800000, "42475.23", "42786.77", "42444.00", "42613.14", "980.12", 1704074399999, "41800000.0", 39121, "509.8", "21700000.0", "0"]
        ]"#;

        let candles = parse_klines("BTCUSDT", "1h", body).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].symbol, "BTCUSDT");
        assert_eq!(candles[0].source, "binance");
        assert_eq!(candles[0].interval, "1h");
        assert_eq!(
            candles[0].ts,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(candles[0].open, 42283.58);
        assert_eq!(candles[1].close, 42613.14);
    }

    #[test]
    fn test_parse_klines_empty_payload() {
        let candles = parse_klines("BTCUSDT", "1h", "[]").unwrap();
        assert!(candles.is_empty());
    }

    #[test]
    fn test_parse_klines_rejects_malformed_rows() {
        // 가격이 문자열이 아닌 행
        let body = r#"[[1704067200000, 42283.58, "1", "1", "1", "1"]]"#;
        let err = parse_klines("BTCUSDT", "1h", body).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));

        let err = parse_klines("BTCUSDT", "1h", "not json").unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn test_backend_metadata() {
        let backend = BinanceBackend::new();
        assert_eq!(backend.name(), "binance");
        assert_eq!(backend.batch_limit(), Some(1000));
    }

    #[test]
    fn test_from_config_overrides() {
        let config = SourceConfig {
            enabled: true,
            base_url: Some("http://localhost:9000".to_string()),
            batch_limit: Some(100),
            request_timeout_secs: 5,
        };

        let backend = BinanceBackend::from_config(&config).unwrap();
        assert_eq!(backend.base_url, "http://localhost:9000");
        assert_eq!(backend.batch_limit(), Some(100));
    }
}
