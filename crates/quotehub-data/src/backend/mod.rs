//! 소스 백엔드 인터페이스.
//!
//! 외부 시장 데이터 공급자는 이 trait 하나만 구현하면 됩니다. 백엔드는
//! 소스 이름으로 다운로더에 등록되며, 요청의 `source` 라벨로 해석됩니다.

pub mod binance;

use async_trait::async_trait;

use quotehub_core::types::{Candle, Window};

use crate::error::Result;

pub use binance::BinanceBackend;

/// 시장 데이터 소스 백엔드 trait.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct MyExchangeBackend {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl SourceBackend for MyExchangeBackend {
///     fn name(&self) -> &str {
///         "my_exchange"
///     }
///
///     async fn fetch(
///         &self,
///         symbols: &[&str],
///         window: &Window,
///         interval: &str,
///     ) -> Result<Vec<Candle>> {
///         // API 호출 및 변환
///     }
/// }
/// ```
#[async_trait]
pub trait SourceBackend: Send + Sync {
    /// 백엔드 이름. 다운로더 등록 키이자 캔들의 `source` 라벨입니다.
    fn name(&self) -> &str;

    /// 호출당 최대 레코드 수. `None`이면 제한 없음.
    ///
    /// 한도가 있으면 다운로더가 요청 범위를 이 한도에 맞춰 분할합니다.
    fn batch_limit(&self) -> Option<usize> {
        None
    }

    /// 주어진 심볼들의 OHLCV 캔들을 조회합니다.
    ///
    /// 해당 구간에 데이터가 없으면 빈 벡터를 반환합니다. 일시적 네트워크
    /// 실패는 `DataError::Fetch`로 반환하며, 다운로더는 이를 "이 구간에
    /// 데이터 없음"으로 취급하고 계속 진행합니다.
    ///
    /// # Errors
    ///
    /// - `DataError::Fetch`: 네트워크/HTTP 오류
    /// - `DataError::Parse`: 응답 본문 해석 실패
    async fn fetch(&self, symbols: &[&str], window: &Window, interval: &str)
        -> Result<Vec<Candle>>;
}
