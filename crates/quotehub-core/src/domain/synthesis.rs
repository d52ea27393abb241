//! 합성 상품(synthetic instrument) 생성 인터페이스.
//!
//! 기존 시장 데이터에서 새 상품(스프레드, 비율 등)을 만들어내는 생성기의
//! 공통 인터페이스입니다. 생성기는 필요한 기초 심볼을 선언하고, 기초
//! 시계열이 모두 주어지면 합성 캔들 시계열을 돌려줍니다.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::Candle;

/// 합성 상품 생성 오류.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 필요한 기초 심볼 누락
    #[error("Missing required symbol: {0}")]
    MissingSymbol(String),

    /// 기초 시계열이 비어 있음
    #[error("Empty constituent series: {0}")]
    EmptySeries(String),

    /// 생성 실패
    #[error("Generation failed: {0}")]
    Generation(String),
}

/// 합성 상품 생성기 trait.
pub trait InstrumentGenerator: Send + Sync {
    /// 생성되는 합성 심볼 이름.
    fn symbol(&self) -> &str;

    /// 생성에 필요한 기초 심볼 목록.
    fn required_symbols(&self) -> Vec<String>;

    /// 심볼별 시간순 캔들 시계열로부터 합성 시계열을 생성합니다.
    ///
    /// # Errors
    ///
    /// - `SynthesisError::MissingSymbol`: 필요한 기초 심볼이 `data`에 없음
    /// - `SynthesisError::EmptySeries`: 기초 시계열이 비어 있음
    fn generate(
        &self,
        data: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Candle>, SynthesisError>;
}
