//! 합성 상품 생성기 구현.
//!
//! 기존 상품의 시계열을 결합해 새 상품을 만듭니다:
//! - `SpreadGenerator`: 두 상품의 차 (예: BTC - ETH)
//! - `RatioGenerator`: 두 상품의 비율 (예: BTC / ETH)
//! - `WeightedCombinationGenerator`: 가중 합 (예: 0.5·BTC + 0.3·ETH - 0.2·SOL)
//!
//! 기초 시계열의 타임스탬프 교집합에서만 합성 캔들이 생성됩니다.
//! 거래량은 첫 번째 기초 상품의 값을 사용합니다.

use std::collections::BTreeMap;

use quotehub_core::domain::{InstrumentGenerator, SynthesisError};
use quotehub_core::types::Candle;

/// 시계열을 타임스탬프로 인덱싱합니다.
fn index_by_ts(candles: &[Candle]) -> BTreeMap<i64, &Candle> {
    candles.iter().map(|c| (c.ts.timestamp(), c)).collect()
}

/// 필요한 기초 시계열을 꺼냅니다.
fn constituent<'a>(
    data: &'a BTreeMap<String, Vec<Candle>>,
    symbol: &str,
) -> Result<&'a [Candle], SynthesisError> {
    let series = data
        .get(symbol)
        .ok_or_else(|| SynthesisError::MissingSymbol(symbol.to_string()))?;
    if series.is_empty() {
        return Err(SynthesisError::EmptySeries(symbol.to_string()));
    }
    Ok(series)
}

/// 두 기초 시계열을 교집합 타임스탬프에서 결합합니다.
fn combine_pair(
    first: &[Candle],
    second: &[Candle],
    output: &str,
    op: impl Fn(f64, f64) -> f64,
) -> Vec<Candle> {
    let second_by_ts = index_by_ts(second);

    first
        .iter()
        .filter_map(|x| {
            second_by_ts.get(&x.ts.timestamp()).map(|y| {
                Candle::new(
                    output,
                    x.ts,
                    x.interval.clone(),
                    x.source.clone(),
                    op(x.open, y.open),
                    op(x.high, y.high),
                    op(x.low, y.low),
                    op(x.close, y.close),
                    x.volume,
                )
            })
        })
        .collect()
}

/// 스프레드 상품 생성기 (첫 상품 - 둘째 상품).
pub struct SpreadGenerator {
    symbol1: String,
    symbol2: String,
    output: String,
}

impl SpreadGenerator {
    /// `output = symbol1 - symbol2` 생성기를 만듭니다.
    pub fn new(
        symbol1: impl Into<String>,
        symbol2: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            symbol1: symbol1.into(),
            symbol2: symbol2.into(),
            output: output.into(),
        }
    }
}

impl InstrumentGenerator for SpreadGenerator {
    fn symbol(&self) -> &str {
        &self.output
    }

    fn required_symbols(&self) -> Vec<String> {
        vec![self.symbol1.clone(), self.symbol2.clone()]
    }

    fn generate(
        &self,
        data: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Candle>, SynthesisError> {
        let first = constituent(data, &self.symbol1)?;
        let second = constituent(data, &self.symbol2)?;
        Ok(combine_pair(first, second, &self.output, |a, b| a - b))
    }
}

/// 비율 상품 생성기 (첫 상품 / 둘째 상품).
pub struct RatioGenerator {
    symbol1: String,
    symbol2: String,
    output: String,
}

impl RatioGenerator {
    /// `output = symbol1 / symbol2` 생성기를 만듭니다.
    pub fn new(
        symbol1: impl Into<String>,
        symbol2: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            symbol1: symbol1.into(),
            symbol2: symbol2.into(),
            output: output.into(),
        }
    }
}

impl InstrumentGenerator for RatioGenerator {
    fn symbol(&self) -> &str {
        &self.output
    }

    fn required_symbols(&self) -> Vec<String> {
        vec![self.symbol1.clone(), self.symbol2.clone()]
    }

    fn generate(
        &self,
        data: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Candle>, SynthesisError> {
        let first = constituent(data, &self.symbol1)?;
        let second = constituent(data, &self.symbol2)?;
        Ok(combine_pair(first, second, &self.output, |a, b| a / b))
    }
}

/// 가중 합 상품 생성기.
///
/// 가중치 목록 순서가 의미를 가집니다: 첫 번째 상품이 타임스탬프 기준과
/// 거래량 출처가 됩니다.
pub struct WeightedCombinationGenerator {
    weights: Vec<(String, f64)>,
    output: String,
}

impl WeightedCombinationGenerator {
    /// `output = Σ weight_i · symbol_i` 생성기를 만듭니다.
    pub fn new(weights: Vec<(String, f64)>, output: impl Into<String>) -> Self {
        Self {
            weights,
            output: output.into(),
        }
    }
}

impl InstrumentGenerator for WeightedCombinationGenerator {
    fn symbol(&self) -> &str {
        &self.output
    }

    fn required_symbols(&self) -> Vec<String> {
        self.weights.iter().map(|(s, _)| s.clone()).collect()
    }

    fn generate(
        &self,
        data: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Candle>, SynthesisError> {
        let (first_symbol, first_weight) = self
            .weights
            .first()
            .ok_or_else(|| SynthesisError::Generation("no weights configured".to_string()))?;

        let first = constituent(data, first_symbol)?;
        let rest: Vec<(&f64, BTreeMap<i64, &Candle>)> = self.weights[1..]
            .iter()
            .map(|(symbol, weight)| Ok((weight, index_by_ts(constituent(data, symbol)?))))
            .collect::<Result<_, SynthesisError>>()?;

        let candles = first
            .iter()
            .filter_map(|base| {
                let ts = base.ts.timestamp();
                let mut open = base.open * first_weight;
                let mut high = base.high * first_weight;
                let mut low = base.low * first_weight;
                let mut close = base.close * first_weight;

                for (weight, series) in &rest {
                    let other = series.get(&ts)?;
                    open += other.open * **weight;
                    high += other.high * **weight;
                    low += other.low * **weight;
                    close += other.close * **weight;
                }

                Some(Candle::new(
                    self.output.as_str(),
                    base.ts,
                    base.interval.clone(),
                    base.source.clone(),
                    open,
                    high,
                    low,
                    close,
                    base.volume,
                ))
            })
            .collect();

        Ok(candles)
    }
}
