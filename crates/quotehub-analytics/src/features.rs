//! 피처 계산기 구현.
//!
//! `FeatureCalculator` trait의 구현 모음입니다. 각 계산기는 종가 기준으로
//! 지표를 계산해 이름 붙은 열로 돌려줍니다. 데이터가 부족해 지표를
//! 계산할 수 없으면 경고 후 전부 `None`인 열을 돌려줍니다. 열의 길이는
//! 항상 입력 캔들 수와 같습니다.

use tracing::warn;

use quotehub_core::domain::{FeatureCalculator, FeatureSeries};
use quotehub_core::types::Candle;

use crate::indicators::{
    atr, bollinger_bands, ema, macd, rsi, sma, BollingerBandsParams, MacdParams,
};

fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

fn none_column(name: String, len: usize) -> FeatureSeries {
    FeatureSeries {
        name,
        values: vec![None; len],
    }
}

// =============================================================================
// 이동평균 피처
// =============================================================================

/// 단순 이동평균 피처 (`sma_{period}`).
pub struct SmaFeature {
    periods: Vec<usize>,
}

impl SmaFeature {
    /// 주어진 기간들의 SMA 피처를 생성합니다.
    pub fn new(periods: Vec<usize>) -> Self {
        Self { periods }
    }
}

impl FeatureCalculator for SmaFeature {
    fn feature_names(&self) -> Vec<String> {
        self.periods.iter().map(|p| format!("sma_{}", p)).collect()
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        let closes = closes(candles);
        self.periods
            .iter()
            .map(|&period| {
                let name = format!("sma_{}", period);
                match sma(&closes, period) {
                    Ok(values) => FeatureSeries { name, values },
                    Err(e) => {
                        warn!(feature = %name, error = %e, "피처 계산 불가");
                        none_column(name, candles.len())
                    }
                }
            })
            .collect()
    }
}

/// 지수 이동평균 피처 (`ema_{period}`).
pub struct EmaFeature {
    periods: Vec<usize>,
}

impl EmaFeature {
    /// 주어진 기간들의 EMA 피처를 생성합니다.
    pub fn new(periods: Vec<usize>) -> Self {
        Self { periods }
    }
}

impl FeatureCalculator for EmaFeature {
    fn feature_names(&self) -> Vec<String> {
        self.periods.iter().map(|p| format!("ema_{}", p)).collect()
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        let closes = closes(candles);
        self.periods
            .iter()
            .map(|&period| {
                let name = format!("ema_{}", period);
                match ema(&closes, period) {
                    Ok(values) => FeatureSeries { name, values },
                    Err(e) => {
                        warn!(feature = %name, error = %e, "피처 계산 불가");
                        none_column(name, candles.len())
                    }
                }
            })
            .collect()
    }
}

// =============================================================================
// 모멘텀 피처
// =============================================================================

/// RSI 피처 (`rsi_{period}`).
pub struct RsiFeature {
    period: usize,
}

impl RsiFeature {
    /// 주어진 기간의 RSI 피처를 생성합니다. 관례적 기본값은 14입니다.
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Default for RsiFeature {
    fn default() -> Self {
        Self::new(14)
    }
}

impl FeatureCalculator for RsiFeature {
    fn feature_names(&self) -> Vec<String> {
        vec![format!("rsi_{}", self.period)]
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        let name = format!("rsi_{}", self.period);
        let closes = closes(candles);
        match rsi(&closes, self.period) {
            Ok(values) => vec![FeatureSeries { name, values }],
            Err(e) => {
                warn!(feature = %name, error = %e, "피처 계산 불가");
                vec![none_column(name, candles.len())]
            }
        }
    }
}

// =============================================================================
// 변동성 피처
// =============================================================================

/// 볼린저 밴드 피처 (`bb_middle/_upper/_lower/_width_{period}`).
pub struct BollingerFeature {
    params: BollingerBandsParams,
}

impl BollingerFeature {
    /// 주어진 기간/배수의 볼린저 피처를 생성합니다.
    pub fn new(period: usize, std_dev: f64) -> Self {
        Self {
            params: BollingerBandsParams { period, std_dev },
        }
    }
}

impl Default for BollingerFeature {
    fn default() -> Self {
        Self {
            params: BollingerBandsParams::default(),
        }
    }
}

impl FeatureCalculator for BollingerFeature {
    fn feature_names(&self) -> Vec<String> {
        let p = self.params.period;
        vec![
            format!("bb_middle_{}", p),
            format!("bb_upper_{}", p),
            format!("bb_lower_{}", p),
            format!("bb_width_{}", p),
        ]
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        let names = self.feature_names();
        let closes = closes(candles);
        match bollinger_bands(&closes, self.params) {
            Ok(bands) => {
                let columns = [bands.middle, bands.upper, bands.lower, bands.width];
                names
                    .into_iter()
                    .zip(columns)
                    .map(|(name, values)| FeatureSeries { name, values })
                    .collect()
            }
            Err(e) => {
                warn!(period = self.params.period, error = %e, "볼린저 밴드 계산 불가");
                names
                    .into_iter()
                    .map(|name| none_column(name, candles.len()))
                    .collect()
            }
        }
    }
}

/// ATR 피처 (`atr_{period}`).
pub struct AtrFeature {
    period: usize,
}

impl AtrFeature {
    /// 주어진 기간의 ATR 피처를 생성합니다. 관례적 기본값은 14입니다.
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Default for AtrFeature {
    fn default() -> Self {
        Self::new(14)
    }
}

impl FeatureCalculator for AtrFeature {
    fn feature_names(&self) -> Vec<String> {
        vec![format!("atr_{}", self.period)]
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        let name = format!("atr_{}", self.period);
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let closes = closes(candles);

        match atr(&highs, &lows, &closes, self.period) {
            Ok(values) => vec![FeatureSeries { name, values }],
            Err(e) => {
                warn!(feature = %name, error = %e, "피처 계산 불가");
                vec![none_column(name, candles.len())]
            }
        }
    }
}

// =============================================================================
// MACD 피처
// =============================================================================

/// MACD 피처 (`macd`, `macd_signal`, `macd_histogram`).
pub struct MacdFeature {
    params: MacdParams,
}

impl MacdFeature {
    /// 주어진 파라미터의 MACD 피처를 생성합니다.
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            params: MacdParams {
                fast_period,
                slow_period,
                signal_period,
            },
        }
    }
}

impl Default for MacdFeature {
    fn default() -> Self {
        Self {
            params: MacdParams::default(),
        }
    }
}

impl FeatureCalculator for MacdFeature {
    fn feature_names(&self) -> Vec<String> {
        vec![
            "macd".to_string(),
            "macd_signal".to_string(),
            "macd_histogram".to_string(),
        ]
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        let names = self.feature_names();
        let closes = closes(candles);
        match macd(&closes, self.params) {
            Ok(result) => {
                let columns = [result.macd, result.signal, result.histogram];
                names
                    .into_iter()
                    .zip(columns)
                    .map(|(name, values)| FeatureSeries { name, values })
                    .collect()
            }
            Err(e) => {
                warn!(error = %e, "MACD 계산 불가");
                names
                    .into_iter()
                    .map(|name| none_column(name, candles.len()))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    "TEST",
                    start + Duration::hours(i as i64),
                    "1h",
                    "test",
                    close,
                    close + 1.0,
                    close - 1.0,
                    close,
                    1.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_sma_feature_names_and_values() {
        let feature = SmaFeature::new(vec![2, 3]);
        assert_eq!(feature.feature_names(), vec!["sma_2", "sma_3"]);

        let candles = series(&[1.0, 2.0, 3.0, 4.0]);
        let columns = feature.calculate(&candles);

        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].values, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
        assert_eq!(columns[1].values, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_insufficient_data_yields_none_columns() {
        let feature = RsiFeature::new(14);
        let candles = series(&[1.0, 2.0, 3.0]);
        let columns = feature.calculate(&candles);

        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "rsi_14");
        assert_eq!(columns[0].values.len(), 3);
        assert!(columns[0].values.iter().all(Option::is_none));
    }

    #[test]
    fn test_bollinger_feature_column_names() {
        let feature = BollingerFeature::default();
        assert_eq!(
            feature.feature_names(),
            vec!["bb_middle_20", "bb_upper_20", "bb_lower_20", "bb_width_20"]
        );
    }

    #[test]
    fn test_macd_feature_columns_align_with_input() {
        let feature = MacdFeature::default();
        let candles = series(&(1..=30).map(f64::from).collect::<Vec<_>>());
        let columns = feature.calculate(&candles);

        assert_eq!(columns.len(), 3);
        for column in &columns {
            assert_eq!(column.values.len(), candles.len());
        }
    }

    #[test]
    fn test_atr_feature_on_flat_series() {
        let feature = AtrFeature::new(2);
        let candles = series(&[10.0, 10.0, 10.0]);
        let columns = feature.calculate(&candles);

        // 고가-저가 폭이 일정(2.0)하므로 ATR도 2.0
        assert_eq!(columns[0].values, vec![None, Some(2.0), Some(2.0)]);
    }
}
