//! 변동성 지표 (Volatility Indicators).
//!
//! 가격 흔들림의 크기를 측정하는 지표들을 제공합니다.

use serde::{Deserialize, Serialize};

use super::{check_len, check_period, sma, IndicatorError, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20)
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0)
    pub std_dev: f64,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone)]
pub struct BollingerBandsResult {
    /// 중심선 (SMA)
    pub middle: Vec<Option<f64>>,
    /// 상단 밴드 (중심선 + k·표준편차)
    pub upper: Vec<Option<f64>>,
    /// 하단 밴드 (중심선 - k·표준편차)
    pub lower: Vec<Option<f64>>,
    /// 밴드 폭 ((상단 - 하단) / 중심선)
    pub width: Vec<Option<f64>>,
}

/// 볼린저 밴드.
///
/// 표준편차는 표본 표준편차(n-1 분모)를 사용합니다.
/// 처음 `period - 1`개 위치는 `None`입니다.
pub fn bollinger_bands(
    values: &[f64],
    params: BollingerBandsParams,
) -> IndicatorResult<BollingerBandsResult> {
    let period = params.period;
    if period < 2 {
        return Err(IndicatorError::InvalidParameter(
            "Bollinger period must be at least 2".to_string(),
        ));
    }
    check_len(values, period)?;

    let middle = sma(values, period)?;

    let mut upper = vec![None; values.len()];
    let mut lower = vec![None; values.len()];
    let mut width = vec![None; values.len()];

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = match middle[i] {
            Some(mean) => mean,
            None => continue,
        };
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        let std = variance.sqrt();

        let up = mean + params.std_dev * std;
        let low = mean - params.std_dev * std;
        upper[i] = Some(up);
        lower[i] = Some(low);
        width[i] = if mean != 0.0 {
            Some((up - low) / mean)
        } else {
            None
        };
    }

    Ok(BollingerBandsResult {
        middle,
        upper,
        lower,
        width,
    })
}

/// 평균 실제 범위 (ATR).
///
/// `TR = max(high - low, |high - prev_close|, |low - prev_close|)`의
/// `period` 구간 단순 이동평균입니다. 첫 캔들의 TR은 `high - low`입니다.
/// 처음 `period - 1`개 위치는 `None`입니다.
pub fn atr(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> IndicatorResult<Vec<Option<f64>>> {
    check_period(period)?;
    if highs.len() != lows.len() || highs.len() != closes.len() {
        return Err(IndicatorError::InvalidParameter(
            "high/low/close length mismatch".to_string(),
        ));
    }
    check_len(closes, period)?;

    let true_ranges: Vec<f64> = (0..highs.len())
        .map(|i| {
            let high_low = highs[i] - lows[i];
            if i == 0 {
                return high_low;
            }
            let high_close = (highs[i] - closes[i - 1]).abs();
            let low_close = (lows[i] - closes[i - 1]).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect();

    sma(&true_ranges, period)
}
