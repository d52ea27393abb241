//! 모멘텀 지표 (Momentum Indicators).
//!
//! 가격 변화의 속도를 측정하는 지표들을 제공합니다.

use super::{check_len, check_period, IndicatorResult};

/// 상대강도지수 (RSI).
///
/// 기간 내 상승폭과 하락폭의 단순 평균으로 계산합니다:
/// `RS = mean(gain) / mean(loss)`, `RSI = 100 - 100 / (1 + RS)`.
///
/// 처음 `period`개 위치는 `None`입니다 (첫 변화량이 정의되지 않으므로
/// 유효 구간이 이동평균보다 한 칸 늦게 시작합니다). 기간 내 변화가 전혀
/// 없으면 해당 위치는 `None`입니다.
pub fn rsi(values: &[f64], period: usize) -> IndicatorResult<Vec<Option<f64>>> {
    check_period(period)?;
    check_len(values, period + 1)?;

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut out = vec![None; values.len()];
    for i in period..values.len() {
        // values[i]까지의 최근 period개 변화량
        let window = &deltas[i - period..i];
        let gain: f64 = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
        let loss: f64 = -window.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

        let value = 100.0 - 100.0 / (1.0 + gain / loss);
        if value.is_finite() {
            out[i] = Some(value);
        }
    }

    Ok(out)
}
