//! 캐시 커버리지 갭 감지.
//!
//! 커버리지는 키 공간별로 캐시된 타임스탬프의 극값(가장 이른/늦은 시각)
//! 두 개로만 추적합니다. 극값 사이의 내부 구멍은 탐지하지 않습니다.
//! 주말이나 휴장일이 만드는 빈 구간은 실제 누락과 구분되지 않습니다.

use quotehub_core::types::{Candle, Window};

/// 키의 캐시 커버리지 극값.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    /// 가장 이른 캐시 타임스탬프
    pub earliest: chrono::DateTime<chrono::Utc>,
    /// 가장 늦은 캐시 타임스탬프
    pub latest: chrono::DateTime<chrono::Utc>,
}

impl Coverage {
    /// 시간순으로 정렬된 캔들 시계열에서 극값을 구합니다.
    ///
    /// 빈 시계열은 `None`을 반환합니다 (캐시 없음).
    pub fn from_series(candles: &[Candle]) -> Option<Self> {
        match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => Some(Self {
                earliest: first.ts,
                latest: last.ts,
            }),
            _ => None,
        }
    }
}

/// 요청 범위에서 캐시되지 않은 부분 범위를 구합니다.
///
/// 결과는 0개, 1개 또는 2개의 범위입니다:
/// - 캐시가 없으면 요청 범위 전체가 하나의 갭입니다.
/// - `start < earliest`이면 선행 갭 `[start, earliest]`.
/// - `end > latest`이면 후행 갭 `[latest, end]`.
/// - 선행 갭이 후행 갭보다 앞에 옵니다.
///
/// 갭 경계는 캐시 극값을 포함합니다. 경계 캔들을 다시 받아도 upsert가
/// 같은 키를 교체하므로 중복은 생기지 않습니다.
pub fn find_gaps(window: &Window, coverage: Option<&Coverage>) -> Vec<Window> {
    if window.is_degenerate() {
        return Vec::new();
    }

    let coverage = match coverage {
        Some(c) => c,
        None => return vec![*window],
    };

    let mut gaps = Vec::new();

    if window.start < coverage.earliest {
        gaps.push(Window::new(window.start, coverage.earliest));
    }
    if window.end > coverage.latest {
        gaps.push(Window::new(coverage.latest, window.end));
    }

    gaps
}
