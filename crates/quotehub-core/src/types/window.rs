//! 요청 시간 범위(window) 정의.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 닫힌 시간 범위 `[start, end]`.
///
/// 생성 시 `start <= end`를 강제하지 않습니다. `start > end`인 범위는
/// 저장소 조회와 배치 계획 모두에서 빈 결과를 냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// 범위 시작
    pub start: DateTime<Utc>,
    /// 범위 끝
    pub end: DateTime<Utc>,
}

impl Window {
    /// 새 범위를 생성합니다.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 빈 범위(start > end)인지 확인합니다.
    pub fn is_degenerate(&self) -> bool {
        self.start > self.end
    }

    /// 범위 길이를 반환합니다. 빈 범위는 0을 반환합니다.
    pub fn duration(&self) -> Duration {
        if self.is_degenerate() {
            Duration::zero()
        } else {
            self.end - self.start
        }
    }

    /// 주어진 시각이 범위에 포함되는지 확인합니다 (양 끝 포함).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}
