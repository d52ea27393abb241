//! 캔들 간격(interval) 정의.
//!
//! 이 모듈은 다양한 시간 간격을 나타내는 타입과, 문자열 라벨을 기간으로
//! 변환하는 헬퍼를 정의합니다. 공개 API는 간격을 문자열 라벨로 받으므로
//! 알 수 없는 라벨도 실패 없이 처리해야 합니다.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 캔들 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// 1분봉
    M1,
    /// 3분봉
    M3,
    /// 5분봉
    M5,
    /// 15분봉
    M15,
    /// 30분봉
    M30,
    /// 1시간봉
    H1,
    /// 2시간봉
    H2,
    /// 4시간봉
    H4,
    /// 6시간봉
    H6,
    /// 8시간봉
    H8,
    /// 12시간봉
    H12,
    /// 일봉
    D1,
    /// 3일봉
    D3,
    /// 주봉
    W1,
    /// 월봉
    MN1,
}

/// 알 수 없는 라벨의 대체 간격 (1시간).
pub const DEFAULT_INTERVAL: Interval = Interval::H1;

impl Interval {
    /// 이 간격의 기간을 반환합니다.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::M1 => Duration::minutes(1),
            Interval::M3 => Duration::minutes(3),
            Interval::M5 => Duration::minutes(5),
            Interval::M15 => Duration::minutes(15),
            Interval::M30 => Duration::minutes(30),
            Interval::H1 => Duration::hours(1),
            Interval::H2 => Duration::hours(2),
            Interval::H4 => Duration::hours(4),
            Interval::H6 => Duration::hours(6),
            Interval::H8 => Duration::hours(8),
            Interval::H12 => Duration::hours(12),
            Interval::D1 => Duration::days(1),
            Interval::D3 => Duration::days(3),
            Interval::W1 => Duration::weeks(1),
            Interval::MN1 => Duration::days(30), // 근사값
        }
    }

    /// 이 간격의 초 단위 값을 반환합니다.
    pub fn as_secs(&self) -> i64 {
        self.duration().num_seconds()
    }

    /// 표준 간격 라벨을 반환합니다.
    pub fn label(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H8 => "8h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
            Interval::D3 => "3d",
            Interval::W1 => "1w",
            Interval::MN1 => "1M",
        }
    }

    /// 간격 라벨에서 파싱합니다.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Interval::M1),
            "3m" => Some(Interval::M3),
            "5m" => Some(Interval::M5),
            "15m" => Some(Interval::M15),
            "30m" => Some(Interval::M30),
            "1h" => Some(Interval::H1),
            "2h" => Some(Interval::H2),
            "4h" => Some(Interval::H4),
            "6h" => Some(Interval::H6),
            "8h" => Some(Interval::H8),
            "12h" => Some(Interval::H12),
            "1d" => Some(Interval::D1),
            "3d" => Some(Interval::D3),
            "1w" => Some(Interval::W1),
            "1M" => Some(Interval::MN1),
            _ => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Invalid interval: {}", s))
    }
}

/// 라벨에 해당하는 간격 길이를 반환합니다.
///
/// 알 수 없는 라벨은 에러 대신 1시간으로 대체됩니다. 배치 계획이
/// 간격 라벨 때문에 실패하는 일이 없도록 전체 함수(total)로 유지합니다.
pub fn interval_duration(label: &str) -> Duration {
    match Interval::from_label(label) {
        Some(interval) => interval.duration(),
        None => DEFAULT_INTERVAL.duration(),
    }
}
