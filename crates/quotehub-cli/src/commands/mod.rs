//! CLI 명령 구현.

pub mod export;
pub mod fetch;
pub mod inspect;

use chrono::{DateTime, NaiveDate, Utc};

/// `YYYY-MM-DD` 문자열을 UTC 자정 시각으로 파싱합니다.
pub fn parse_date(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{}': {}", s, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid date '{}'", s))?;
    Ok(midnight.and_utc())
}
