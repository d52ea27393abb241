//! 소스 호출 한도를 지키는 배치 계획.
//!
//! 소스 백엔드는 한 번의 호출로 돌려줄 수 있는 레코드 수에 상한을 둘 수
//! 있습니다. 이 모듈은 요청 범위를 상한 이하의 연속된 부분 범위로
//! 분할합니다.

use quotehub_core::types::{interval_duration, Window};

/// 범위를 호출당 레코드 한도에 맞는 부분 범위로 분할합니다.
///
/// 각 부분 범위는 최대 `max_records - 1` 간격 스텝을 덮으며, 전체가
/// 겹침과 빈틈 없이 시간 오름차순으로 원래 범위를 덮습니다. 이웃한
/// 부분 범위는 경계 시각을 공유합니다 (경계 캔들 중복은 upsert가 흡수).
///
/// 알 수 없는 간격 라벨은 1시간 스텝으로 대체되어 계획이 실패하지
/// 않습니다. `start >= end`인 범위는 빈 계획을 돌려줍니다.
pub fn plan_batches(window: &Window, interval: &str, max_records: usize) -> Vec<Window> {
    if window.start >= window.end {
        return Vec::new();
    }

    let steps = max_records.saturating_sub(1).max(1) as i32;
    let batch_span = interval_duration(interval) * steps;

    let mut batches = Vec::new();
    let mut current = window.start;
    while current < window.end {
        let batch_end = std::cmp::min(current + batch_span, window.end);
        batches.push(Window::new(current, batch_end));
        current = batch_end;
    }

    batches
}
