//! 캐시 플로우 통합 테스트.
//!
//! 스크립트된 목 백엔드로 다운로더/매니저의 끝-대-끝 동작을 검증합니다:
//! 캐시 적중 시 호출 0회, 갭만 다운로드, 부분 실패 허용, 중복 제거,
//! 스냅샷 발행.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use quotehub_core::domain::{
    FeatureCalculator, FeatureSeries, InstrumentGenerator, SynthesisError,
};
use quotehub_core::types::{Candle, Window};
use quotehub_data::{
    CandleDownloader, CandleStore, DataError, DataManager, DataRequest, SourceBackend,
};

// =============================================================================
// 목 백엔드
// =============================================================================

/// 메모리 시계열을 서빙하는 목 백엔드.
///
/// 요청 범위로 걸러서 돌려주고, 호출 횟수와 호출 범위를 기록합니다.
struct MockBackend {
    name: &'static str,
    batch_limit: Option<usize>,
    data: HashMap<String, Vec<Candle>>,
    fail_symbols: HashSet<String>,
    calls: AtomicUsize,
    call_windows: Mutex<Vec<Window>>,
}

impl MockBackend {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            batch_limit: None,
            data: HashMap::new(),
            fail_symbols: HashSet::new(),
            calls: AtomicUsize::new(0),
            call_windows: Mutex::new(Vec::new()),
        }
    }

    fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    fn with_series(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    fn failing(mut self, symbol: &str) -> Self {
        self.fail_symbols.insert(symbol.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call_windows(&self) -> Vec<Window> {
        self.call_windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceBackend for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn batch_limit(&self) -> Option<usize> {
        self.batch_limit
    }

    async fn fetch(
        &self,
        symbols: &[&str],
        window: &Window,
        _interval: &str,
    ) -> Result<Vec<Candle>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_windows.lock().unwrap().push(*window);

        let mut out = Vec::new();
        for symbol in symbols {
            if self.fail_symbols.contains(*symbol) {
                return Err(DataError::Fetch(format!("simulated outage: {}", symbol)));
            }
            if let Some(series) = self.data.get(*symbol) {
                out.extend(series.iter().filter(|c| window.contains(c.ts)).cloned());
            }
        }
        Ok(out)
    }
}

// =============================================================================
// 헬퍼
// =============================================================================

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn daily(symbol: &str, source: &str, days: std::ops::RangeInclusive<u32>, close: f64) -> Vec<Candle> {
    days.map(|d| {
        Candle::new(
            symbol,
            day(d),
            "1d",
            source,
            close,
            close + 1.0,
            close - 1.0,
            close,
            100.0,
        )
    })
    .collect()
}

fn hourly(symbol: &str, source: &str, hours: i64, close: f64) -> Vec<Candle> {
    let start = day(1);
    (0..=hours)
        .map(|h| {
            Candle::new(
                symbol,
                start + Duration::hours(h),
                "1h",
                source,
                close,
                close + 1.0,
                close - 1.0,
                close,
                10.0,
            )
        })
        .collect()
}

async fn downloader_with(mock: Arc<MockBackend>) -> CandleDownloader {
    let store = CandleStore::in_memory().await.unwrap();
    let mut downloader = CandleDownloader::new(store);
    downloader.register_backend(mock);
    downloader
}

// =============================================================================
// 다운로더 테스트
// =============================================================================

#[tokio::test]
async fn test_cold_fetch_then_cache_hit() {
    let mock = Arc::new(MockBackend::new("mock").with_series("BTCUSDT", hourly("BTCUSDT", "mock", 23, 100.0)));
    let downloader = downloader_with(mock.clone()).await;

    let start = day(1);
    let end = start + Duration::hours(23);

    let first = downloader
        .get(&["BTCUSDT"], start, end, "1h", "mock")
        .await
        .unwrap();
    assert_eq!(first.len(), 24);
    let cold_calls = mock.calls();
    assert!(cold_calls >= 1);

    // 두 번째 호출은 캐시 적중이므로 네트워크 호출이 없어야 한다
    let second = downloader
        .get(&["BTCUSDT"], start, end, "1h", "mock")
        .await
        .unwrap();
    assert_eq!(mock.calls(), cold_calls);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_two_gap_backfill() {
    let mock = Arc::new(MockBackend::new("mock").with_series("BTCUSDT", daily("BTCUSDT", "mock", 1..=5, 50.0)));
    let downloader = downloader_with(mock.clone()).await;

    // 저장소에 [1월 2일, 1월 4일]만 미리 채운다
    downloader
        .store()
        .upsert(&daily("BTCUSDT", "mock", 2..=4, 50.0))
        .await
        .unwrap();

    let result = downloader
        .get(&["BTCUSDT"], day(1), day(5), "1d", "mock")
        .await
        .unwrap();

    // 선행 갭과 후행 갭이 각각 한 번씩 다운로드된다
    assert_eq!(mock.calls(), 2);
    let windows = mock.call_windows();
    assert_eq!(windows[0], Window::new(day(1), day(2)));
    assert_eq!(windows[1], Window::new(day(4), day(5)));

    // 전체 범위가 빈틈 없이 채워진다
    assert_eq!(result.len(), 5);
    for (i, candle) in result.iter().enumerate() {
        assert_eq!(candle.ts, day(i as u32 + 1));
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_other_symbols() {
    let mock = Arc::new(
        MockBackend::new("mock")
            .with_series("GOOD", daily("GOOD", "mock", 1..=3, 10.0))
            .failing("BAD"),
    );
    let downloader = downloader_with(mock.clone()).await;

    let result = downloader
        .get(&["GOOD", "BAD"], day(1), day(3), "1d", "mock")
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(result.iter().all(|c| c.symbol == "GOOD"));
}

#[tokio::test]
async fn test_newly_fetched_wins_over_stale_cache() {
    let fresh = daily("BTCUSDT", "mock", 1..=3, 200.0);
    let mock = Arc::new(MockBackend::new("mock").with_series("BTCUSDT", fresh));
    let downloader = downloader_with(mock.clone()).await;

    // 2일 자 캔들이 종가 100으로 캐시되어 있다
    downloader
        .store()
        .upsert(&daily("BTCUSDT", "mock", 2..=2, 100.0))
        .await
        .unwrap();

    let result = downloader
        .get(&["BTCUSDT"], day(1), day(3), "1d", "mock")
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    // 갭 경계에서 다시 받은 2일 자 캔들이 캐시 값을 이긴다
    let middle = result.iter().find(|c| c.ts == day(2)).unwrap();
    assert_eq!(middle.close, 200.0);

    // 저장소에도 새 값이 반영된다
    let stored = downloader
        .store()
        .query("BTCUSDT", "1d", "mock", &Window::new(day(2), day(2)))
        .await
        .unwrap();
    assert_eq!(stored[0].close, 200.0);
}

#[tokio::test]
async fn test_trailing_gap_refetched_when_source_has_no_more_data() {
    // 소스에 1월 1~2일 데이터만 존재하는데 1월 3일까지 요청하는 시나리오
    let mock = Arc::new(MockBackend::new("mock").with_series("X", daily("X", "mock", 1..=2, 10.0)));
    let downloader = downloader_with(mock.clone()).await;

    let first = downloader
        .get(&["X"], day(1), day(3), "1d", "mock")
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(mock.calls(), 1);

    // 커버리지 끝(1월 2일)이 요청 끝(1월 3일)보다 앞이므로
    // 후행 갭이 다시 감지되어 한 번 더 다운로드한다
    let second = downloader
        .get(&["X"], day(1), day(3), "1d", "mock")
        .await
        .unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(mock.calls(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_batching_respects_backend_limit() {
    let mock = Arc::new(
        MockBackend::new("mock")
            .with_batch_limit(100)
            .with_series("BTCUSDT", hourly("BTCUSDT", "mock", 250, 100.0)),
    );
    let downloader = downloader_with(mock.clone()).await;

    let start = day(1);
    let end = start + Duration::hours(250);
    let result = downloader
        .get(&["BTCUSDT"], start, end, "1h", "mock")
        .await
        .unwrap();

    // 250시간 / (100-1)시간 스텝 → 세 번의 연속 호출
    assert_eq!(mock.calls(), 3);
    let windows = mock.call_windows();
    assert_eq!(windows[0].start, start);
    assert_eq!(windows[2].end, end);
    for pair in windows.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }

    assert_eq!(result.len(), 251);
}

#[tokio::test]
async fn test_empty_source_returns_empty_ok() {
    let mock = Arc::new(MockBackend::new("mock"));
    let downloader = downloader_with(mock.clone()).await;

    let result = downloader
        .get(&["GHOST"], day(1), day(3), "1d", "mock")
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_result_is_ordered_and_deduplicated() {
    let mock = Arc::new(
        MockBackend::new("mock")
            .with_series("AAA", daily("AAA", "mock", 1..=4, 10.0))
            .with_series("BBB", daily("BBB", "mock", 1..=4, 20.0)),
    );
    let downloader = downloader_with(mock.clone()).await;

    let result = downloader
        .get(&["AAA", "BBB"], day(1), day(4), "1d", "mock")
        .await
        .unwrap();

    assert_eq!(result.len(), 8);
    // 시간 오름차순, 같은 시각이면 심볼 순
    for pair in result.windows(2) {
        assert!(pair[0].ts <= pair[1].ts);
    }
    let mut seen = HashSet::new();
    for candle in &result {
        assert!(seen.insert(candle.key()), "duplicate key: {:?}", candle.key());
    }
}

#[tokio::test]
async fn test_use_cache_false_always_downloads() {
    let mock = Arc::new(MockBackend::new("mock").with_series("BTCUSDT", daily("BTCUSDT", "mock", 1..=3, 10.0)));
    let store = CandleStore::in_memory().await.unwrap();
    let mut downloader = CandleDownloader::new(store).with_use_cache(false);
    downloader.register_backend(mock.clone());

    downloader.get(&["BTCUSDT"], day(1), day(3), "1d", "mock").await.unwrap();
    downloader.get(&["BTCUSDT"], day(1), day(3), "1d", "mock").await.unwrap();

    // 캐시를 건너뛰므로 호출마다 전체 범위를 다시 받는다
    assert_eq!(mock.calls(), 2);

    // 그래도 저장은 계속 이루어진다
    let stored = downloader
        .store()
        .query("BTCUSDT", "1d", "mock", &Window::new(day(1), day(3)))
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
}

// =============================================================================
// 매니저 테스트
// =============================================================================

/// 두 심볼 종가 차이로 합성 캔들을 만드는 테스트 생성기.
struct DiffGenerator;

impl InstrumentGenerator for DiffGenerator {
    fn symbol(&self) -> &str {
        "AAA-BBB"
    }

    fn required_symbols(&self) -> Vec<String> {
        vec!["AAA".to_string(), "BBB".to_string()]
    }

    fn generate(
        &self,
        data: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Candle>, SynthesisError> {
        let a = &data["AAA"];
        let b = &data["BBB"];
        Ok(a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                Candle::new(
                    "AAA-BBB",
                    x.ts,
                    x.interval.clone(),
                    x.source.clone(),
                    x.open - y.open,
                    x.high - y.high,
                    x.low - y.low,
                    x.close - y.close,
                    x.volume,
                )
            })
            .collect())
    }
}

/// 종가를 두 배로 만드는 테스트 계산기.
struct DoubleClose;

impl FeatureCalculator for DoubleClose {
    fn feature_names(&self) -> Vec<String> {
        vec!["close_x2".to_string()]
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<FeatureSeries> {
        vec![FeatureSeries {
            name: "close_x2".to_string(),
            values: candles.iter().map(|c| Some(c.close * 2.0)).collect(),
        }]
    }
}

async fn manager_with_transforms() -> (DataManager, Arc<MockBackend>) {
    let mock = Arc::new(
        MockBackend::new("mock")
            .with_series("AAA", daily("AAA", "mock", 1..=3, 30.0))
            .with_series("BBB", daily("BBB", "mock", 1..=3, 10.0)),
    );
    let downloader = downloader_with(mock.clone()).await;
    let mut manager = DataManager::new(downloader);
    manager.register_generator(Arc::new(DiffGenerator));
    manager.register_calculator(Arc::new(DoubleClose));
    (manager, mock)
}

#[tokio::test]
async fn test_snapshot_includes_generated_and_features() {
    let (manager, _mock) = manager_with_transforms().await;

    let request = DataRequest::new(
        vec!["AAA".to_string(), "BBB".to_string()],
        day(1),
        day(3),
        "1d",
        "mock",
    );
    let snapshot = manager.get_data(&request).await.unwrap();

    assert_eq!(snapshot.version, 1);
    assert_eq!(
        snapshot.symbols(),
        vec!["AAA".to_string(), "AAA-BBB".to_string(), "BBB".to_string()]
    );

    let synthetic = snapshot.get("AAA-BBB").unwrap();
    assert_eq!(synthetic.candles.len(), 3);
    assert_eq!(synthetic.candles[0].close, 20.0);

    let features = &snapshot.get("AAA").unwrap().features;
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].name, "close_x2");
    assert_eq!(features[0].values[0], Some(60.0));
}

#[tokio::test]
async fn test_snapshot_version_increments_and_invalidates() {
    let (manager, _mock) = manager_with_transforms().await;

    let request = DataRequest::new(vec!["AAA".to_string()], day(1), day(3), "1d", "mock")
        .with_generated(false)
        .with_features(false);

    let first = manager.get_data(&request).await.unwrap();
    let second = manager.get_data(&request).await.unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);

    manager.invalidate().await;
    assert!(manager.snapshot().await.is_none());
    assert_eq!(manager.summary().await.version, None);

    // 무효화 후에도 다음 발행은 버전을 이어간다
    let third = manager.get_data(&request).await.unwrap();
    assert_eq!(third.version, 3);
}

#[tokio::test]
async fn test_generator_skipped_when_required_symbol_missing() {
    let (manager, _mock) = manager_with_transforms().await;

    // BBB를 요청하지 않으면 합성 상품은 생략된다
    let request = DataRequest::new(vec!["AAA".to_string()], day(1), day(3), "1d", "mock");
    let snapshot = manager.get_data(&request).await.unwrap();

    assert_eq!(snapshot.symbols(), vec!["AAA".to_string()]);
}

#[tokio::test]
async fn test_symbol_candles_filters_by_range() {
    let (manager, _mock) = manager_with_transforms().await;

    let request = DataRequest::new(vec!["AAA".to_string()], day(1), day(3), "1d", "mock");
    manager.get_data(&request).await.unwrap();

    let all = manager.symbol_candles("AAA", None, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let tail = manager
        .symbol_candles("AAA", Some(day(2)), None)
        .await
        .unwrap();
    assert_eq!(tail.len(), 2);
    assert!(manager.symbol_candles("ZZZ", None, None).await.is_none());
}
