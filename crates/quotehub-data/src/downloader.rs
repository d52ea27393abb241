//! 캐시 기반 캔들 다운로드 오케스트레이터.
//!
//! 요청된 (심볼, 간격, 소스, 시간 범위)에 대해 저장소에 이미 있는 부분을
//! 확인하고, 누락된 부분만 소스 백엔드에서 받아와 저장한 뒤, 빈틈과
//! 중복이 없는 시간순 시계열을 돌려줍니다.
//!
//! # 실패 정책
//!
//! - 등록되지 않은 소스: 어떤 다운로드도 시작하기 전에 설정 오류로 중단.
//! - 개별 구간 다운로드 실패/빈 응답: 경고 후 해당 구간만 건너뛰고 계속.
//! - 저장 실패: 경고 후 메모리 데이터로 응답 구성 (다음 요청이 같은 갭을
//!   다시 감지).
//! - 전체 결과가 비면: 경고와 함께 빈 결과 반환 (오류 아님).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use quotehub_core::types::{Candle, CandleKey, Window};

use crate::backend::SourceBackend;
use crate::batch::plan_batches;
use crate::error::{DataError, Result};
use crate::gap::{find_gaps, Coverage};
use crate::store::CandleStore;

/// 심볼+간격+소스별 페칭 상태를 추적하는 Lock 맵.
type FetchLockMap = Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>;

/// 캐시 기반 캔들 다운로더.
///
/// 소스 이름 → 백엔드 매핑은 설정 시점에 `register_backend`로 구성하며,
/// 요청 시 `source` 라벨로 해석됩니다.
pub struct CandleDownloader {
    store: CandleStore,
    backends: HashMap<String, Arc<dyn SourceBackend>>,
    /// 같은 키의 중복 다운로드를 막는 Lock 맵
    fetch_locks: FetchLockMap,
    /// false면 캐시 조회를 건너뛰고 항상 전체 범위를 받음 (저장은 유지)
    use_cache: bool,
    /// 동시에 처리할 최대 심볼 수
    max_concurrency: usize,
}

impl CandleDownloader {
    /// 새 다운로더를 생성합니다.
    pub fn new(store: CandleStore) -> Self {
        Self {
            store,
            backends: HashMap::new(),
            fetch_locks: Arc::new(RwLock::new(HashMap::new())),
            use_cache: true,
            max_concurrency: 4,
        }
    }

    /// 캐시 사용 여부를 설정합니다.
    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// 심볼 동시 처리 한도를 설정합니다.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// 소스 백엔드를 등록합니다. 백엔드 이름이 등록 키입니다.
    pub fn register_backend(&mut self, backend: Arc<dyn SourceBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    /// 저장소 핸들을 반환합니다.
    pub fn store(&self) -> &CandleStore {
        &self.store
    }

    /// 캔들 시계열을 조회합니다 (캐시 우선, 갭만 다운로드).
    ///
    /// 반환값은 요청한 모든 심볼의 캔들을 시간순으로 합친 것이며,
    /// (심볼, 시각, 간격, 소스) 키 기준으로 중복이 없습니다.
    ///
    /// # Errors
    ///
    /// `source`에 등록된 백엔드가 없으면 `DataError::Configuration`을
    /// 반환합니다. 그 외 실패는 부분 결과로 강등됩니다.
    #[instrument(skip(self, symbols), fields(symbols = symbols.len()))]
    pub async fn get(
        &self,
        symbols: &[&str],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: &str,
        source: &str,
    ) -> Result<Vec<Candle>> {
        let backend = self.backends.get(source).cloned().ok_or_else(|| {
            DataError::Configuration(format!("No backend registered for source: {}", source))
        })?;

        let window = Window::new(start, end);
        info!(count = symbols.len(), source, interval, %window, "캔들 데이터 요청");

        let series: Vec<Vec<Candle>> = stream::iter(symbols.iter().map(|&symbol| {
            let backend = Arc::clone(&backend);
            self.sync_symbol(symbol, &window, interval, source, backend)
        }))
        .buffer_unordered(self.max_concurrency)
        .collect()
        .await;

        // 심볼 간 병합: 시간 → 심볼 순 정렬, 전체 키 기준 마지막 값 유지
        let mut merged: BTreeMap<CandleKey, Candle> = BTreeMap::new();
        for candles in series {
            for candle in candles {
                merged.insert(candle.key(), candle);
            }
        }

        if merged.is_empty() {
            warn!(source, interval, "요청한 심볼 전체에서 데이터를 얻지 못했습니다");
        } else {
            info!(total = merged.len(), "캔들 데이터 반환");
        }

        Ok(merged.into_values().collect())
    }

    /// 단일 심볼의 캐시를 동기화하고 병합된 시계열을 돌려줍니다.
    ///
    /// 이 메서드는 실패를 내부에서 삼킵니다: 저장소/백엔드 오류는 경고로
    /// 기록하고 가능한 부분 결과를 돌려줍니다.
    async fn sync_symbol(
        &self,
        symbol: &str,
        window: &Window,
        interval: &str,
        source: &str,
        backend: Arc<dyn SourceBackend>,
    ) -> Vec<Candle> {
        let lock_key = format!("{}:{}:{}", symbol, interval, source);
        let lock = self.get_or_create_lock(&lock_key).await;
        let _guard = lock.lock().await;

        // 1. 캐시 조회
        let cached = if self.use_cache {
            match self.store.query(symbol, interval, source, window).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(symbol, error = %e, "캐시 조회 실패, 빈 캐시로 진행");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // 2. 커버리지 극값으로 갭 산출
        let coverage = Coverage::from_series(&cached);
        let gaps = find_gaps(window, coverage.as_ref());

        if gaps.is_empty() {
            debug!(symbol, cached = cached.len(), "캐시 완전 적중, 다운로드 생략");
            return cached;
        }

        info!(
            symbol,
            gaps = gaps.len(),
            cached = cached.len(),
            "누락 구간 다운로드 시작"
        );

        // 3. 갭별 배치 다운로드 (구간 순서 유지, 실패는 건너뜀)
        let mut fetched: Vec<Candle> = Vec::new();
        for gap in &gaps {
            let batches = match backend.batch_limit() {
                Some(limit) => plan_batches(gap, interval, limit),
                None => vec![*gap],
            };

            for batch in &batches {
                match backend.fetch(&[symbol], batch, interval).await {
                    Ok(rows) if rows.is_empty() => {
                        warn!(symbol, window = %batch, "빈 응답, 해당 구간에 데이터 없음");
                    }
                    Ok(rows) => {
                        debug!(symbol, count = rows.len(), window = %batch, "배치 다운로드 완료");
                        // 4. 배치별 즉시 저장: 이후 실패해도 받은 것은 남는다
                        if let Err(e) = self.store.upsert(&rows).await {
                            warn!(symbol, error = %e, "캐시 저장 실패, 이번 응답에는 메모리 데이터 사용");
                        }
                        fetched.extend(rows);
                    }
                    Err(e) => {
                        warn!(symbol, window = %batch, error = %e, "구간 다운로드 실패, 다음 구간 계속");
                    }
                }
            }
        }

        // 5. 캐시 ∪ 신규 병합: 같은 시각이면 새로 받은 값이 이긴다
        let mut merged: BTreeMap<i64, Candle> = BTreeMap::new();
        for candle in cached.into_iter().chain(fetched) {
            merged.insert(candle.ts.timestamp(), candle);
        }

        merged.into_values().collect()
    }

    /// Lock을 가져오거나 생성합니다.
    async fn get_or_create_lock(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.fetch_locks.read().await;
            if let Some(lock) = locks.get(key) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.fetch_locks.write().await;
        Arc::clone(
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_unknown_source_is_configuration_error() {
        let store = CandleStore::in_memory().await.unwrap();
        let downloader = CandleDownloader::new(store);

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let err = downloader
            .get(&["BTCUSDT"], start, end, "1h", "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, DataError::Configuration(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_lock_map_reuses_instances() {
        let store = CandleStore::in_memory().await.unwrap();
        let downloader = CandleDownloader::new(store);

        let a = downloader.get_or_create_lock("BTCUSDT:1h:test").await;
        let b = downloader.get_or_create_lock("BTCUSDT:1h:test").await;
        let c = downloader.get_or_create_lock("ETHUSDT:1h:test").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
