//! 데이터 매니저 구현.
//!
//! 다운로더와 하류 변환(합성 상품, 피처 계산)을 묶어 하나의 진입점을
//! 제공합니다. 결과는 가변 공유 캐시가 아니라 명시적으로 소유되는
//! 불변 스냅샷으로 발행됩니다. 스냅샷은 버전 번호를 가지며,
//! `invalidate`로만 명시적으로 무효화됩니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use quotehub_core::domain::{FeatureCalculator, FeatureSeries, InstrumentGenerator};
use quotehub_core::types::Candle;

use crate::downloader::CandleDownloader;
use crate::error::Result;

/// 데이터 요청 파라미터.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DataRequest {
    /// 자산 식별자 목록
    pub symbols: Vec<String>,
    /// 범위 시작
    pub start: DateTime<Utc>,
    /// 범위 끝
    pub end: DateTime<Utc>,
    /// 간격 라벨 (예: "1h", "1d")
    pub interval: String,
    /// 데이터 소스 이름
    pub source: String,
    /// 합성 상품 포함 여부
    pub include_generated: bool,
    /// 피처 계산 여부
    pub include_features: bool,
}

impl DataRequest {
    /// 새 요청을 생성합니다. 합성 상품과 피처는 기본 포함입니다.
    pub fn new(
        symbols: Vec<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbols,
            start,
            end,
            interval: interval.into(),
            source: source.into(),
            include_generated: true,
            include_features: true,
        }
    }

    /// 합성 상품 포함 여부를 설정합니다.
    pub fn with_generated(mut self, include: bool) -> Self {
        self.include_generated = include;
        self
    }

    /// 피처 계산 여부를 설정합니다.
    pub fn with_features(mut self, include: bool) -> Self {
        self.include_features = include;
        self
    }
}

/// 한 심볼의 시계열과 파생 피처.
#[derive(Debug, Clone)]
pub struct SymbolSeries {
    /// 시간순 캔들
    pub candles: Vec<Candle>,
    /// 피처 열 (캔들과 인덱스 정렬)
    pub features: Vec<FeatureSeries>,
}

/// 불변 데이터 스냅샷.
///
/// `get_data` 호출마다 새 버전이 발행되며, 소비자는 `Arc`로 공유되는
/// 스냅샷을 참조합니다. 발행 이후 내용은 변하지 않습니다.
#[derive(Debug)]
pub struct Snapshot {
    /// 단조 증가하는 버전 번호
    pub version: u64,
    /// 발행 시각
    pub created_at: DateTime<Utc>,
    /// 심볼별 시계열 (기초 + 합성)
    pub series: BTreeMap<String, SymbolSeries>,
}

impl Snapshot {
    /// 스냅샷에 포함된 심볼 목록을 반환합니다.
    pub fn symbols(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    /// 특정 심볼의 시계열을 반환합니다.
    pub fn get(&self, symbol: &str) -> Option<&SymbolSeries> {
        self.series.get(symbol)
    }

    /// 전체 캔들 수를 반환합니다.
    pub fn total_candles(&self) -> usize {
        self.series.values().map(|s| s.candles.len()).sum()
    }
}

/// 스냅샷 요약 정보.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SnapshotSummary {
    /// 현재 스냅샷 버전 (없으면 None)
    pub version: Option<u64>,
    /// 심볼 수
    pub symbols: usize,
    /// 전체 캔들 수
    pub candles: usize,
    /// 등록된 피처 이름
    pub features: Vec<String>,
}

/// 다운로더와 하류 변환을 조정하는 중앙 데이터 매니저.
pub struct DataManager {
    downloader: CandleDownloader,
    generators: Vec<Arc<dyn InstrumentGenerator>>,
    calculators: Vec<Arc<dyn FeatureCalculator>>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    version: AtomicU64,
}

impl DataManager {
    /// 새 데이터 매니저를 생성합니다.
    pub fn new(downloader: CandleDownloader) -> Self {
        Self {
            downloader,
            generators: Vec::new(),
            calculators: Vec::new(),
            snapshot: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// 합성 상품 생성기를 등록합니다.
    pub fn register_generator(&mut self, generator: Arc<dyn InstrumentGenerator>) {
        self.generators.push(generator);
    }

    /// 피처 계산기를 등록합니다.
    pub fn register_calculator(&mut self, calculator: Arc<dyn FeatureCalculator>) {
        self.calculators.push(calculator);
    }

    /// 다운로더 핸들을 반환합니다.
    pub fn downloader(&self) -> &CandleDownloader {
        &self.downloader
    }

    /// 데이터를 조회하고 새 스냅샷을 발행합니다.
    ///
    /// 기초 데이터는 캐시 우선으로 받아오고, 등록된 생성기로 합성 상품을
    /// 만들고, 등록된 계산기로 피처를 계산합니다. 생성기/계산기의 개별
    /// 실패는 경고 후 건너뜁니다.
    #[instrument(skip(self, request), fields(symbols = request.symbols.len()))]
    pub async fn get_data(&self, request: &DataRequest) -> Result<Arc<Snapshot>> {
        let symbol_refs: Vec<&str> = request.symbols.iter().map(String::as_str).collect();
        let rows = self
            .downloader
            .get(
                &symbol_refs,
                request.start,
                request.end,
                &request.interval,
                &request.source,
            )
            .await?;

        // 심볼별 분리 (전역 정렬이 심볼 내 시간순을 보존한다)
        let mut by_symbol: BTreeMap<String, Vec<Candle>> = BTreeMap::new();
        for candle in rows {
            by_symbol
                .entry(candle.symbol.clone())
                .or_default()
                .push(candle);
        }

        // 합성 상품 생성
        if request.include_generated {
            for generator in &self.generators {
                let missing: Vec<String> = generator
                    .required_symbols()
                    .into_iter()
                    .filter(|s| !by_symbol.contains_key(s))
                    .collect();
                if !missing.is_empty() {
                    warn!(
                        symbol = generator.symbol(),
                        missing = ?missing,
                        "기초 심볼 누락으로 합성 생략"
                    );
                    continue;
                }

                match generator.generate(&by_symbol) {
                    Ok(candles) if !candles.is_empty() => {
                        by_symbol.insert(generator.symbol().to_string(), candles);
                    }
                    Ok(_) => {
                        warn!(symbol = generator.symbol(), "합성 결과가 비어 있음");
                    }
                    Err(e) => {
                        warn!(symbol = generator.symbol(), error = %e, "합성 상품 생성 실패");
                    }
                }
            }
        }

        // 피처 계산
        let mut series = BTreeMap::new();
        for (symbol, candles) in by_symbol {
            let mut features = Vec::new();
            if request.include_features {
                for calculator in &self.calculators {
                    features.extend(calculator.calculate(&candles));
                }
            }
            series.insert(symbol, SymbolSeries { candles, features });
        }

        // 스냅샷 발행
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            version,
            created_at: Utc::now(),
            series,
        });

        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        info!(
            version,
            symbols = snapshot.series.len(),
            candles = snapshot.total_candles(),
            "데이터 스냅샷 발행"
        );

        Ok(snapshot)
    }

    /// 현재 스냅샷을 반환합니다.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().await.clone()
    }

    /// 현재 스냅샷에서 특정 심볼의 캔들을 조회합니다.
    ///
    /// `start`/`end`가 주어지면 해당 범위로 걸러냅니다.
    pub async fn symbol_candles(
        &self,
        symbol: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Option<Vec<Candle>> {
        let snapshot = self.snapshot().await?;
        let series = snapshot.get(symbol)?;

        Some(
            series
                .candles
                .iter()
                .filter(|c| start.is_none_or(|s| c.ts >= s) && end.is_none_or(|e| c.ts <= e))
                .cloned()
                .collect(),
        )
    }

    /// 현재 스냅샷의 심볼 목록을 반환합니다 (기초 + 합성).
    pub async fn available_symbols(&self) -> Vec<String> {
        match self.snapshot().await {
            Some(snapshot) => snapshot.symbols(),
            None => Vec::new(),
        }
    }

    /// 등록된 모든 피처 이름을 반환합니다.
    pub fn feature_names(&self) -> Vec<String> {
        self.calculators
            .iter()
            .flat_map(|c| c.feature_names())
            .collect()
    }

    /// 현재 스냅샷을 무효화합니다.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
        info!("데이터 스냅샷 무효화");
    }

    /// 스냅샷 요약을 반환합니다.
    pub async fn summary(&self) -> SnapshotSummary {
        let snapshot = self.snapshot().await;
        SnapshotSummary {
            version: snapshot.as_ref().map(|s| s.version),
            symbols: snapshot.as_ref().map(|s| s.series.len()).unwrap_or(0),
            candles: snapshot.as_ref().map(|s| s.total_candles()).unwrap_or(0),
            features: self.feature_names(),
        }
    }
}
