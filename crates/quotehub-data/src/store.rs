//! OHLCV 캔들 영속 저장소.
//!
//! 캔들은 (symbol, timestamp, interval, source) 복합 기본 키로 저장되며,
//! 같은 키로 다시 쓰면 값 컬럼이 교체됩니다 (last-write-wins upsert).
//! 저장소는 "무엇을 이미 받아왔는가"의 유일한 진실 공급원이며, 이 코어는
//! 레코드를 삭제하지 않습니다 (보존 정책은 범위 밖).
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use quotehub_data::CandleStore;
//!
//! let store = CandleStore::open("quotehub.db").await?;
//! store.upsert(&candles).await?;
//! let rows = store.query("BTCUSDT", "1h", "binance", &window).await?;
//! ```

use std::path::Path;

use chrono::DateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::{debug, info};

use quotehub_core::config::DatabaseConfig;
use quotehub_core::types::{Candle, Window};

use crate::error::{DataError, Result};

/// SQLite 바인딩 변수 한도(999)를 넘지 않도록 잡은 행 단위 묶음 크기.
const UPSERT_CHUNK: usize = 100;

/// 캔들 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
struct CandleRow {
    symbol: String,
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    source: String,
    interval: String,
}

impl CandleRow {
    /// 도메인 캔들로 변환합니다.
    fn into_candle(self) -> Candle {
        Candle {
            symbol: self.symbol,
            ts: DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default(),
            interval: self.interval,
            source: self.source,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// 키 공간별 저장 통계.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct StoreStats {
    /// 자산 식별자
    pub symbol: String,
    /// 간격 라벨
    pub interval: String,
    /// 데이터 소스
    pub source: String,
    /// 저장된 캔들 수
    pub candles: i64,
    /// 가장 이른 타임스탬프 (에포크 초)
    pub earliest: i64,
    /// 가장 늦은 타임스탬프 (에포크 초)
    pub latest: i64,
}

/// OHLCV 캔들 영속 저장소.
#[derive(Clone)]
pub struct CandleStore {
    pool: SqlitePool,
}

impl CandleStore {
    /// 파일 경로로 저장소를 엽니다. 파일이 없으면 생성합니다.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// 설정값을 반영하여 저장소를 엽니다.
    pub async fn open_with(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// 인메모리 저장소를 엽니다 (테스트/일회성 실행용).
    ///
    /// 인메모리 DB는 연결마다 별개이므로 연결 수를 1로 고정합니다.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// 스키마를 초기화합니다 (존재하면 건드리지 않음).
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candles (
                symbol TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                open REAL,
                high REAL,
                low REAL,
                close REAL,
                volume REAL,
                source TEXT NOT NULL,
                interval TEXT NOT NULL,
                PRIMARY KEY (symbol, timestamp, interval, source)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DataError::Query(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_symbol_timestamp
            ON candles(symbol, timestamp)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DataError::Query(e.to_string()))?;

        info!("캔들 저장소 스키마 준비 완료");
        Ok(())
    }

    /// 캔들을 저장합니다. 같은 키의 기존 레코드는 교체됩니다.
    ///
    /// 빈 슬라이스는 no-op이며 0을 반환합니다. 저장 실패 시 호출자의
    /// 메모리 내 데이터는 그대로 유효합니다 (현재 응답에는 영향 없음).
    pub async fn upsert(&self, candles: &[Candle]) -> Result<usize> {
        if candles.is_empty() {
            return Ok(0);
        }

        let mut written = 0;

        for chunk in candles.chunks(UPSERT_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO candles \
                 (symbol, timestamp, open, high, low, close, volume, source, interval) ",
            );

            builder.push_values(chunk, |mut row, candle| {
                row.push_bind(&candle.symbol)
                    .push_bind(candle.ts.timestamp())
                    .push_bind(candle.open)
                    .push_bind(candle.high)
                    .push_bind(candle.low)
                    .push_bind(candle.close)
                    .push_bind(candle.volume)
                    .push_bind(&candle.source)
                    .push_bind(&candle.interval);
            });

            builder.push(
                " ON CONFLICT (symbol, timestamp, interval, source) DO UPDATE SET \
                 open = excluded.open, high = excluded.high, low = excluded.low, \
                 close = excluded.close, volume = excluded.volume",
            );

            let result = builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(|e| DataError::Insert(e.to_string()))?;

            written += result.rows_affected() as usize;
        }

        debug!(count = written, "캔들 저장 완료");
        Ok(written)
    }

    /// 요청 범위의 캔들을 시간 오름차순으로 조회합니다 (양 끝 포함).
    pub async fn query(
        &self,
        symbol: &str,
        interval: &str,
        source: &str,
        window: &Window,
    ) -> Result<Vec<Candle>> {
        let rows: Vec<CandleRow> = sqlx::query_as(
            r#"
            SELECT symbol, timestamp, open, high, low, close, volume, source, interval
            FROM candles
            WHERE symbol = ?
                AND interval = ?
                AND source = ?
                AND timestamp >= ?
                AND timestamp <= ?
            ORDER BY timestamp
            "#,
        )
        .bind(symbol)
        .bind(interval)
        .bind(source)
        .bind(window.start.timestamp())
        .bind(window.end.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(CandleRow::into_candle).collect())
    }

    /// 키 공간별 저장 통계를 조회합니다.
    pub async fn stats(&self) -> Result<Vec<StoreStats>> {
        sqlx::query_as(
            r#"
            SELECT symbol, interval, source,
                   COUNT(*) AS candles,
                   MIN(timestamp) AS earliest,
                   MAX(timestamp) AS latest
            FROM candles
            GROUP BY symbol, interval, source
            ORDER BY symbol, interval, source
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::Query(e.to_string()))
    }

    /// 특정 심볼의 모든 레코드를 삭제합니다 (운영 도구용).
    pub async fn delete_symbol(&self, symbol: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM candles WHERE symbol = ?")
            .bind(symbol)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::Query(e.to_string()))?;

        info!(symbol, deleted = result.rows_affected(), "심볼 레코드 삭제");
        Ok(result.rows_affected())
    }
}
