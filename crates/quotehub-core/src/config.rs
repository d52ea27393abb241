//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! TOML 파일에서 로드하며 `QUOTEHUB__` 접두사 환경 변수로 오버라이드합니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 데이터 수집 설정
    #[serde(default)]
    pub data: DataConfig,
    /// 소스 백엔드 설정
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite 데이터베이스 파일 경로
    pub path: String,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "quotehub.db".to_string(),
            max_connections: 5,
            connection_timeout_secs: 30,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 데이터 수집 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// 캐시 사용 여부 (false면 항상 전체 범위를 다시 받음)
    pub use_cache: bool,
    /// 동시에 처리할 최대 심볼 수
    pub max_fetch_concurrency: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            max_fetch_concurrency: 4,
        }
    }
}

/// 소스 백엔드 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// 이 소스 활성화 여부
    pub enabled: bool,
    /// REST API 기본 URL (소스별 기본값 사용 시 생략)
    #[serde(default)]
    pub base_url: Option<String>,
    /// 호출당 최대 레코드 수 (소스별 기본값 사용 시 생략)
    #[serde(default)]
    pub batch_limit: Option<usize>,
    /// HTTP 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            batch_limit: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("QUOTEHUB")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
