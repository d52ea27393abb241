//! 데이터 모듈 오류 타입.
//!
//! 오류는 세 부류로 나뉩니다:
//! - 설정 오류: 등록되지 않은 소스 요청. 요청 전체를 즉시 중단합니다.
//! - 수집 오류 (`Fetch`/`Parse`): 개별 구간만 건너뛰고 계속 진행합니다.
//! - 저장소 오류 (`Connection`/`Query`/`Insert`): 쓰기 실패는 현재 응답을
//!   막지 않으며, 다음 요청에서 같은 갭이 다시 감지됩니다.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 설정 오류 (등록되지 않은 소스 등)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 데이터 가져오기 오류 (외부 소스)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    Query(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    Insert(String),
}

impl DataError {
    /// 개별 구간을 건너뛰고 계속 진행해도 되는 오류인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DataError::Fetch(_) | DataError::Parse(_))
    }

    /// 저장소 계층에서 발생한 오류인지 확인합니다.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            DataError::Connection(_) | DataError::Query(_) | DataError::Insert(_)
        )
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                DataError::Connection("Connection pool exhausted".to_string())
            }
            sqlx::Error::Database(db_err) => DataError::Query(db_err.message().to_string()),
            _ => DataError::Query(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::Fetch(err.to_string())
    }
}

/// 데이터 작업을 위한 Result 타입.
pub type Result<T> = std::result::Result<T, DataError>;
