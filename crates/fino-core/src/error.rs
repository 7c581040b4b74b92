//! Fin-O 공용 에러 타입.

use thiserror::Error;

/// 설정 로드, 원장 파일 처리 등에서 발생하는 에러.
#[derive(Debug, Error)]
pub enum FinoError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 파일 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),
}

/// Fin-O 작업을 위한 Result 타입.
pub type FinoResult<T> = Result<T, FinoError>;

impl FinoError {
    /// 호출자의 입력 때문에 발생한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(self, FinoError::InvalidInput(_) | FinoError::NotFound(_))
    }
}

impl From<serde_json::Error> for FinoError {
    fn from(err: serde_json::Error) -> Self {
        FinoError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for FinoError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FinoError::NotFound(err.to_string())
        } else {
            FinoError::Io(err.to_string())
        }
    }
}

impl From<config::ConfigError> for FinoError {
    fn from(err: config::ConfigError) -> Self {
        FinoError::Config(err.to_string())
    }
}
