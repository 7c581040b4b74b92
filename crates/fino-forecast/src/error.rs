//! 예측 엔진 에러 타입.

use thiserror::Error;

/// 예측 파이프라인에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// 추론 그래프 로드 에러 (Mock으로 폴백됨)
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// 어휘/스케일러/라벨 아티팩트 조회 에러 (기본값으로 대체됨)
    #[error("Artifact fetch error: {0}")]
    ArtifactFetch(String),

    /// forward 중 텐서 형태 불일치 등 추론 에러
    #[error("Inference error: {0}")]
    Inference(String),

    /// `load()` 전에 예측을 호출함
    #[error("Model not loaded. Call load() first.")]
    NotLoaded,

    /// `dispose()` 후에 모델을 사용함
    #[error("Model used after dispose()")]
    UseAfterDispose,

    /// 유효하지 않은 모델 설정
    #[error("Invalid model config: {0}")]
    InvalidConfig(String),
}

/// 예측 작업을 위한 Result 타입.
pub type ForecastResult<T> = Result<T, ForecastError>;

impl ForecastError {
    /// 파이프라인 내부에서 복구되는 에러인지 확인 (폴백 또는 기본값 대체).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::ModelLoad(_) | ForecastError::ArtifactFetch(_)
        )
    }

    /// 라이프사이클 계약 위반(프로그래머 에러)인지 확인.
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(
            self,
            ForecastError::NotLoaded | ForecastError::UseAfterDispose
        )
    }
}
