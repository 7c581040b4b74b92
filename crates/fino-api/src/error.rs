//! API 에러 응답 타입.
//!
//! 예측 엔드포인트는 실패해도 대체 예측을 담은 봉투를 HTTP 500으로 돌려주고,
//! 그 외 경로는 [`ApiErrorResponse`] 형식을 사용합니다.

use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use fino_core::FinoError;
use fino_forecast::{FailureResponse, ForecastError};

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "경로를 찾을 수 없습니다",
///   "timestamp": 1738300800,
///   "method": "GET",
///   "path": "/api/unknown"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 예측 요청 처리 중 발생하는 에러.
///
/// 종류와 무관하게 HTTP 500과 [`FailureResponse`] 봉투로 응답합니다.
#[derive(Debug, Error)]
pub enum PredictError {
    /// 요청 본문 또는 쿼리 파싱 실패
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 거래 원장 조회 실패
    #[error("Failed to load transactions: {0}")]
    Ledger(#[from] FinoError),

    /// 예측 파이프라인 실패
    #[error("{0}")]
    Forecast(#[from] ForecastError),
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        match &self {
            PredictError::InvalidRequest(_) => {
                warn!(error = %self, "Rejected purchase prediction request")
            }
            PredictError::Ledger(e) if e.is_client_error() => {
                warn!(error = %self, "Rejected purchase prediction request")
            }
            PredictError::Forecast(e) if e.is_lifecycle_violation() => {
                error!(error = %self, "Forecast model used outside its lifecycle")
            }
            _ => error!(error = %self, "Purchase prediction request failed"),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(FailureResponse::new(self.to_string())),
        )
            .into_response()
    }
}

/// 등록되지 않은 경로에 대한 404 응답.
pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(
            ApiErrorResponse::new("NOT_FOUND", "경로를 찾을 수 없습니다")
                .with_request_info(&method, &uri),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization_skips_empty_fields() {
        let error = ApiErrorResponse::new("NOT_FOUND", "missing");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("method").is_none());
        assert_eq!(error.to_string(), "[NOT_FOUND] missing");
    }

    #[test]
    fn test_predict_error_messages() {
        let err = PredictError::from(ForecastError::UseAfterDispose);
        assert_eq!(err.to_string(), ForecastError::UseAfterDispose.to_string());

        let err = PredictError::from(FinoError::InvalidInput("bad id".to_string()));
        assert!(err.to_string().starts_with("Failed to load transactions"));
    }
}
