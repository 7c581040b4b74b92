//! 구매 예측 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/predict-purchase` - JSON 본문 `{userId?, modelType?, useMockModel?}`
//! - `GET /api/predict-purchase?modelType=&useMockModel=&userId=`
//!
//! 실패하면 HTTP 500과 함께 `{success: false, error, fallbackPrediction}`을 반환합니다.
//! 알 수 없는 `modelType`도 small로 대체하지 않고 실패로 처리합니다.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use fino_forecast::{ForecastResponse, ModelTier, PredictPurchaseRequest};

use crate::error::PredictError;
use crate::state::AppState;

/// GET 요청 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictQuery {
    pub user_id: Option<String>,
    pub model_type: Option<String>,
    pub use_mock_model: Option<String>,
}

impl PredictQuery {
    /// 쿼리를 요청으로 변환합니다. `useMockModel`은 `"false"`일 때만 실제 모델을 요청합니다.
    ///
    /// `modelType`은 `small`/`large`(대소문자 무시)만 허용합니다. 그 외 값은
    /// small로 대체하지 않고 [`PredictError::InvalidRequest`]로 거부하므로
    /// HTTP 500 실패 봉투가 반환됩니다.
    pub fn into_request(self) -> Result<PredictPurchaseRequest, PredictError> {
        let defaults = PredictPurchaseRequest::default();
        let model_type = match self.model_type.as_deref() {
            Some(raw) => raw
                .parse::<ModelTier>()
                .map_err(PredictError::InvalidRequest)?,
            None => defaults.model_type,
        };
        Ok(PredictPurchaseRequest {
            user_id: self.user_id.unwrap_or(defaults.user_id),
            model_type,
            use_mock_model: self.use_mock_model.as_deref() != Some("false"),
        })
    }
}

/// POST 본문 파싱. 빈 본문은 기본 요청으로 처리합니다.
pub fn parse_request_body(body: &[u8]) -> Result<PredictPurchaseRequest, PredictError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PredictPurchaseRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| PredictError::InvalidRequest(e.to_string()))
}

async fn run_prediction(
    state: &AppState,
    request: PredictPurchaseRequest,
) -> Result<Json<ForecastResponse>, PredictError> {
    let ledger = state.source.recent_transactions(&request.user_id).await?;
    debug!(
        user_id = %request.user_id,
        transactions = ledger.len(),
        "Fetched ledger for prediction"
    );

    let response = state.service.predict_purchase(&request, &ledger).await?;
    Ok(Json(response))
}

/// 구매 예측 (POST).
///
/// POST /api/predict-purchase
pub async fn predict_purchase(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ForecastResponse>, PredictError> {
    let request = parse_request_body(&body)?;
    run_prediction(&state, request).await
}

/// 구매 예측 (GET).
///
/// GET /api/predict-purchase
pub async fn predict_purchase_query(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PredictQuery>, QueryRejection>,
) -> Result<Json<ForecastResponse>, PredictError> {
    let Query(query) = query.map_err(|e| PredictError::InvalidRequest(e.body_text()))?;
    let request = query.into_request()?;
    run_prediction(&state, request).await
}

/// 구매 예측 라우터 생성.
pub fn predict_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(predict_purchase).get(predict_purchase_query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_body() {
        assert_eq!(
            parse_request_body(b"").unwrap(),
            PredictPurchaseRequest::default()
        );
        assert_eq!(
            parse_request_body(b"  \n").unwrap(),
            PredictPurchaseRequest::default()
        );

        let request = parse_request_body(br#"{"modelType":"large","useMockModel":false}"#).unwrap();
        assert_eq!(request.model_type, ModelTier::Large);
        assert!(!request.use_mock_model);
        assert_eq!(request.user_id, "test-user-123");

        assert!(matches!(
            parse_request_body(b"{oops"),
            Err(PredictError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_query_mock_unless_false() {
        let request = PredictQuery::default().into_request().unwrap();
        assert_eq!(request, PredictPurchaseRequest::default());

        for (raw, expected) in [("false", false), ("true", true), ("0", true), ("", true)] {
            let query = PredictQuery {
                use_mock_model: Some(raw.to_string()),
                ..Default::default()
            };
            assert_eq!(query.into_request().unwrap().use_mock_model, expected);
        }
    }

    #[test]
    fn test_query_rejects_unknown_tier() {
        let query = PredictQuery {
            model_type: Some("huge".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_request(),
            Err(PredictError::InvalidRequest(_))
        ));
    }
}
