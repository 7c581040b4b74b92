//! REST API 라우트.
//!
//! - [`predict`]: 구매 예측 (`/api/predict-purchase`)
//! - [`health`]: 헬스 체크 (`/health`)

pub mod health;
pub mod predict;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use predict::{predict_router, PredictQuery};

use axum::Router;
use std::sync::Arc;

use crate::error::not_found;
use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/predict-purchase", predict_router())
        .fallback(not_found)
}
