//! Fin-O 구매 예측 REST API 서버.
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`source`]: 사용자 거래 원장 소스
//! - [`error`]: API 에러 응답

pub mod error;
pub mod routes;
pub mod source;
pub mod state;

pub use error::{ApiErrorResponse, PredictError};
pub use routes::*;
pub use source::{JsonFileSource, StaticSource, TransactionSource};
pub use state::AppState;

use axum::Router;
use std::sync::Arc;

/// 상태가 주입된 애플리케이션 라우터 (미들웨어 제외).
pub fn create_app(state: AppState) -> Router {
    create_api_router().with_state(Arc::new(state))
}
