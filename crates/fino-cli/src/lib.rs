//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 원장 기반 구매 예측 실행
//! - 모델 로드 상태 점검
//! - 모델 입력 인코딩 확인

pub mod commands;
