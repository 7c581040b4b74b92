//! # Fino Core
//!
//! Fin-O 금융 어시스턴트의 핵심 도메인 모델 및 공용 인프라를 제공합니다.
//!
//! 이 크레이트는 워크스페이스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 원장 거래 타입 ([`LedgerTransaction`])
//! - 모델 티어 정의 ([`ModelTier`])
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
