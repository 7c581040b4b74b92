//! # Fino Forecast
//!
//! 거래 시퀀스 기반 다음 구매 예측 엔진입니다.
//!
//! - **Feature 인코딩**: 거래 이력 → 고정 크기 `L × 14` 행렬
//! - **시퀀스 모델**: ONNX Runtime 기반 Real 모델 또는 Mock 모델
//! - **출력 디코딩**: 로짓 argmax, 어휘 라벨, 금액 역정규화
//! - **순위화**: 신뢰도/빈도 결합 점수와 지출 인사이트
//! - **팩토리**: Real 로드 실패 시 Mock 폴백, 라이프사이클 관리
//!
//! # 아키텍처
//!
//! ```text
//! Ledger (LedgerTransaction)
//!        │
//!        ▼
//! ┌─────────────────┐
//! │ RecordConverter │ ← 이름→id, 순환 달력 인코딩
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ FeatureEncoder  │ ← L × 14, 마지막 레코드로 패딩
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SequenceModel   │ ◀── │  ModelFactory    │
//! │ (Real | Mock)   │     │ (폴백, 라이프사이클) │
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ OutputDecoder   │ ← argmax, 어휘, 스케일러
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ PredictionRanker│ ← combinedScore, 인사이트
//! └────────┬────────┘
//!          ▼
//!   PurchaseForecast
//! ```
//!
//! # 예제
//!
//! ```ignore
//! use fino_forecast::{ModelFactory, ModelTier};
//!
//! let factory = ModelFactory::default();
//! let model = factory.create(ModelTier::Small, true);
//! model.load().await?;
//!
//! let forecast = model.forecast(&history).await?;
//! println!("다음 구매: {} ({:.1}%)",
//!     forecast.most_likely_purchase.merchant,
//!     forecast.most_likely_purchase.probability * 100.0);
//!
//! model.dispose().await;
//! ```

pub mod artifacts;
pub mod decoder;
pub mod error;
pub mod factory;
pub mod features;
pub mod ledger;
pub mod localize;
pub mod model;
pub mod ranker;
pub mod service;
pub mod types;

// 자주 사용되는 타입 재내보내기
pub use artifacts::{ArtifactOrigin, ArtifactSource, ModelArtifacts, Scaler, Vocabulary};
pub use decoder::{argmax, decode, REAL_MODEL_CONFIDENCE, UNKNOWN_LABEL};
pub use error::{ForecastError, ForecastResult};
pub use factory::{ForecastModel, Lifecycle, ModelFactory, ModelStatus};
pub use features::{encode, FeatureSequence, FEATURE_COUNT, FEATURE_NAMES};
pub use ledger::{CalendarEncoding, RecordConverter};
pub use localize::{LabelLocalizer, LabelTable};
pub use model::{
    ForwardOutput, MockSequenceModel, ModelConfig, RealSequenceModel, SequenceModel,
    ML_RUNTIME_AVAILABLE,
};
pub use ranker::{combined_score, fallback_forecast, rank, rank_predictions};
pub use service::{
    FailureResponse, ForecastMetadata, ForecastResponse, ForecastService, PredictPurchaseRequest,
};
pub use types::{
    ForecastInsights, ModelBackend, MostLikelyPurchase, PredictedTransaction, PurchaseForecast,
    RankedPrediction, SpendingPattern, TopPrediction, TransactionRecord,
};

pub use fino_core::ModelTier;
