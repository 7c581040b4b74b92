//! 구매 예측 서비스.
//!
//! 요청 하나마다 모델을 생성·로드하고, 원장을 변환해 예측한 뒤 해제합니다.
//! HTTP와 CLI는 이 서비스를 통해 파이프라인을 실행합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};
use uuid::Uuid;

use fino_core::{forecast_span, ForecastSettings, LedgerTransaction, ModelTier};

use crate::error::{ForecastError, ForecastResult};
use crate::factory::{ModelFactory, ModelStatus};
use crate::ledger::RecordConverter;
use crate::localize::LabelLocalizer;
use crate::ranker::{fallback_forecast, rank};
use crate::types::{PredictedTransaction, PurchaseForecast, TransactionRecord};

/// 기본 사용자 id.
pub const DEFAULT_USER_ID: &str = "test-user-123";

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_true() -> bool {
    true
}

/// 구매 예측 요청.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictPurchaseRequest {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub model_type: ModelTier,
    #[serde(default = "default_true")]
    pub use_mock_model: bool,
}

impl Default for PredictPurchaseRequest {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            model_type: ModelTier::Small,
            use_mock_model: true,
        }
    }
}

/// 응답 메타데이터. 관찰용이며 순위 결과에는 영향을 주지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMetadata {
    pub request_id: Uuid,
    pub user_id: String,
    pub model_type: ModelTier,
    pub use_mock_model: bool,
    /// 실제로 Mock이 사용되었는지 (폴백 포함)
    pub mock_engaged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub prediction_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// 성공 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub success: bool,
    pub data: PurchaseForecast,
    pub metadata: ForecastMetadata,
}

/// 실패 응답. 대체 예측을 함께 담습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    pub fallback_prediction: PurchaseForecast,
}

impl FailureResponse {
    /// 에러 메시지로 실패 응답 생성.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            fallback_prediction: fallback_forecast(),
        }
    }
}

/// 요청 단위로 예측 파이프라인을 실행하는 서비스.
#[derive(Debug, Clone)]
pub struct ForecastService {
    factory: ModelFactory,
    converter: RecordConverter,
    localizer: LabelLocalizer,
    settings: ForecastSettings,
}

impl ForecastService {
    /// 구성 요소로 서비스 생성.
    pub fn new(
        factory: ModelFactory,
        converter: RecordConverter,
        localizer: LabelLocalizer,
        settings: ForecastSettings,
    ) -> Self {
        Self {
            factory,
            converter,
            localizer,
            settings,
        }
    }

    /// 설정에서 서비스 생성. 라벨 아티팩트가 있으면 함께 로드합니다.
    pub async fn from_settings(settings: ForecastSettings) -> Self {
        let localizer =
            LabelLocalizer::load(settings.label_language, settings.labels_uri.as_deref()).await;
        Self::new(
            ModelFactory::from_settings(&settings),
            RecordConverter::from_settings(&settings),
            localizer,
            settings,
        )
    }

    /// 예측 엔진 설정.
    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// 모델 팩토리.
    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    /// 원장으로 다음 구매를 예측합니다.
    ///
    /// 모델은 결과와 무관하게 요청 종료 시 해제됩니다.
    pub async fn predict_purchase(
        &self,
        request: &PredictPurchaseRequest,
        ledger: &[LedgerTransaction],
    ) -> ForecastResult<ForecastResponse> {
        let span = forecast_span!("predict_purchase", request.model_type, request.user_id);
        async move {
            let model = self.factory.create(request.model_type, request.use_mock_model);
            let result = async {
                model.load().await?;
                let history = self.history_from_ledger(ledger);
                let predictions = model.predict(&history).await?;
                Ok::<_, ForecastError>(self.localizer.localize(predictions))
            }
            .await;
            let status = model.status();
            model.dispose().await;

            let predictions = result?;
            info!(
                predictions = predictions.len(),
                backend = ?status.backend,
                "Purchase prediction completed"
            );
            Ok(self.respond(request, &predictions, &status))
        }
        .instrument(span)
        .await
    }

    fn history_from_ledger(&self, ledger: &[LedgerTransaction]) -> Vec<TransactionRecord> {
        let mut rng = rand::thread_rng();
        if ledger.is_empty() && self.settings.synthesize_empty_history {
            info!("Ledger is empty, using synthetic history");
            return self
                .converter
                .synthetic_history(self.converter.max_history(), Utc::now(), &mut rng);
        }
        self.converter.convert_with_rng(ledger, &mut rng)
    }

    fn respond(
        &self,
        request: &PredictPurchaseRequest,
        predictions: &[PredictedTransaction],
        status: &ModelStatus,
    ) -> ForecastResponse {
        ForecastResponse {
            success: true,
            data: rank(predictions),
            metadata: ForecastMetadata {
                request_id: Uuid::new_v4(),
                user_id: request.user_id.clone(),
                model_type: request.model_type,
                use_mock_model: request.use_mock_model,
                mock_engaged: status.mock_engaged(),
                fallback_reason: status.fallback_reason.clone(),
                prediction_count: predictions.len(),
                timestamp: Utc::now(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactSource, Vocabulary};
    use crate::model::ModelConfig;

    fn service(settings: ForecastSettings) -> ForecastService {
        let factory = ModelFactory::new(
            "no/such/models",
            ArtifactSource {
                vocab_uri: "no/such/vocab.json".to_string(),
                scaler_uri: "no/such/scaler.json".to_string(),
                labels_uri: None,
            },
            ModelConfig::default(),
        )
        .with_mock_seed(Some(5));
        ForecastService::new(
            factory,
            RecordConverter::default(),
            LabelLocalizer::german(),
            settings,
        )
    }

    #[test]
    fn test_request_defaults() {
        let request: PredictPurchaseRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PredictPurchaseRequest::default());

        let request: PredictPurchaseRequest =
            serde_json::from_str(r#"{"userId":"u1","modelType":"large","useMockModel":false}"#)
                .unwrap();
        assert_eq!(request.model_type, ModelTier::Large);
        assert!(!request.use_mock_model);
    }

    #[tokio::test]
    async fn test_predict_purchase_with_empty_ledger() {
        let service = service(ForecastSettings::default());
        let response = service
            .predict_purchase(&PredictPurchaseRequest::default(), &[])
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.metadata.prediction_count, 10);
        assert!(response.metadata.mock_engaged);
        assert!(response.metadata.fallback_reason.is_none());
        assert!(!response.data.top_predictions.is_empty());
    }

    #[tokio::test]
    async fn test_predict_purchase_real_fallback_metadata() {
        let service = service(ForecastSettings::default());
        let request = PredictPurchaseRequest {
            use_mock_model: false,
            ..Default::default()
        };
        let response = service.predict_purchase(&request, &[]).await.unwrap();

        assert!(!response.metadata.use_mock_model);
        assert!(response.metadata.mock_engaged);
        assert!(response.metadata.fallback_reason.is_some());
    }

    #[tokio::test]
    async fn test_mock_predictions_are_localized() {
        let service = service(ForecastSettings::default());
        let response = service
            .predict_purchase(&PredictPurchaseRequest::default(), &[])
            .await
            .unwrap();

        let localizer = LabelLocalizer::german();
        let localized: Vec<String> = Vocabulary::default()
            .merchants
            .iter()
            .map(|m| localizer.merchant(m).to_string())
            .collect();
        for top in &response.data.top_predictions {
            assert!(localized.contains(&top.merchant), "{}", top.merchant);
        }
    }

    #[test]
    fn test_failure_response_shape() {
        let failure = FailureResponse::new("boom");
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
        assert_eq!(value["fallbackPrediction"]["insights"]["spendingPattern"], "Moderate spending period");
    }
}
