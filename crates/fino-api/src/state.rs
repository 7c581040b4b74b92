//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 Axum의 State extractor를 통해 핸들러에 주입됩니다.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use fino_forecast::ForecastService;

use crate::source::TransactionSource;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 예측 서비스 - 요청마다 모델 생성, 로드, 예측, 해제
    pub service: Arc<ForecastService>,

    /// 사용자 거래 원장 소스
    pub source: Arc<dyn TransactionSource>,

    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: ForecastService, source: Arc<dyn TransactionSource>) -> Self {
        Self {
            service: Arc::new(service),
            source,
            started_at: Utc::now(),
        }
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

/// 테스트용 상태. 아티팩트와 그래프가 없어 항상 Mock 모델로 예측합니다.
#[cfg(test)]
pub fn create_test_state(source: Arc<dyn TransactionSource>) -> AppState {
    use fino_core::ForecastSettings;
    use fino_forecast::{ArtifactSource, LabelLocalizer, ModelConfig, ModelFactory, RecordConverter};

    let settings = ForecastSettings {
        model_dir: "no/such/models".to_string(),
        vocab_uri: "no/such/vocab.json".to_string(),
        scaler_uri: "no/such/scaler.json".to_string(),
        mock_seed: Some(7),
        ..Default::default()
    };
    let factory = ModelFactory::new(
        &settings.model_dir,
        ArtifactSource {
            vocab_uri: settings.vocab_uri.clone(),
            scaler_uri: settings.scaler_uri.clone(),
            labels_uri: None,
        },
        ModelConfig::default(),
    )
    .with_mock_seed(settings.mock_seed);

    let service = ForecastService::new(
        factory,
        RecordConverter::from_settings(&settings),
        LabelLocalizer::german(),
        settings,
    );
    AppState::new(service, source)
}
