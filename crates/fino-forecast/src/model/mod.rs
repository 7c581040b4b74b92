//! 시퀀스 모델.
//!
//! [`SequenceModel`]은 ONNX 그래프 기반 `Real`과 의사 난수 `Mock` 두 가지 변형을
//! 가지며 입출력 형태가 동일합니다. 어느 변형을 쓸지는 생성 시점에 결정됩니다.

pub mod mock;
pub mod onnx;

pub use mock::MockSequenceModel;
pub use onnx::{RealSequenceModel, ML_RUNTIME_AVAILABLE};

use fino_core::{ForecastSettings, ModelTier};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};
use crate::features::{FeatureSequence, FEATURE_COUNT};
use crate::types::ModelBackend;

/// 시퀀스 모델 차원 설정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 입력 거래 수 (L)
    pub sequence_length: usize,
    /// 예측 거래 수 (H)
    pub forecast_horizon: usize,
    /// 카테고리 어휘 크기 (C)
    pub num_categories: usize,
    /// 가맹점 어휘 크기 (M)
    pub num_merchants: usize,
    pub embedding_dim: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_tier(ModelTier::Small)
    }
}

impl ModelConfig {
    /// 티어 기본 설정.
    pub fn for_tier(tier: ModelTier) -> Self {
        Self {
            sequence_length: 50,
            forecast_horizon: 10,
            num_categories: 41,
            num_merchants: 230,
            embedding_dim: 128,
            hidden_size: tier.hidden_size(),
            num_layers: tier.num_layers(),
        }
    }

    /// 설정 파일 값으로 차원을 덮어씁니다.
    pub fn from_settings(settings: &ForecastSettings, tier: ModelTier) -> Self {
        Self {
            sequence_length: settings.sequence_length,
            forecast_horizon: settings.forecast_horizon,
            num_categories: settings.num_categories,
            num_merchants: settings.num_merchants,
            ..Self::for_tier(tier)
        }
    }

    /// 같은 차원으로 다른 티어의 설정을 만듭니다.
    pub fn with_tier(&self, tier: ModelTier) -> Self {
        Self {
            hidden_size: tier.hidden_size(),
            num_layers: tier.num_layers(),
            ..self.clone()
        }
    }

    /// (hidden, layers) 조합에 해당하는 티어.
    pub fn tier(&self) -> Option<ModelTier> {
        ModelTier::from_architecture(self.hidden_size, self.num_layers)
    }

    /// 설정 검증.
    pub fn validate(&self) -> ForecastResult<ModelTier> {
        if self.sequence_length == 0 {
            return Err(ForecastError::InvalidConfig(
                "sequence_length must be positive".to_string(),
            ));
        }
        self.tier().ok_or_else(|| {
            ForecastError::InvalidConfig(format!(
                "Unknown architecture: hidden_size={}, num_layers={}",
                self.hidden_size, self.num_layers
            ))
        })
    }
}

/// forward 한 번의 원시 출력.
///
/// 로짓은 스텝별로 행 우선 배치됩니다 (`H × C`, `H × M`).
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutput {
    pub horizon: usize,
    pub num_categories: usize,
    pub num_merchants: usize,
    /// 정규화된 금액 (Mock은 통화 단위)
    pub amounts: Vec<f32>,
    pub category_logits: Vec<f32>,
    pub merchant_logits: Vec<f32>,
    /// 백엔드가 제공한 스텝별 신뢰도
    pub confidences: Option<Vec<f32>>,
}

impl ForwardOutput {
    /// i번째 스텝의 카테고리 로짓.
    pub fn category_logits_at(&self, step: usize) -> &[f32] {
        slice_at(&self.category_logits, step, self.num_categories)
    }

    /// i번째 스텝의 가맹점 로짓.
    pub fn merchant_logits_at(&self, step: usize) -> &[f32] {
        slice_at(&self.merchant_logits, step, self.num_merchants)
    }

    /// 설정된 `H, C, M`과 형태가 일치하는지 확인.
    pub fn validate(&self, config: &ModelConfig) -> ForecastResult<()> {
        let expected = (
            config.forecast_horizon,
            config.num_categories,
            config.num_merchants,
        );
        if (self.horizon, self.num_categories, self.num_merchants) != expected {
            return Err(ForecastError::Inference(format!(
                "Output dimensions (H={}, C={}, M={}) do not match config (H={}, C={}, M={})",
                self.horizon,
                self.num_categories,
                self.num_merchants,
                expected.0,
                expected.1,
                expected.2
            )));
        }

        let h = self.horizon;
        check_len("amount_output", self.amounts.len(), h)?;
        check_len("category_output", self.category_logits.len(), h * self.num_categories)?;
        check_len("merchant_output", self.merchant_logits.len(), h * self.num_merchants)?;
        if let Some(conf) = &self.confidences {
            check_len("confidences", conf.len(), h)?;
        }
        Ok(())
    }
}

fn slice_at(values: &[f32], step: usize, width: usize) -> &[f32] {
    let start = step * width;
    values.get(start..start + width).unwrap_or(&[])
}

fn check_len(name: &str, actual: usize, expected: usize) -> ForecastResult<()> {
    if actual != expected {
        return Err(ForecastError::Inference(format!(
            "{} has {} values, expected {}",
            name, actual, expected
        )));
    }
    Ok(())
}

/// 로드된 시퀀스 모델.
pub enum SequenceModel {
    Real(RealSequenceModel),
    Mock(MockSequenceModel),
}

impl SequenceModel {
    /// 백엔드 종류.
    pub fn backend(&self) -> ModelBackend {
        match self {
            SequenceModel::Real(_) => ModelBackend::Real,
            SequenceModel::Mock(_) => ModelBackend::Mock,
        }
    }

    /// 모델 설정.
    pub fn config(&self) -> &ModelConfig {
        match self {
            SequenceModel::Real(m) => m.config(),
            SequenceModel::Mock(m) => m.config(),
        }
    }

    /// `L × 14` 시퀀스로 forward를 수행합니다.
    pub fn forward(&self, input: &FeatureSequence) -> ForecastResult<ForwardOutput> {
        let config = self.config();
        if input.shape() != (config.sequence_length, FEATURE_COUNT) {
            return Err(ForecastError::Inference(format!(
                "Expected input shape ({}, {}), got {:?}",
                config.sequence_length,
                FEATURE_COUNT,
                input.shape()
            )));
        }

        let output = match self {
            SequenceModel::Real(m) => m.forward(input)?,
            SequenceModel::Mock(m) => m.forward(input),
        };
        output.validate(config)?;
        Ok(output)
    }

    /// 네이티브 리소스 해제.
    pub fn dispose(self) {
        match self {
            SequenceModel::Real(m) => m.dispose(),
            SequenceModel::Mock(_) => {}
        }
    }
}

impl std::fmt::Debug for SequenceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceModel")
            .field("backend", &self.backend())
            .field("config", self.config())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::Vocabulary;

    #[test]
    fn test_config_tiers() {
        let small = ModelConfig::for_tier(ModelTier::Small);
        assert_eq!((small.hidden_size, small.num_layers), (512, 4));
        assert_eq!(small.validate().unwrap(), ModelTier::Small);

        let large = small.with_tier(ModelTier::Large);
        assert_eq!((large.hidden_size, large.num_layers), (1024, 5));
        assert_eq!(large.sequence_length, 50);
    }

    #[test]
    fn test_config_rejects_unknown_architecture() {
        let config = ModelConfig {
            hidden_size: 512,
            num_layers: 5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = ForecastSettings {
            forecast_horizon: 3,
            ..Default::default()
        };
        let config = ModelConfig::from_settings(&settings, ModelTier::Large);
        assert_eq!(config.forecast_horizon, 3);
        assert_eq!(config.tier(), Some(ModelTier::Large));
    }

    #[test]
    fn test_forward_rejects_wrong_input_shape() {
        let config = ModelConfig::default();
        let model = SequenceModel::Mock(MockSequenceModel::new(
            config,
            &Vocabulary::default(),
            Some(1),
        ));
        let err = model.forward(&FeatureSequence::zeros(10)).unwrap_err();
        assert!(matches!(err, ForecastError::Inference(_)));
        assert_eq!(model.backend(), ModelBackend::Mock);
    }

    #[test]
    fn test_output_validate_detects_mismatch() {
        let config = ModelConfig {
            forecast_horizon: 2,
            num_categories: 3,
            num_merchants: 2,
            ..Default::default()
        };
        let mut output = ForwardOutput {
            horizon: 2,
            num_categories: 3,
            num_merchants: 2,
            amounts: vec![0.0; 2],
            category_logits: vec![0.0; 6],
            merchant_logits: vec![0.0; 4],
            confidences: None,
        };
        assert!(output.validate(&config).is_ok());
        assert_eq!(output.category_logits_at(1).len(), 3);

        output.merchant_logits.pop();
        assert!(output.validate(&config).is_err());
    }
}
