//! ONNX Runtime 기반 시퀀스 모델.
//!
//! 그래프는 다음 텐서를 가져야 합니다:
//! - 입력 `input`: `[1, L, 14]` float32
//! - 입력 `target`: `[1, H, 4]` float32 (추론 시 0으로 채움)
//! - 출력 `amount_output` `[1, H, 1]`, `category_output` `[1, H, C]`,
//!   `merchant_output` `[1, H, M]`
//!
//! `ml` feature 없이 빌드하면 로드는 항상 실패하고 팩토리가 Mock으로 폴백합니다.

use std::path::{Path, PathBuf};

#[cfg(feature = "ml")]
use ort::session::{builder::GraphOptimizationLevel, Session};
#[cfg(feature = "ml")]
use std::sync::Mutex;
use tracing::info;

use super::{ForwardOutput, ModelConfig};
use crate::error::{ForecastError, ForecastResult};
use crate::features::FeatureSequence;

/// 디코더 입력 채널 수.
#[cfg(feature = "ml")]
const TARGET_CHANNELS: usize = 4;

/// ONNX Runtime이 포함된 빌드인지 여부.
pub const ML_RUNTIME_AVAILABLE: bool = cfg!(feature = "ml");

/// 티어별 그래프 파일 이름.
pub fn graph_file_name(tier: fino_core::ModelTier) -> String {
    format!("fin-o-{}.onnx", tier)
}

/// ONNX 그래프를 실행하는 시퀀스 모델.
pub struct RealSequenceModel {
    config: ModelConfig,
    graph_path: PathBuf,
    // 세션 실행에 `&mut`가 필요하므로 뮤텍스로 감쌉니다.
    #[cfg(feature = "ml")]
    session: Mutex<Session>,
}

impl RealSequenceModel {
    /// 그래프를 로드하고 0 입력으로 probe forward를 수행합니다.
    pub fn load(config: ModelConfig, graph_path: impl AsRef<Path>) -> ForecastResult<Self> {
        let graph_path = graph_path.as_ref().to_path_buf();
        config.validate()?;

        if !graph_path.exists() {
            return Err(ForecastError::ModelLoad(format!(
                "Model file not found: {}",
                graph_path.display()
            )));
        }

        let model = Self::open(config, graph_path)?;

        let probe = FeatureSequence::zeros(model.config.sequence_length);
        model
            .forward(&probe)
            .and_then(|out| out.validate(&model.config))
            .map_err(|e| ForecastError::ModelLoad(format!("Probe forward failed: {}", e)))?;

        info!(
            "ONNX sequence model loaded: {} (H={}, C={}, M={})",
            model.graph_path.display(),
            model.config.forecast_horizon,
            model.config.num_categories,
            model.config.num_merchants
        );
        Ok(model)
    }

    #[cfg(feature = "ml")]
    fn open(config: ModelConfig, graph_path: PathBuf) -> ForecastResult<Self> {
        info!("Loading ONNX graph from: {}", graph_path.display());

        let session = Session::builder()
            .map_err(|e| ForecastError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ForecastError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(&graph_path)
            .map_err(|e| ForecastError::ModelLoad(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            config,
            graph_path,
            session: Mutex::new(session),
        })
    }

    #[cfg(not(feature = "ml"))]
    fn open(_config: ModelConfig, graph_path: PathBuf) -> ForecastResult<Self> {
        Err(ForecastError::ModelLoad(format!(
            "ONNX Runtime not available (build with 'ml' feature): {}",
            graph_path.display()
        )))
    }

    /// 모델 설정.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// 그래프 파일 경로.
    pub fn graph_path(&self) -> &Path {
        &self.graph_path
    }

    /// 추론 실행.
    #[cfg(feature = "ml")]
    pub fn forward(&self, input: &FeatureSequence) -> ForecastResult<ForwardOutput> {
        use ort::value::Tensor;

        let h = self.config.forecast_horizon;
        let (rows, cols) = input.shape();

        let input_tensor = Tensor::from_array((
            [1i64, rows as i64, cols as i64],
            input.as_slice().to_vec().into_boxed_slice(),
        ))
        .map_err(|e| ForecastError::Inference(format!("Failed to create input tensor: {}", e)))?;
        let target_tensor = Tensor::from_array((
            [1i64, h as i64, TARGET_CHANNELS as i64],
            vec![0.0f32; h * TARGET_CHANNELS].into_boxed_slice(),
        ))
        .map_err(|e| ForecastError::Inference(format!("Failed to create target tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = session
            .run(ort::inputs!["input" => input_tensor, "target" => target_tensor])
            .map_err(|e| ForecastError::Inference(format!("Inference failed: {}", e)))?;

        let extract = |name: &str| -> ForecastResult<Vec<f32>> {
            let value = outputs
                .get(name)
                .ok_or_else(|| ForecastError::Inference(format!("Missing output tensor: {}", name)))?;
            let (_, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| ForecastError::Inference(format!("Failed to extract {}: {}", name, e)))?;
            Ok(data.to_vec())
        };

        let amounts = extract("amount_output")?;
        let category_logits = extract("category_output")?;
        let merchant_logits = extract("merchant_output")?;

        // 세션 차용 해제
        drop(outputs);

        // 실제 출력 크기에서 C, M을 역산해 검증 단계에서 불일치를 잡습니다.
        let num_categories = if h == 0 { self.config.num_categories } else { category_logits.len() / h };
        let num_merchants = if h == 0 { self.config.num_merchants } else { merchant_logits.len() / h };

        Ok(ForwardOutput {
            horizon: amounts.len(),
            num_categories,
            num_merchants,
            amounts,
            category_logits,
            merchant_logits,
            confidences: None,
        })
    }

    /// 추론 실행.
    #[cfg(not(feature = "ml"))]
    pub fn forward(&self, _input: &FeatureSequence) -> ForecastResult<ForwardOutput> {
        Err(ForecastError::Inference(
            "ONNX Runtime not available (build with 'ml' feature)".to_string(),
        ))
    }

    /// 세션 해제.
    pub fn dispose(self) {
        info!("Releasing ONNX session: {}", self.graph_path.display());
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fino_core::ModelTier;

    #[test]
    fn test_graph_file_name() {
        assert_eq!(graph_file_name(ModelTier::Small), "fin-o-small.onnx");
        assert_eq!(graph_file_name(ModelTier::Large), "fin-o-large.onnx");
    }

    #[test]
    fn test_load_missing_graph() {
        let result = RealSequenceModel::load(ModelConfig::default(), "no/such/fin-o-small.onnx");
        assert!(matches!(result, Err(ForecastError::ModelLoad(_))));
    }

    #[test]
    fn test_load_invalid_graph() {
        let file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        std::fs::write(file.path(), b"not an onnx graph").unwrap();

        let result = RealSequenceModel::load(ModelConfig::default(), file.path());
        assert!(matches!(result, Err(ForecastError::ModelLoad(_))));
    }

    #[test]
    fn test_load_rejects_unknown_architecture() {
        let config = ModelConfig {
            hidden_size: 256,
            ..Default::default()
        };
        let result = RealSequenceModel::load(config, "no/such/graph.onnx");
        assert!(matches!(result, Err(ForecastError::InvalidConfig(_))));
    }
}
