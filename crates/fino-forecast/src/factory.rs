//! 모델 팩토리 및 라이프사이클 관리.
//!
//! [`ModelFactory::create`]는 로드되지 않은 [`ForecastModel`]을 반환합니다.
//! `load()`에서 Real 모델 로드가 실패하면 경고를 남기고 Mock으로 대체하며,
//! 이 사실은 상태 채널([`ForecastModel::subscribe_status`])로 관찰할 수 있습니다.
//!
//! ```text
//! Unloaded ──load()──▶ Ready ──dispose()──▶ Disposed
//!     │                                        ▲
//!     └───────────────dispose()────────────────┘
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, instrument, warn};

use fino_core::{ForecastSettings, ModelTier};

use crate::artifacts::{ArtifactSource, ModelArtifacts};
use crate::decoder::decode;
use crate::error::{ForecastError, ForecastResult};
use crate::features::encode;
use crate::model::onnx::graph_file_name;
use crate::model::{MockSequenceModel, ModelConfig, RealSequenceModel, SequenceModel};
use crate::ranker::rank;
use crate::types::{ModelBackend, PredictedTransaction, PurchaseForecast, TransactionRecord};

/// 모델 라이프사이클 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Unloaded,
    Ready,
    Disposed,
}

/// 모델 상태 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub tier: ModelTier,
    /// 호출자가 Mock을 요청했는지
    pub mock_requested: bool,
    /// 실제로 로드된 백엔드 (로드 전에는 `None`)
    pub backend: Option<ModelBackend>,
    /// Real 로드 실패로 Mock을 사용하게 된 이유
    pub fallback_reason: Option<String>,
    pub lifecycle: Lifecycle,
}

impl ModelStatus {
    /// Mock 백엔드가 사용되는지 확인.
    pub fn mock_engaged(&self) -> bool {
        self.backend == Some(ModelBackend::Mock)
    }
}

struct LoadedModel {
    // 블로킹 추론 태스크와 공유합니다.
    model: Arc<SequenceModel>,
    artifacts: Arc<ModelArtifacts>,
}

enum ModelState {
    Unloaded,
    Ready(LoadedModel),
    Disposed,
}

/// 티어와 Mock 여부로 예측 모델을 만드는 팩토리.
#[derive(Debug, Clone)]
pub struct ModelFactory {
    model_dir: PathBuf,
    artifacts: ArtifactSource,
    base_config: ModelConfig,
    mock_seed: Option<u64>,
}

impl Default for ModelFactory {
    fn default() -> Self {
        Self::from_settings(&ForecastSettings::default())
    }
}

impl ModelFactory {
    /// 새 팩토리 생성.
    pub fn new(
        model_dir: impl Into<PathBuf>,
        artifacts: ArtifactSource,
        base_config: ModelConfig,
    ) -> Self {
        Self {
            model_dir: model_dir.into(),
            artifacts,
            base_config,
            mock_seed: None,
        }
    }

    /// 설정에서 팩토리 생성.
    pub fn from_settings(settings: &ForecastSettings) -> Self {
        Self {
            model_dir: PathBuf::from(&settings.model_dir),
            artifacts: ArtifactSource {
                vocab_uri: settings.vocab_uri.clone(),
                scaler_uri: settings.scaler_uri.clone(),
                labels_uri: settings.labels_uri.clone(),
            },
            base_config: ModelConfig::from_settings(settings, settings.tier),
            mock_seed: settings.mock_seed,
        }
    }

    /// Mock 난수 시드 설정.
    pub fn with_mock_seed(mut self, seed: Option<u64>) -> Self {
        self.mock_seed = seed;
        self
    }

    /// 아티팩트 위치.
    pub fn artifact_source(&self) -> &ArtifactSource {
        &self.artifacts
    }

    /// 티어의 그래프 파일 경로.
    pub fn graph_path(&self, tier: ModelTier) -> PathBuf {
        self.model_dir.join(graph_file_name(tier))
    }

    /// 로드되지 않은 모델 생성.
    pub fn create(&self, tier: ModelTier, mock: bool) -> ForecastModel {
        let status = ModelStatus {
            tier,
            mock_requested: mock,
            backend: None,
            fallback_reason: None,
            lifecycle: Lifecycle::Unloaded,
        };
        let (status_tx, _) = watch::channel(status);

        ForecastModel {
            tier,
            mock_requested: mock,
            config: self.base_config.with_tier(tier),
            graph_path: self.graph_path(tier),
            artifact_source: self.artifacts.clone(),
            mock_seed: self.mock_seed,
            state: RwLock::new(ModelState::Unloaded),
            status_tx,
        }
    }
}

/// 로드/예측/해제 라이프사이클을 가진 예측 모델.
///
/// `predict()`는 읽기 잠금, `load()`/`dispose()`는 쓰기 잠금을 사용합니다.
pub struct ForecastModel {
    tier: ModelTier,
    mock_requested: bool,
    config: ModelConfig,
    graph_path: PathBuf,
    artifact_source: ArtifactSource,
    mock_seed: Option<u64>,
    state: RwLock<ModelState>,
    status_tx: watch::Sender<ModelStatus>,
}

impl ForecastModel {
    /// 모델 티어.
    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    /// 모델 설정.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// 그래프 파일 경로.
    pub fn graph_path(&self) -> &Path {
        &self.graph_path
    }

    /// 현재 상태.
    pub fn status(&self) -> ModelStatus {
        self.status_tx.borrow().clone()
    }

    /// 상태 변경 구독.
    pub fn subscribe_status(&self) -> watch::Receiver<ModelStatus> {
        self.status_tx.subscribe()
    }

    /// 모델과 아티팩트를 로드합니다.
    ///
    /// 이미 로드되었으면 아무 것도 하지 않습니다. Real 로드가 실패하면 Mock으로
    /// 대체하므로 설정 오류가 아닌 한 실패하지 않습니다.
    #[instrument(skip(self), fields(tier = %self.tier, mock = self.mock_requested))]
    pub async fn load(&self) -> ForecastResult<()> {
        let mut state = self.state.write().await;
        match *state {
            ModelState::Ready(_) => return Ok(()),
            ModelState::Disposed => return Err(ForecastError::UseAfterDispose),
            ModelState::Unloaded => {}
        }

        self.config.validate()?;

        let (model, fallback_reason) = if self.mock_requested {
            (None, None)
        } else {
            match self.load_real().await {
                Ok(real) => (Some(real), None),
                Err(e) if e.is_recoverable() => {
                    warn!("Failed to load real model, falling back to mock: {}", e);
                    (None, Some(e.to_string()))
                }
                Err(e) => return Err(e),
            }
        };

        let loaded = match model {
            Some(real) => {
                let artifacts = self.artifact_source.load(true).await;
                LoadedModel {
                    model: Arc::new(SequenceModel::Real(real)),
                    artifacts: Arc::new(artifacts),
                }
            }
            None => {
                let artifacts = self.artifact_source.load(false).await;
                let mock =
                    MockSequenceModel::new(self.config.clone(), &artifacts.vocabulary, self.mock_seed);
                LoadedModel {
                    model: Arc::new(SequenceModel::Mock(mock)),
                    artifacts: Arc::new(artifacts),
                }
            }
        };

        let backend = loaded.model.backend();
        *state = ModelState::Ready(loaded);

        info!(backend = %backend, "Forecast model loaded");
        self.status_tx.send_modify(|status| {
            status.backend = Some(backend);
            status.fallback_reason = fallback_reason;
            status.lifecycle = Lifecycle::Ready;
        });
        Ok(())
    }

    async fn load_real(&self) -> ForecastResult<RealSequenceModel> {
        let config = self.config.clone();
        let path = self.graph_path.clone();
        tokio::task::spawn_blocking(move || RealSequenceModel::load(config, path))
            .await
            .map_err(|e| ForecastError::ModelLoad(format!("Model load task failed: {}", e)))?
    }

    /// 이력에서 `H`개의 예측 거래를 생성합니다.
    ///
    /// Real 백엔드의 forward는 블로킹 스레드에서 실행되며, 그동안 읽기 잠금을
    /// 유지하므로 `dispose()`는 진행 중인 예측이 끝난 뒤에 실행됩니다.
    pub async fn predict(
        &self,
        history: &[TransactionRecord],
    ) -> ForecastResult<Vec<PredictedTransaction>> {
        let state = self.state.read().await;
        let loaded = match &*state {
            ModelState::Ready(loaded) => loaded,
            ModelState::Unloaded => return Err(ForecastError::NotLoaded),
            ModelState::Disposed => return Err(ForecastError::UseAfterDispose),
        };

        let input = encode(
            history,
            self.config.sequence_length,
            self.config.num_categories,
            self.config.num_merchants,
        );
        let output = match &*loaded.model {
            SequenceModel::Real(_) => {
                let model = Arc::clone(&loaded.model);
                tokio::task::spawn_blocking(move || model.forward(&input))
                    .await
                    .map_err(|e| ForecastError::Inference(format!("Inference task failed: {}", e)))??
            }
            SequenceModel::Mock(_) => loaded.model.forward(&input)?,
        };
        let artifacts = &loaded.artifacts;
        Ok(decode(&output, &artifacts.vocabulary, artifacts.scaler.as_ref()))
    }

    /// 예측 후 순위화까지 수행합니다.
    pub async fn forecast(&self, history: &[TransactionRecord]) -> ForecastResult<PurchaseForecast> {
        let predictions = self.predict(history).await?;
        Ok(rank(&predictions))
    }

    /// 로드된 아티팩트.
    pub async fn artifacts(&self) -> Option<Arc<ModelArtifacts>> {
        match &*self.state.read().await {
            ModelState::Ready(loaded) => Some(Arc::clone(&loaded.artifacts)),
            _ => None,
        }
    }

    /// 리소스를 해제합니다. 여러 번 호출해도 안전하며 이후 모든 사용은 실패합니다.
    #[instrument(skip(self), fields(tier = %self.tier))]
    pub async fn dispose(&self) {
        let mut state = self.state.write().await;
        let previous = std::mem::replace(&mut *state, ModelState::Disposed);
        match previous {
            ModelState::Ready(loaded) => {
                match Arc::try_unwrap(loaded.model) {
                    Ok(model) => model.dispose(),
                    // 취소된 예측의 블로킹 태스크가 아직 참조 중이면 그 태스크가 끝날 때 해제됩니다.
                    Err(_) => warn!("Inference task still running, session released on completion"),
                }
                info!("Forecast model disposed");
            }
            ModelState::Unloaded => info!("Forecast model disposed before load"),
            ModelState::Disposed => return,
        }

        self.status_tx.send_modify(|status| {
            status.lifecycle = Lifecycle::Disposed;
        });
    }
}

impl std::fmt::Debug for ForecastModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastModel")
            .field("tier", &self.tier)
            .field("mock_requested", &self.mock_requested)
            .field("graph_path", &self.graph_path)
            .finish()
    }
}
