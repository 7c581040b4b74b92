//! 설정 관리.
//!
//! `config/default.toml` 파일과 `FINO__` 접두사 환경 변수에서 설정을 로드합니다.
//! 모든 섹션에 기본값이 있으므로 설정 파일이 없어도 동작합니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{LabelLanguage, ModelTier};
use crate::error::FinoResult;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 예측 엔진 설정
    pub forecast: ForecastSettings,
    /// 거래 원장 소스 설정
    pub ledger: LedgerConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 예측 엔진 설정.
///
/// 시퀀스 모델 차원, 아티팩트 위치, 표시 라벨 언어 등을 정의합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// 기본 모델 티어
    pub tier: ModelTier,
    /// Mock 모델 강제 사용 여부
    pub use_mock: bool,
    /// ONNX 그래프 파일 디렉토리 (`fin-o-{tier}.onnx`)
    pub model_dir: String,
    /// 어휘 JSON 위치 (파일 경로 또는 http(s) URI)
    pub vocab_uri: String,
    /// 스케일러 JSON 위치 (파일 경로 또는 http(s) URI)
    pub scaler_uri: String,
    /// 라벨 번역 JSON 위치 (선택적)
    pub labels_uri: Option<String>,
    /// 예측 결과 라벨 표시 언어
    pub label_language: LabelLanguage,
    /// 모델 입력 거래 수 (L)
    pub sequence_length: usize,
    /// 예측 거래 수 (H)
    pub forecast_horizon: usize,
    /// 카테고리 어휘 크기 (C)
    pub num_categories: usize,
    /// 가맹점 어휘 크기 (M)
    pub num_merchants: usize,
    /// 원장에서 변환할 최대 거래 수
    pub max_history: usize,
    /// 원장이 비어 있을 때 합성 이력 사용 여부
    pub synthesize_empty_history: bool,
    /// Mock 모델 난수 시드 (재현 가능한 출력용)
    pub mock_seed: Option<u64>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            tier: ModelTier::Small,
            use_mock: true,
            model_dir: "public/model".to_string(),
            vocab_uri: "public/model/vocab.json".to_string(),
            scaler_uri: "public/model/scaler.json".to_string(),
            labels_uri: None,
            label_language: LabelLanguage::German,
            sequence_length: 50,
            forecast_horizon: 10,
            num_categories: 41,
            num_merchants: 230,
            max_history: 50,
            synthesize_empty_history: true,
            mock_seed: None,
        }
    }
}

/// 거래 원장 소스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// 사용자별 원장 JSON 디렉토리 (`{dir}/{user_id}.json`)
    pub data_dir: String,
    /// 사용자 파일이 없을 때 사용할 기본 원장 파일
    pub default_file: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/ledger".to_string(),
            default_file: None,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일은 선택 사항입니다. 환경 변수는 `FINO__FORECAST__USE_MOCK=false`처럼
    /// `__`로 섹션을 구분합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> FinoResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("FINO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> FinoResult<Self> {
        Self::load("config/default.toml")
    }
}
