//! 모델 아티팩트 (어휘, 스케일러) 로드.
//!
//! 아티팩트는 파일 경로 또는 `http(s)://` URI에서 읽습니다. 조회에 실패하면
//! 경고를 남기고 내장 기본값을 사용하므로 로드는 항상 성공합니다.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ForecastError, ForecastResult};

/// 카테고리/가맹점 라벨 어휘.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub categories: Vec<String>,
    pub merchants: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let categories = [
            "GENERAL_EXPENSES_DAILY",
            "SHOPPING_JEWELRY",
            "INCOME_GENERAL",
            "HEALTHCARE_GENERAL",
            "P2P_TRANSFER",
            "BANK_FEE",
            "INSURANCE",
            "ENTERTAINMENT_STREAMING",
            "HEALTH_INSURANCE",
            "TRANSPORTATION_PUBLIC",
            "CASH_WITHDRAWAL",
            "HOUSING_GENERAL",
            "UTILITIES_GENERAL",
        ];
        let merchants = [
            "Coop",
            "Swiss Company",
            "Local Bank Salary",
            "Swica Insurance",
            "Volg",
            "Online Bookstore",
            "YouTube Premium",
            "Local Bank Mobile",
            "Migros",
            "Swica",
            "Tram Monthly Pass",
            "Raiffeisen ATM",
            "Livit AG",
        ];
        Self {
            categories: categories.iter().map(|s| s.to_string()).collect(),
            merchants: merchants.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Vocabulary {
    /// 카테고리 라벨 조회.
    pub fn category(&self, index: usize) -> Option<&str> {
        self.categories.get(index).map(String::as_str)
    }

    /// 가맹점 라벨 조회.
    pub fn merchant(&self, index: usize) -> Option<&str> {
        self.merchants.get(index).map(String::as_str)
    }
}

/// 금액 정규화에 사용된 표준 스케일러 파라미터.
///
/// 금액은 0번 feature이므로 역변환에는 `scale_[0]`, `mean_[0]`만 사용합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    #[serde(rename = "scale_")]
    pub scale: Vec<f64>,
    #[serde(rename = "mean_")]
    pub mean: Vec<f64>,
}

impl Default for Scaler {
    fn default() -> Self {
        Self {
            scale: vec![1.0; 12],
            mean: vec![0.0; 12],
        }
    }
}

impl Scaler {
    /// 정규화된 금액을 통화 단위로 되돌립니다.
    ///
    /// 파라미터가 비어 있으면 값을 그대로 반환합니다.
    pub fn inverse_transform_amount(&self, normalized: f64) -> f64 {
        match (self.scale.first(), self.mean.first()) {
            (Some(scale), Some(mean)) => normalized * scale + mean,
            _ => normalized,
        }
    }
}

/// 아티팩트 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactOrigin {
    /// 설정된 위치에서 읽음
    Fetched,
    /// 조회 실패로 내장 기본값 사용
    Default,
}

/// 로드된 모델 아티팩트. 로드 후 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub vocabulary: Vocabulary,
    /// Mock 백엔드는 스케일러 없이 동작
    pub scaler: Option<Scaler>,
    pub vocabulary_origin: ArtifactOrigin,
    pub scaler_origin: Option<ArtifactOrigin>,
}

impl ModelArtifacts {
    /// 내장 어휘만 가진 아티팩트.
    pub fn defaults() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            scaler: None,
            vocabulary_origin: ArtifactOrigin::Default,
            scaler_origin: None,
        }
    }
}

/// 아티팩트 위치.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSource {
    pub vocab_uri: String,
    pub scaler_uri: String,
    pub labels_uri: Option<String>,
}

impl Default for ArtifactSource {
    fn default() -> Self {
        Self {
            vocab_uri: "public/model/vocab.json".to_string(),
            scaler_uri: "public/model/scaler.json".to_string(),
            labels_uri: None,
        }
    }
}

impl ArtifactSource {
    /// 어휘와 (요청 시) 스케일러를 로드합니다.
    pub async fn load(&self, with_scaler: bool) -> ModelArtifacts {
        let (vocabulary, vocabulary_origin) = load_vocabulary(&self.vocab_uri).await;
        let (scaler, scaler_origin) = if with_scaler {
            let (scaler, origin) = load_scaler(&self.scaler_uri).await;
            (Some(scaler), Some(origin))
        } else {
            (None, None)
        };

        ModelArtifacts {
            vocabulary,
            scaler,
            vocabulary_origin,
            scaler_origin,
        }
    }
}

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// URI에서 JSON 아티팩트를 읽어 역직렬화합니다.
pub async fn fetch_json<T: DeserializeOwned>(uri: &str) -> ForecastResult<T> {
    let body = if is_remote(uri) {
        let response = reqwest::get(uri)
            .await
            .map_err(|e| ForecastError::ArtifactFetch(format!("{}: {}", uri, e)))?;
        if !response.status().is_success() {
            return Err(ForecastError::ArtifactFetch(format!(
                "{}: HTTP {}",
                uri,
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| ForecastError::ArtifactFetch(format!("{}: {}", uri, e)))?
    } else {
        tokio::fs::read_to_string(uri)
            .await
            .map_err(|e| ForecastError::ArtifactFetch(format!("{}: {}", uri, e)))?
    };

    serde_json::from_str(&body)
        .map_err(|e| ForecastError::ArtifactFetch(format!("{}: invalid JSON: {}", uri, e)))
}

/// 어휘 로드. 실패하면 기본 어휘.
pub async fn load_vocabulary(uri: &str) -> (Vocabulary, ArtifactOrigin) {
    match fetch_json::<Vocabulary>(uri).await {
        Ok(vocab) => {
            debug!(
                uri,
                categories = vocab.categories.len(),
                merchants = vocab.merchants.len(),
                "Vocabulary loaded"
            );
            (vocab, ArtifactOrigin::Fetched)
        }
        Err(e) => {
            warn!("Failed to load vocabulary, using defaults: {}", e);
            (Vocabulary::default(), ArtifactOrigin::Default)
        }
    }
}

/// 스케일러 로드. 실패하면 항등 스케일러.
pub async fn load_scaler(uri: &str) -> (Scaler, ArtifactOrigin) {
    match fetch_json::<Scaler>(uri).await {
        Ok(scaler) => {
            debug!(uri, "Scaler loaded");
            (scaler, ArtifactOrigin::Fetched)
        }
        Err(e) => {
            warn!("Failed to load scaler, using defaults: {}", e);
            (Scaler::default(), ArtifactOrigin::Default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scaler_inverse_transform() {
        let scaler = Scaler {
            scale: vec![2.0],
            mean: vec![5.0],
        };
        assert_eq!(scaler.inverse_transform_amount(1.0), 7.0);

        let empty = Scaler {
            scale: vec![],
            mean: vec![],
        };
        assert_eq!(empty.inverse_transform_amount(1.5), 1.5);
        assert_eq!(Scaler::default().inverse_transform_amount(3.0), 3.0);
    }

    #[test]
    fn test_default_vocabulary() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.categories.len(), 13);
        assert_eq!(vocab.merchants.len(), 13);
        assert_eq!(vocab.category(0), Some("GENERAL_EXPENSES_DAILY"));
        assert_eq!(vocab.merchant(8), Some("Migros"));
        assert_eq!(vocab.merchant(13), None);
    }

    #[tokio::test]
    async fn test_load_vocabulary_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"categories":["A","B"],"merchants":["M"]}}"#).unwrap();

        let (vocab, origin) = load_vocabulary(file.path().to_str().unwrap()).await;
        assert_eq!(origin, ArtifactOrigin::Fetched);
        assert_eq!(vocab.categories, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_missing_artifacts_fall_back_to_defaults() {
        let source = ArtifactSource {
            vocab_uri: "no/such/vocab.json".to_string(),
            scaler_uri: "no/such/scaler.json".to_string(),
            labels_uri: None,
        };
        let artifacts = source.load(true).await;
        assert_eq!(artifacts.vocabulary_origin, ArtifactOrigin::Default);
        assert_eq!(artifacts.scaler_origin, Some(ArtifactOrigin::Default));
        assert_eq!(artifacts.scaler, Some(Scaler::default()));

        let mock_artifacts = source.load(false).await;
        assert!(mock_artifacts.scaler.is_none());
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let mut server = mockito::Server::new_async().await;
        let vocab_mock = server
            .mock("GET", "/model/vocab.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"categories":["FOOD"],"merchants":["Migros","Coop"]}"#)
            .create_async()
            .await;
        let scaler_mock = server
            .mock("GET", "/model/scaler.json")
            .with_status(404)
            .create_async()
            .await;

        let source = ArtifactSource {
            vocab_uri: format!("{}/model/vocab.json", server.url()),
            scaler_uri: format!("{}/model/scaler.json", server.url()),
            labels_uri: None,
        };
        let artifacts = source.load(true).await;

        vocab_mock.assert_async().await;
        scaler_mock.assert_async().await;
        assert_eq!(artifacts.vocabulary_origin, ArtifactOrigin::Fetched);
        assert_eq!(artifacts.vocabulary.merchants, vec!["Migros", "Coop"]);
        assert_eq!(artifacts.scaler_origin, Some(ArtifactOrigin::Default));
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_invalid_body() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = fetch_json::<Scaler>(file.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(ForecastError::ArtifactFetch(_))));
    }
}
