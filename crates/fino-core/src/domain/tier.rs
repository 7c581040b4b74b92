//! 모델 티어 및 라벨 언어.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 시퀀스 모델 크기 티어.
///
/// 티어는 로드할 그래프 파일만 결정하며 입출력 인터페이스는 동일합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// hidden 512, 4 레이어
    #[default]
    Small,
    /// hidden 1024, 5 레이어
    Large,
}

impl ModelTier {
    /// LSTM hidden 크기.
    pub fn hidden_size(&self) -> usize {
        match self {
            ModelTier::Small => 512,
            ModelTier::Large => 1024,
        }
    }

    /// LSTM 레이어 수.
    pub fn num_layers(&self) -> usize {
        match self {
            ModelTier::Small => 4,
            ModelTier::Large => 5,
        }
    }

    /// (hidden, layers) 조합에서 티어를 찾습니다. 알 수 없는 조합이면 `None`.
    pub fn from_architecture(hidden_size: usize, num_layers: usize) -> Option<Self> {
        match (hidden_size, num_layers) {
            (512, 4) => Some(ModelTier::Small),
            (1024, 5) => Some(ModelTier::Large),
            _ => None,
        }
    }

    /// 소문자 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Small => "small",
            ModelTier::Large => "large",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(ModelTier::Small),
            "large" => Ok(ModelTier::Large),
            _ => Err(format!("Unknown model tier: {}. Supported: small, large", s)),
        }
    }
}

/// 예측 결과에 표시할 라벨 언어.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLanguage {
    /// 어휘 원본 라벨 (영문 코드)
    Source,
    /// 독일어 표시 라벨
    #[default]
    German,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_architecture() {
        assert_eq!(ModelTier::Small.hidden_size(), 512);
        assert_eq!(ModelTier::Large.num_layers(), 5);
        assert_eq!(ModelTier::from_architecture(1024, 5), Some(ModelTier::Large));
        assert_eq!(ModelTier::from_architecture(512, 5), None);
    }

    #[test]
    fn test_tier_parse_and_display() {
        assert_eq!("LARGE".parse::<ModelTier>().unwrap(), ModelTier::Large);
        assert!("medium".parse::<ModelTier>().is_err());
        assert_eq!(ModelTier::Small.to_string(), "small");
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&ModelTier::Large).unwrap();
        assert_eq!(json, "\"large\"");
        let lang: LabelLanguage = serde_json::from_str("\"source\"").unwrap();
        assert_eq!(lang, LabelLanguage::Source);
    }
}
