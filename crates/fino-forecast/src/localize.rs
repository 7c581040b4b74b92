//! 예측 라벨 표시 언어 변환.
//!
//! 어휘 라벨(영문 코드)을 표시용 라벨로 바꿉니다. 번역이 없는 라벨은
//! 그대로 둡니다. 내장 독일어 테이블은 `data/labels_de.json`에 있으며
//! 라벨 JSON 아티팩트로 항목을 추가하거나 덮어쓸 수 있습니다.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

use fino_core::LabelLanguage;

use crate::artifacts::fetch_json;
use crate::types::PredictedTransaction;

const GERMAN_LABELS: &str = include_str!("../data/labels_de.json");

/// 라벨 번역 테이블 JSON 형식.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelTable {
    #[serde(default)]
    pub categories: HashMap<String, String>,
    #[serde(default)]
    pub merchants: HashMap<String, String>,
}

fn builtin_german() -> &'static LabelTable {
    static TABLE: OnceLock<LabelTable> = OnceLock::new();
    TABLE.get_or_init(|| match serde_json::from_str(GERMAN_LABELS) {
        Ok(table) => table,
        Err(e) => {
            warn!("Built-in German label table is invalid: {}", e);
            LabelTable::default()
        }
    })
}

/// 예측 라벨 변환기.
#[derive(Debug, Clone, Default)]
pub struct LabelLocalizer {
    table: LabelTable,
}

impl LabelLocalizer {
    /// 라벨을 바꾸지 않는 변환기.
    pub fn identity() -> Self {
        Self::default()
    }

    /// 내장 독일어 테이블.
    pub fn german() -> Self {
        Self {
            table: builtin_german().clone(),
        }
    }

    /// 언어 설정에 맞는 변환기.
    pub fn for_language(language: LabelLanguage) -> Self {
        match language {
            LabelLanguage::Source => Self::identity(),
            LabelLanguage::German => Self::german(),
        }
    }

    /// 언어 설정과 선택적 라벨 아티팩트로 변환기를 만듭니다.
    ///
    /// 아티팩트 조회에 실패하면 경고 후 내장 테이블만 사용합니다.
    pub async fn load(language: LabelLanguage, labels_uri: Option<&str>) -> Self {
        let mut localizer = Self::for_language(language);
        if language == LabelLanguage::Source {
            return localizer;
        }
        if let Some(uri) = labels_uri {
            match fetch_json::<LabelTable>(uri).await {
                Ok(extra) => {
                    debug!(
                        uri,
                        categories = extra.categories.len(),
                        merchants = extra.merchants.len(),
                        "Label table loaded"
                    );
                    localizer.merge(extra);
                }
                Err(e) => warn!("Failed to load label table, using built-in labels: {}", e),
            }
        }
        localizer
    }

    /// 항목 추가 (같은 키는 덮어씀).
    pub fn merge(&mut self, other: LabelTable) {
        self.table.categories.extend(other.categories);
        self.table.merchants.extend(other.merchants);
    }

    /// 카테고리 표시 라벨.
    pub fn category<'a>(&'a self, label: &'a str) -> &'a str {
        self.table
            .categories
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }

    /// 가맹점 표시 라벨.
    pub fn merchant<'a>(&'a self, label: &'a str) -> &'a str {
        self.table
            .merchants
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }

    /// 예측 목록의 라벨을 변환합니다.
    pub fn localize(&self, predictions: Vec<PredictedTransaction>) -> Vec<PredictedTransaction> {
        predictions
            .into_iter()
            .map(|mut p| {
                p.category = self.category(&p.category).to_string();
                p.merchant = self.merchant(&p.merchant).to_string();
                p
            })
            .collect()
    }
}
