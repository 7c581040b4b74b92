//! 거래 원장 타입.
//!
//! 외부 저장소(대시보드 데이터)에서 읽어 온 사용자 거래 기록입니다.
//! 모델 입력 형식으로의 변환은 `fino-forecast`가 담당합니다.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{FinoError, FinoResult};

/// 원장에 기록된 단일 거래.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    /// 거래 시각 (RFC 3339, `YYYY-MM-DD` 모두 허용)
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub date: DateTime<Utc>,
    /// 금액 (지출은 음수)
    pub amount: Decimal,
    /// 카테고리 이름
    #[serde(default)]
    pub category: String,
    /// 거래 설명 (가맹점 이름)
    #[serde(default)]
    pub description: String,
    /// 거래 직전 잔고
    #[serde(default)]
    pub balance_before: Option<Decimal>,
}

impl LedgerTransaction {
    /// 새 원장 거래 생성.
    pub fn new(
        date: DateTime<Utc>,
        amount: Decimal,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
            description: description.into(),
            balance_before: None,
        }
    }

    /// 거래 직전 잔고 설정.
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance_before = Some(balance);
        self
    }
}

fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid transaction date: {}", raw))
    })
}

/// RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD` 순으로 날짜 파싱을 시도합니다.
pub fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 원장 파일이 가질 수 있는 형태.
#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerFile {
    List(Vec<LedgerTransaction>),
    Dashboard {
        #[serde(rename = "recentTransactions")]
        recent_transactions: Vec<LedgerTransaction>,
    },
    Wrapped {
        transactions: Vec<LedgerTransaction>,
    },
}

/// JSON 파일에서 원장을 로드합니다.
///
/// 거래 배열, `{"recentTransactions": [...]}`, `{"transactions": [...]}` 형식을 지원합니다.
pub fn load_ledger(path: impl AsRef<Path>) -> FinoResult<Vec<LedgerTransaction>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    parse_ledger(&raw).map_err(|e| match e {
        FinoError::Serialization(msg) => {
            FinoError::Serialization(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// JSON 문자열에서 원장을 파싱합니다.
pub fn parse_ledger(raw: &str) -> FinoResult<Vec<LedgerTransaction>> {
    let file: LedgerFile = serde_json::from_str(raw)?;
    Ok(match file {
        LedgerFile::List(list) => list,
        LedgerFile::Dashboard {
            recent_transactions,
        } => recent_transactions,
        LedgerFile::Wrapped { transactions } => transactions,
    })
}
