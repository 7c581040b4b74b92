//! 예측 파이프라인의 공통 타입.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 모델 입력용 거래 레코드.
///
/// 14개 feature 필드를 가지며 [`crate::features::encode`]에서 이 순서대로
/// 행렬 열에 배치됩니다. 카테고리/가맹점 id는 인코딩 시 어휘 범위로 클램프됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: f64,
    pub balance_before: f64,
    pub category_id: i64,
    pub merchant_id: i64,
    /// 직전 거래 이후 경과 시간 (초)
    pub time_delta: f64,
    /// 같은 카테고리 직전 거래 이후 경과 시간 (초)
    pub time_delta_category: f64,
    /// 같은 가맹점 직전 거래 이후 경과 시간 (초)
    pub time_delta_merchant: f64,
    /// 가맹점 평균 거래 금액
    pub avg_amount_merchant: f64,
    pub day_of_week_sin: f64,
    pub day_of_week_cos: f64,
    pub day_of_month_sin: f64,
    pub day_of_month_cos: f64,
    pub month_of_year_sin: f64,
    pub month_of_year_cos: f64,
}

/// 디코딩된 단일 예측 거래.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedTransaction {
    /// 통화 단위 금액 (지출은 음수)
    pub amount: f64,
    /// 카테고리 라벨
    pub category: String,
    /// 가맹점 라벨
    pub merchant: String,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
}

impl PredictedTransaction {
    /// 새 예측 거래 생성. 신뢰도는 [0, 1]로 클램프되며 NaN은 0이 됩니다.
    pub fn new(
        amount: f64,
        category: impl Into<String>,
        merchant: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            merchant: merchant.into(),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
        }
    }

    /// 지출 예측인지 확인.
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// 수입 예측인지 확인.
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

/// 빈도와 결합 점수가 붙은 예측.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPrediction {
    pub prediction: PredictedTransaction,
    /// 예측 집합 안에서 같은 가맹점이 등장한 횟수
    pub frequency: usize,
    /// 신뢰도/빈도 결합 점수
    pub combined_score: f64,
}

/// 가장 가능성 높은 다음 구매.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MostLikelyPurchase {
    pub merchant: String,
    pub category: String,
    /// 절대 금액
    pub amount: f64,
    pub confidence: f64,
    /// 결합 점수
    pub probability: f64,
}

/// 상위 예측 요약 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPrediction {
    pub merchant: String,
    pub category: String,
    /// 절대 금액
    pub amount: f64,
    pub confidence: f64,
    pub frequency: usize,
}

/// 예측 기간의 지출 성향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpendingPattern {
    /// 지출 건수가 수입 건수의 2배 초과
    #[serde(rename = "High spending period")]
    HighSpending,
    /// 수입 건수가 지출 건수보다 많음
    #[serde(rename = "Income-heavy period")]
    IncomeHeavy,
    #[serde(rename = "Balanced period")]
    Balanced,
    /// 예측이 없을 때의 대체 응답 전용
    #[serde(rename = "Moderate spending period")]
    Moderate,
}

impl SpendingPattern {
    /// 지출/수입 건수로 분류합니다.
    pub fn classify(expense_count: usize, income_count: usize) -> Self {
        if expense_count > income_count * 2 {
            SpendingPattern::HighSpending
        } else if income_count > expense_count {
            SpendingPattern::IncomeHeavy
        } else {
            SpendingPattern::Balanced
        }
    }

    /// 표시 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendingPattern::HighSpending => "High spending period",
            SpendingPattern::IncomeHeavy => "Income-heavy period",
            SpendingPattern::Balanced => "Balanced period",
            SpendingPattern::Moderate => "Moderate spending period",
        }
    }
}

impl fmt::Display for SpendingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 예측 요약 인사이트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInsights {
    pub total_predicted_spending: f64,
    pub average_transaction_amount: f64,
    pub most_frequent_category: String,
    pub most_frequent_merchant: String,
    pub spending_pattern: SpendingPattern,
}

/// 순위화된 구매 예측 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseForecast {
    pub most_likely_purchase: MostLikelyPurchase,
    /// 최대 5개
    pub top_predictions: Vec<TopPrediction>,
    pub insights: ForecastInsights,
}

/// 실제로 forward를 수행한 모델 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// ONNX 그래프
    Real,
    /// 의사 난수 Mock
    Mock,
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBackend::Real => f.write_str("real"),
            ModelBackend::Mock => f.write_str("mock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spending_pattern_classify() {
        assert_eq!(SpendingPattern::classify(5, 1), SpendingPattern::HighSpending);
        assert_eq!(SpendingPattern::classify(2, 3), SpendingPattern::IncomeHeavy);
        assert_eq!(SpendingPattern::classify(2, 2), SpendingPattern::Balanced);
        // 경계: 정확히 2배는 high가 아님
        assert_eq!(SpendingPattern::classify(4, 2), SpendingPattern::Balanced);
        assert_eq!(SpendingPattern::classify(0, 0), SpendingPattern::Balanced);
    }

    #[test]
    fn test_spending_pattern_serde() {
        let json = serde_json::to_string(&SpendingPattern::IncomeHeavy).unwrap();
        assert_eq!(json, "\"Income-heavy period\"");
        assert_eq!(SpendingPattern::Moderate.to_string(), "Moderate spending period");
    }

    #[test]
    fn test_predicted_transaction_clamps_confidence() {
        let pred = PredictedTransaction::new(-20.0, "FOOD", "Migros", 1.4);
        assert_eq!(pred.confidence, 1.0);
        assert!(pred.is_expense());
        assert!(!pred.is_income());

        let pred = PredictedTransaction::new(-20.0, "FOOD", "Migros", f64::NAN);
        assert_eq!(pred.confidence, 0.0);
    }

    #[test]
    fn test_forecast_serializes_camel_case() {
        let purchase = MostLikelyPurchase {
            merchant: "Coop".to_string(),
            category: "Lebensmittel".to_string(),
            amount: 12.0,
            confidence: 0.8,
            probability: 0.71,
        };
        let value = serde_json::to_value(&purchase).unwrap();
        assert_eq!(value["merchant"], "Coop");
        assert!(value.get("probability").is_some());

        let insights = ForecastInsights {
            total_predicted_spending: 1.0,
            average_transaction_amount: 1.0,
            most_frequent_category: "a".to_string(),
            most_frequent_merchant: "b".to_string(),
            spending_pattern: SpendingPattern::Balanced,
        };
        let value = serde_json::to_value(&insights).unwrap();
        assert_eq!(value["spendingPattern"], "Balanced period");
        assert!(value.get("totalPredictedSpending").is_some());
    }
}
