//! 예측 순위화 및 인사이트 집계.
//!
//! `H`개 예측을 신뢰도와 예측 집합 내 빈도로 점수화해 하나의
//! [`PurchaseForecast`]로 요약합니다. 항상 완전한 결과를 반환합니다.

use crate::types::{
    ForecastInsights, MostLikelyPurchase, PredictedTransaction, PurchaseForecast,
    RankedPrediction, SpendingPattern, TopPrediction,
};

/// 결합 점수에서 신뢰도 가중치.
pub const CONFIDENCE_WEIGHT: f64 = 0.7;
/// 결합 점수에서 빈도 가중치.
pub const FREQUENCY_WEIGHT: f64 = 0.3;
/// 상위 예측 최대 개수.
pub const TOP_PREDICTIONS: usize = 5;

/// 예측이 없을 때 사용하는 가맹점 목록.
pub const FALLBACK_MERCHANTS: [&str; 7] = [
    "Migros",
    "Coop",
    "Denner",
    "Starbucks",
    "McDonald's",
    "SBB",
    "Swisscom",
];

/// 예측이 없을 때 사용하는 카테고리 목록.
pub const FALLBACK_CATEGORIES: [&str; 5] = [
    "Lebensmittel",
    "Transport",
    "Restaurants",
    "Shopping",
    "Unterhaltung",
];

/// 삽입 순서를 유지하는 빈도 테이블.
#[derive(Debug, Default, Clone)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    /// 라벨 목록에서 테이블 생성.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::default();
        for label in labels {
            table.increment(label);
        }
        table
    }

    fn increment(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    /// 라벨 빈도 (없으면 0).
    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    /// 가장 빈도가 높은 라벨. 동률이면 먼저 등장한 라벨.
    pub fn most_frequent(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(l, _)| l.as_str())
    }
}

/// 신뢰도와 빈도를 결합한 점수.
///
/// `confidence * 0.7 + ((merchant_freq + category_freq) / 2 / horizon) * 0.3`
pub fn combined_score(
    confidence: f64,
    merchant_freq: usize,
    category_freq: usize,
    horizon: usize,
) -> f64 {
    let frequency_score = (merchant_freq + category_freq) as f64 / 2.0;
    let normalized = if horizon == 0 {
        0.0
    } else {
        frequency_score / horizon as f64
    };
    confidence * CONFIDENCE_WEIGHT + normalized * FREQUENCY_WEIGHT
}

/// 예측에 빈도와 점수를 붙이고 점수 내림차순으로 정렬합니다 (안정 정렬).
pub fn rank_predictions(predictions: &[PredictedTransaction]) -> Vec<RankedPrediction> {
    let horizon = predictions.len();
    let merchants = FrequencyTable::from_labels(predictions.iter().map(|p| p.merchant.as_str()));
    let categories = FrequencyTable::from_labels(predictions.iter().map(|p| p.category.as_str()));

    let mut ranked: Vec<RankedPrediction> = predictions
        .iter()
        .map(|p| {
            let merchant_freq = merchants.get(&p.merchant);
            let category_freq = categories.get(&p.category);
            RankedPrediction {
                prediction: p.clone(),
                frequency: merchant_freq,
                combined_score: combined_score(p.confidence, merchant_freq, category_freq, horizon),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    ranked
}

/// 예측 목록을 하나의 구매 예측으로 요약합니다.
///
/// 예측이 비어 있으면 [`fallback_forecast`]를 반환합니다.
pub fn rank(predictions: &[PredictedTransaction]) -> PurchaseForecast {
    let ranked = rank_predictions(predictions);
    let Some(top) = ranked.first() else {
        return fallback_forecast();
    };

    let most_likely_purchase = MostLikelyPurchase {
        merchant: top.prediction.merchant.clone(),
        category: top.prediction.category.clone(),
        amount: top.prediction.amount.abs(),
        confidence: top.prediction.confidence,
        probability: top.combined_score,
    };

    let top_predictions = ranked
        .iter()
        .take(TOP_PREDICTIONS)
        .map(|r| TopPrediction {
            merchant: r.prediction.merchant.clone(),
            category: r.prediction.category.clone(),
            amount: r.prediction.amount.abs(),
            confidence: r.prediction.confidence,
            frequency: r.frequency,
        })
        .collect();

    PurchaseForecast {
        most_likely_purchase,
        top_predictions,
        insights: insights(predictions),
    }
}

fn insights(predictions: &[PredictedTransaction]) -> ForecastInsights {
    let expenses: Vec<f64> = predictions
        .iter()
        .filter(|p| p.is_expense())
        .map(|p| p.amount.abs())
        .collect();
    let income_count = predictions.iter().filter(|p| p.is_income()).count();

    let total: f64 = expenses.iter().sum();
    let average = if expenses.is_empty() {
        0.0
    } else {
        total / expenses.len() as f64
    };

    let merchants = FrequencyTable::from_labels(predictions.iter().map(|p| p.merchant.as_str()));
    let categories = FrequencyTable::from_labels(predictions.iter().map(|p| p.category.as_str()));

    ForecastInsights {
        total_predicted_spending: round_cents(total),
        average_transaction_amount: round_cents(average),
        most_frequent_category: categories.most_frequent().unwrap_or_default().to_string(),
        most_frequent_merchant: merchants.most_frequent().unwrap_or_default().to_string(),
        spending_pattern: SpendingPattern::classify(expenses.len(), income_count),
    }
}

/// 예측이 없을 때의 고정 대체 결과.
pub fn fallback_forecast() -> PurchaseForecast {
    let merchant = FALLBACK_MERCHANTS[0].to_string();
    let category = FALLBACK_CATEGORIES[0].to_string();

    PurchaseForecast {
        most_likely_purchase: MostLikelyPurchase {
            merchant: merchant.clone(),
            category: category.clone(),
            amount: 75.0,
            confidence: 0.6,
            probability: 0.7,
        },
        top_predictions: vec![TopPrediction {
            merchant: merchant.clone(),
            category: category.clone(),
            amount: 75.0,
            confidence: 0.6,
            frequency: 3,
        }],
        insights: ForecastInsights {
            total_predicted_spending: 450.0,
            average_transaction_amount: 75.0,
            most_frequent_category: category,
            most_frequent_merchant: merchant,
            spending_pattern: SpendingPattern::Moderate,
        },
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
