//! 거래 이력을 고정 크기 feature 행렬로 인코딩.
//!
//! 모델은 항상 `L × 14` 행렬을 입력으로 받습니다. 이력이 길면 최근 `L`개만,
//! 짧으면 마지막 레코드를 반복해 채웁니다.

use crate::types::TransactionRecord;

/// 레코드당 feature 수.
pub const FEATURE_COUNT: usize = 14;

/// 열 순서대로의 feature 이름.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "amount",
    "balance_before",
    "category_id",
    "merchant_id",
    "time_delta",
    "time_delta_category",
    "time_delta_merchant",
    "avg_amount_merchant",
    "day_of_week_sin",
    "day_of_week_cos",
    "day_of_month_sin",
    "day_of_month_cos",
    "month_of_year_sin",
    "month_of_year_cos",
];

/// 행 우선(row-major) `rows × 14` f32 행렬.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSequence {
    rows: usize,
    values: Vec<f32>,
}

impl FeatureSequence {
    /// 모든 값이 0인 시퀀스 생성.
    pub fn zeros(rows: usize) -> Self {
        Self {
            rows,
            values: vec![0.0; rows * FEATURE_COUNT],
        }
    }

    /// 원시 값에서 생성. 길이가 `rows * 14`가 아니면 `None`.
    pub fn from_values(rows: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == rows * FEATURE_COUNT).then_some(Self { rows, values })
    }

    /// (행, 열) 형태.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, FEATURE_COUNT)
    }

    /// 행 수.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// i번째 행. 범위를 벗어나면 `None`.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * FEATURE_COUNT;
        Some(&self.values[start..start + FEATURE_COUNT])
    }

    /// 평탄화된 값.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// 소유권을 넘겨받아 평탄화된 값 반환.
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

impl TransactionRecord {
    /// 레코드를 14개 feature로 변환합니다.
    ///
    /// 카테고리/가맹점 id는 `[0, size-1]`로 클램프되며 어휘 크기가 0이면 0이 됩니다.
    pub fn to_features(&self, num_categories: usize, num_merchants: usize) -> [f32; FEATURE_COUNT] {
        [
            self.amount as f32,
            self.balance_before as f32,
            clamp_id(self.category_id, num_categories) as f32,
            clamp_id(self.merchant_id, num_merchants) as f32,
            self.time_delta as f32,
            self.time_delta_category as f32,
            self.time_delta_merchant as f32,
            self.avg_amount_merchant as f32,
            self.day_of_week_sin as f32,
            self.day_of_week_cos as f32,
            self.day_of_month_sin as f32,
            self.day_of_month_cos as f32,
            self.month_of_year_sin as f32,
            self.month_of_year_cos as f32,
        ]
    }
}

/// id를 어휘 범위로 클램프.
pub fn clamp_id(id: i64, vocab_size: usize) -> usize {
    if vocab_size == 0 || id <= 0 {
        return 0;
    }
    (id as u64).min(vocab_size as u64 - 1) as usize
}

/// 이력을 `sequence_length × 14` 행렬로 인코딩합니다.
///
/// 모든 길이(0 포함)에 대해 실패하지 않습니다.
pub fn encode(
    history: &[TransactionRecord],
    sequence_length: usize,
    num_categories: usize,
    num_merchants: usize,
) -> FeatureSequence {
    let tail = if history.len() > sequence_length {
        &history[history.len() - sequence_length..]
    } else {
        history
    };

    let pad = tail.last().copied().unwrap_or_default();

    let mut values = Vec::with_capacity(sequence_length * FEATURE_COUNT);
    for record in tail.iter().chain(std::iter::repeat(&pad)).take(sequence_length) {
        values.extend_from_slice(&record.to_features(num_categories, num_merchants));
    }

    FeatureSequence {
        rows: sequence_length,
        values,
    }
}
