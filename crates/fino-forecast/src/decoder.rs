//! 모델 원시 출력을 라벨이 붙은 예측으로 디코딩.

use tracing::debug;

use crate::artifacts::{Scaler, Vocabulary};
use crate::model::ForwardOutput;
use crate::types::PredictedTransaction;

/// Real 모델 경로에서 사용하는 고정 신뢰도.
///
/// 그래프가 스텝별 신뢰도를 출력하지 않으므로 상수를 사용합니다.
/// 로짓 기반 보정이 가능해지면 이 값을 대체해야 합니다.
pub const REAL_MODEL_CONFIDENCE: f32 = 0.8;

/// 어휘 범위를 벗어난 인덱스의 라벨.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// 최댓값 인덱스.
///
/// 동률이면 가장 낮은 인덱스, NaN은 선택되지 않으며 빈 슬라이스는 0입니다.
pub fn argmax(values: &[f32]) -> usize {
    let mut best_index = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best_value = v;
            best_index = i;
        }
    }
    best_index
}

/// forward 출력을 `H`개의 예측 거래로 디코딩합니다.
///
/// 금액은 스케일러가 있으면 역변환하고, 신뢰도는 백엔드가 제공하지 않으면
/// [`REAL_MODEL_CONFIDENCE`]를 사용합니다.
pub fn decode(
    output: &ForwardOutput,
    vocabulary: &Vocabulary,
    scaler: Option<&Scaler>,
) -> Vec<PredictedTransaction> {
    (0..output.horizon)
        .map(|step| {
            let category_index = argmax(output.category_logits_at(step));
            let merchant_index = argmax(output.merchant_logits_at(step));

            let category = vocabulary.category(category_index).unwrap_or(UNKNOWN_LABEL);
            let merchant = vocabulary.merchant(merchant_index).unwrap_or(UNKNOWN_LABEL);

            let normalized = output.amounts.get(step).copied().unwrap_or(0.0) as f64;
            let amount = match scaler {
                Some(s) => s.inverse_transform_amount(normalized),
                None => normalized,
            };

            let confidence = output
                .confidences
                .as_ref()
                .and_then(|c| c.get(step).copied())
                .unwrap_or(REAL_MODEL_CONFIDENCE) as f64;

            debug!(
                step,
                category_index, merchant_index, amount, "Decoded prediction step"
            );

            PredictedTransaction::new(amount, category, merchant, confidence)
        })
        .collect()
}
