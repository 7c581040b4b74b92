//! 테스트 및 폴백용 Mock 시퀀스 모델.
//!
//! 입력 내용과 무관하게 형태가 맞는 의사 난수 출력을 생성합니다.
//! 금액은 이미 통화 단위이므로 디코딩 시 스케일러를 적용하지 않습니다.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use super::{ForwardOutput, ModelConfig};
use crate::artifacts::Vocabulary;
use crate::features::FeatureSequence;

/// 수입 거래 확률.
const INCOME_PROBABILITY: f64 = 0.2;

/// 선택된 인덱스에 부여하는 로짓.
const CHOSEN_LOGIT: f32 = 1.0;

/// 의사 난수 시퀀스 모델.
pub struct MockSequenceModel {
    config: ModelConfig,
    category_span: usize,
    merchant_span: usize,
    rng: Mutex<StdRng>,
}

impl MockSequenceModel {
    /// Mock 모델 생성.
    ///
    /// 선택되는 라벨 인덱스는 `[0, min(C, 어휘 크기))` 범위입니다.
    /// `seed`를 주면 출력이 재현 가능합니다.
    pub fn new(config: ModelConfig, vocabulary: &Vocabulary, seed: Option<u64>) -> Self {
        let category_span = config.num_categories.min(vocabulary.categories.len());
        let merchant_span = config.num_merchants.min(vocabulary.merchants.len());
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            category_span,
            merchant_span,
            rng: Mutex::new(rng),
        }
    }

    /// 모델 설정.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// 의사 난수 출력 생성.
    pub fn forward(&self, _input: &FeatureSequence) -> ForwardOutput {
        let h = self.config.forecast_horizon;
        let c = self.config.num_categories;
        let m = self.config.num_merchants;

        let mut amounts = Vec::with_capacity(h);
        let mut category_logits = vec![0.0f32; h * c];
        let mut merchant_logits = vec![0.0f32; h * m];
        let mut confidences = Vec::with_capacity(h);

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for step in 0..h {
            let amount = if rng.gen::<f64>() < INCOME_PROBABILITY {
                rng.gen::<f64>() * 5000.0 + 1000.0
            } else {
                -(rng.gen::<f64>() * 200.0 + 10.0)
            };
            amounts.push(round_cents(amount) as f32);

            if self.category_span > 0 {
                let idx = rng.gen_range(0..self.category_span);
                category_logits[step * c + idx] = CHOSEN_LOGIT;
            }
            if self.merchant_span > 0 {
                let idx = rng.gen_range(0..self.merchant_span);
                merchant_logits[step * m + idx] = CHOSEN_LOGIT;
            }

            confidences.push((0.7 + rng.gen::<f64>() * 0.2) as f32);
        }

        ForwardOutput {
            horizon: h,
            num_categories: c,
            num_merchants: m,
            amounts,
            category_logits,
            merchant_logits,
            confidences: Some(confidences),
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_vocab() -> Vocabulary {
        Vocabulary {
            categories: vec!["A".to_string(), "B".to_string()],
            merchants: vec!["X".to_string(), "Y".to_string(), "Z".to_string()],
        }
    }

    #[test]
    fn test_mock_output_shape_and_ranges() {
        let config = ModelConfig::default();
        let model = MockSequenceModel::new(config.clone(), &small_vocab(), Some(42));
        let out = model.forward(&FeatureSequence::zeros(config.sequence_length));

        assert!(out.validate(&config).is_ok());
        for step in 0..out.horizon {
            let cats = out.category_logits_at(step);
            let chosen: Vec<_> = cats.iter().enumerate().filter(|(_, v)| **v > 0.0).collect();
            assert_eq!(chosen.len(), 1);
            assert!(chosen[0].0 < 2);

            let merchants = out.merchant_logits_at(step);
            let chosen = merchants.iter().position(|v| *v > 0.0).unwrap();
            assert!(chosen < 3);

            let amount = out.amounts[step] as f64;
            assert!(
                (1000.0..=6000.0).contains(&amount) || (-210.0..=-10.0).contains(&amount),
                "amount out of range: {}",
                amount
            );
        }

        let confidences = out.confidences.unwrap();
        assert!(confidences.iter().all(|c| (0.7..=0.9).contains(c)));
    }

    #[test]
    fn test_mock_seed_is_reproducible() {
        let config = ModelConfig::default();
        let input = FeatureSequence::zeros(config.sequence_length);
        let a = MockSequenceModel::new(config.clone(), &small_vocab(), Some(7)).forward(&input);
        let b = MockSequenceModel::new(config, &small_vocab(), Some(7)).forward(&input);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mock_with_empty_vocabulary() {
        let config = ModelConfig {
            forecast_horizon: 3,
            ..Default::default()
        };
        let vocab = Vocabulary {
            categories: vec![],
            merchants: vec![],
        };
        let model = MockSequenceModel::new(config.clone(), &vocab, Some(1));
        let out = model.forward(&FeatureSequence::zeros(config.sequence_length));
        assert!(out.category_logits.iter().all(|v| *v == 0.0));
        assert_eq!(out.amounts.len(), 3);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(12.345), 12.35);
        assert_eq!(round_cents(-10.004), -10.0);
    }
}
