//! 구매 예측 실행.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use fino_core::{load_ledger, ForecastSettings, LedgerTransaction, ModelTier};
use fino_forecast::{ForecastResponse, ForecastService, PredictPurchaseRequest};

use super::OutputFormat;

/// 예측 실행 설정.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    /// 원장 JSON 파일 (없으면 합성 이력 사용)
    pub history: Option<PathBuf>,
    /// 모델 티어
    pub tier: ModelTier,
    /// Mock 모델 사용
    pub mock: bool,
    /// 사용자 id
    pub user_id: String,
    /// 출력 형식
    pub format: OutputFormat,
}

/// 원장을 읽어 예측을 실행합니다.
pub async fn run_predict(
    config: &PredictConfig,
    settings: ForecastSettings,
) -> Result<ForecastResponse> {
    let ledger: Vec<LedgerTransaction> = match &config.history {
        Some(path) => load_ledger(path)
            .with_context(|| format!("Failed to load ledger: {}", path.display()))?,
        None => Vec::new(),
    };
    info!("Loaded {} ledger transactions", ledger.len());

    let service = ForecastService::from_settings(settings).await;
    let request = PredictPurchaseRequest {
        user_id: config.user_id.clone(),
        model_type: config.tier,
        use_mock_model: config.mock,
    };

    let response = service.predict_purchase(&request, &ledger).await?;
    Ok(response)
}

/// 예측 결과 출력.
pub fn print_response(response: &ForecastResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Pretty => {
            let data = &response.data;
            let meta = &response.metadata;
            let top = &data.most_likely_purchase;

            println!("\n=== 다음 구매 예측 ===");
            println!("사용자: {}  모델: {}", meta.user_id, meta.model_type);
            if meta.mock_engaged {
                match &meta.fallback_reason {
                    Some(reason) => println!("Mock 모델 사용 (폴백: {})", reason),
                    None => println!("Mock 모델 사용"),
                }
            }
            println!(
                "\n가장 가능성 높은 구매: {} / {} - CHF {:.2} (확률 {:.1}%, 신뢰도 {:.1}%)",
                top.merchant,
                top.category,
                top.amount,
                top.probability * 100.0,
                top.confidence * 100.0
            );

            println!("\n{:<4} {:<28} {:<28} {:>10} {:>8} {:>4}", "#", "가맹점", "카테고리", "금액", "신뢰도", "빈도");
            for (i, p) in data.top_predictions.iter().enumerate() {
                println!(
                    "{:<4} {:<28} {:<28} {:>10.2} {:>7.1}% {:>4}",
                    i + 1,
                    p.merchant,
                    p.category,
                    p.amount,
                    p.confidence * 100.0,
                    p.frequency
                );
            }

            let insights = &data.insights;
            println!("\n예상 지출 합계: CHF {:.2}", insights.total_predicted_spending);
            println!("평균 거래 금액: CHF {:.2}", insights.average_transaction_amount);
            println!("최빈 카테고리: {}", insights.most_frequent_category);
            println!("최빈 가맹점: {}", insights.most_frequent_merchant);
            println!("지출 성향: {}", insights.spending_pattern);
        }
    }
    Ok(())
}
