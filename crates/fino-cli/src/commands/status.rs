//! 모델 로드 상태 점검.

use anyhow::Result;
use std::time::Instant;

use fino_core::{ForecastSettings, ModelTier};
use fino_forecast::{ArtifactOrigin, ModelFactory, ModelStatus};

use super::OutputFormat;

/// 상태 점검 결과.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: ModelStatus,
    pub graph_path: String,
    pub graph_exists: bool,
    pub vocabulary_origin: Option<ArtifactOrigin>,
    pub scaler_origin: Option<ArtifactOrigin>,
    pub categories: usize,
    pub merchants: usize,
    pub load_ms: u128,
}

/// 모델을 로드해 보고 상태를 반환합니다. 점검 후 모델은 해제됩니다.
pub async fn check_status(
    settings: &ForecastSettings,
    tier: ModelTier,
    mock: bool,
) -> Result<StatusReport> {
    let factory = ModelFactory::from_settings(settings);
    let model = factory.create(tier, mock);

    let started = Instant::now();
    model.load().await?;
    let load_ms = started.elapsed().as_millis();

    let artifacts = model.artifacts().await;
    let report = StatusReport {
        status: model.status(),
        graph_path: model.graph_path().display().to_string(),
        graph_exists: model.graph_path().exists(),
        vocabulary_origin: artifacts.as_ref().map(|a| a.vocabulary_origin),
        scaler_origin: artifacts.as_ref().and_then(|a| a.scaler_origin),
        categories: artifacts.as_ref().map_or(0, |a| a.vocabulary.categories.len()),
        merchants: artifacts.as_ref().map_or(0, |a| a.vocabulary.merchants.len()),
        load_ms,
    };

    model.dispose().await;
    Ok(report)
}

/// 상태 점검 결과 출력.
pub fn print_report(report: &StatusReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Pretty => {
            let status = &report.status;
            println!("\n=== 모델 상태 ===");
            println!("티어: {}", status.tier);
            println!(
                "그래프: {} ({})",
                report.graph_path,
                if report.graph_exists { "있음" } else { "없음" }
            );
            match status.backend {
                Some(backend) => println!("백엔드: {}", backend),
                None => println!("백엔드: -"),
            }
            if let Some(reason) = &status.fallback_reason {
                println!("Mock 폴백 사유: {}", reason);
            }
            println!(
                "어휘: 카테고리 {}개, 가맹점 {}개 ({:?})",
                report.categories, report.merchants, report.vocabulary_origin
            );
            if let Some(origin) = report.scaler_origin {
                println!("스케일러: {:?}", origin);
            }
            println!("로드 시간: {}ms", report.load_ms);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fino_forecast::ModelBackend;

    #[tokio::test]
    async fn test_status_reports_fallback() {
        let settings = ForecastSettings {
            model_dir: "no/such/models".to_string(),
            vocab_uri: "no/such/vocab.json".to_string(),
            ..Default::default()
        };
        let report = check_status(&settings, ModelTier::Large, false).await.unwrap();

        assert!(!report.graph_exists);
        assert!(report.graph_path.ends_with("fin-o-large.onnx"));
        assert_eq!(report.status.backend, Some(ModelBackend::Mock));
        assert!(report.status.fallback_reason.is_some());
        assert_eq!(report.vocabulary_origin, Some(ArtifactOrigin::Default));
        assert_eq!(report.categories, 13);
        print_report(&report, OutputFormat::Pretty).unwrap();
    }
}
