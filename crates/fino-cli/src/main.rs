//! Fin-O 예측 엔진 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 원장 파일로 다음 구매 예측 (Mock 모델)
//! fino predict --history data/ledger/test-user-123.json
//!
//! # 실제 ONNX 모델 사용 (ml feature 필요, 실패 시 Mock 폴백)
//! fino predict --history ledger.json --tier large --mock false --format json
//!
//! # 모델 로드 상태 확인
//! fino status --tier small --mock false
//!
//! # 모델 입력 행렬 확인
//! fino encode --history ledger.json --rows 3
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use fino_cli::commands::encode::{encode_ledger, print_encoded};
use fino_cli::commands::predict::{print_response, run_predict, PredictConfig};
use fino_cli::commands::status::{check_status, print_report};
use fino_cli::commands::OutputFormat;
use fino_core::{init_logging, AppConfig, LogConfig, ModelTier};

#[derive(Parser)]
#[command(name = "fino")]
#[command(about = "Fin-O CLI - 거래 이력 기반 다음 구매 예측", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 원장으로 다음 구매 예측
    Predict {
        /// 원장 JSON 파일 (생략 시 합성 이력)
        #[arg(long)]
        history: Option<PathBuf>,

        /// 모델 티어 (small, large)
        #[arg(short, long)]
        tier: Option<String>,

        /// Mock 모델 사용 (기본: 설정값)
        #[arg(long)]
        mock: Option<bool>,

        /// 사용자 id
        #[arg(short, long, default_value = "test-user-123")]
        user_id: String,

        /// 출력 형식 (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },

    /// 모델 로드 상태 확인
    Status {
        /// 모델 티어 (small, large)
        #[arg(short, long)]
        tier: Option<String>,

        /// Mock 모델 사용 (기본: 설정값)
        #[arg(long)]
        mock: Option<bool>,

        /// 출력 형식 (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },

    /// 원장을 모델 입력 행렬로 인코딩
    Encode {
        /// 원장 JSON 파일
        #[arg(long)]
        history: PathBuf,

        /// 표시할 행 수 (0 = 전체)
        #[arg(long, default_value = "3")]
        rows: usize,

        /// 출력 형식 (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

fn parse_tier(tier: Option<String>, default: ModelTier) -> Result<ModelTier> {
    match tier {
        Some(t) => t.parse::<ModelTier>().map_err(|e| anyhow::anyhow!(e)),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let settings = config.forecast.clone();

    match cli.command {
        Commands::Predict {
            history,
            tier,
            mock,
            user_id,
            format,
        } => {
            let predict_config = PredictConfig {
                history,
                tier: parse_tier(tier, settings.tier)?,
                mock: mock.unwrap_or(settings.use_mock),
                user_id,
                format: OutputFormat::parse(&format)?,
            };

            match run_predict(&predict_config, settings).await {
                Ok(response) => {
                    info!(
                        "✅ Generated {} predictions",
                        response.metadata.prediction_count
                    );
                    print_response(&response, predict_config.format)?;
                }
                Err(e) => {
                    error!("Prediction failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Status { tier, mock, format } => {
            let tier = parse_tier(tier, settings.tier)?;
            let mock = mock.unwrap_or(settings.use_mock);
            let report = check_status(&settings, tier, mock).await?;
            print_report(&report, OutputFormat::parse(&format)?)?;
        }

        Commands::Encode {
            history,
            rows,
            format,
        } => {
            let encoded = encode_ledger(&history, &settings)?;
            print_encoded(&encoded, OutputFormat::parse(&format)?, rows)?;
        }
    }

    Ok(())
}
