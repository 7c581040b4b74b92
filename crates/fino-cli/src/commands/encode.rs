//! 원장을 모델 입력 행렬로 인코딩해 확인.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use fino_core::{load_ledger, ForecastSettings};
use fino_forecast::{encode, RecordConverter, FEATURE_COUNT, FEATURE_NAMES};

use super::OutputFormat;

/// 인코딩 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedLedger {
    pub ledger_transactions: usize,
    pub rows: usize,
    pub columns: usize,
    pub feature_names: Vec<String>,
    pub values: Vec<Vec<f32>>,
}

/// 원장 파일을 인코딩합니다.
pub fn encode_ledger(path: &Path, settings: &ForecastSettings) -> Result<EncodedLedger> {
    let ledger = load_ledger(path)
        .with_context(|| format!("Failed to load ledger: {}", path.display()))?;

    let converter = RecordConverter::from_settings(settings);
    let records = converter.convert(&ledger);
    let sequence = encode(
        &records,
        settings.sequence_length,
        settings.num_categories,
        settings.num_merchants,
    );

    let values = (0..sequence.rows())
        .filter_map(|i| sequence.row(i).map(|r| r.to_vec()))
        .collect();

    Ok(EncodedLedger {
        ledger_transactions: ledger.len(),
        rows: sequence.rows(),
        columns: FEATURE_COUNT,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

/// 인코딩 결과 출력. `limit`개 행만 표시합니다 (0 = 전체).
pub fn print_encoded(encoded: &EncodedLedger, format: OutputFormat, limit: usize) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(encoded)?),
        OutputFormat::Pretty => {
            println!(
                "\n원장 거래 {}건 → {} × {} 행렬",
                encoded.ledger_transactions, encoded.rows, encoded.columns
            );
            let shown = if limit == 0 { encoded.rows } else { limit.min(encoded.rows) };
            for (i, row) in encoded.values.iter().take(shown).enumerate() {
                println!("\n[{}]", i);
                for (name, value) in encoded.feature_names.iter().zip(row) {
                    println!("  {:<22} {:>12.4}", name, value);
                }
            }
            if shown < encoded.rows {
                println!("\n... {}개 행 생략", encoded.rows - shown);
            }
        }
    }
    Ok(())
}
