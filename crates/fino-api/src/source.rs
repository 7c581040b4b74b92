//! 사용자별 거래 원장 소스.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use fino_core::{parse_ledger, FinoError, FinoResult, LedgerConfig, LedgerTransaction};

/// 사용자의 최근 거래를 제공하는 소스.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// 사용자의 최근 거래 조회. 거래가 없으면 빈 목록을 반환합니다.
    async fn recent_transactions(&self, user_id: &str) -> FinoResult<Vec<LedgerTransaction>>;

    /// 헬스 체크용 설명.
    fn describe(&self) -> String;

    /// 소스를 사용할 수 있는지 여부.
    fn is_available(&self) -> bool {
        true
    }
}

/// `{data_dir}/{user_id}.json` 파일에서 원장을 읽는 소스.
///
/// 사용자 파일이 없으면 기본 파일, 그것도 없으면 빈 원장을 반환합니다.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    data_dir: PathBuf,
    default_file: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(data_dir: impl Into<PathBuf>, default_file: Option<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            default_file,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            &config.data_dir,
            config.default_file.as_ref().map(PathBuf::from),
        )
    }

    /// 사용자 원장 파일 경로. 경로 구분자가 들어간 id는 거부합니다.
    pub fn user_path(&self, user_id: &str) -> FinoResult<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id != "."
            && user_id != ".."
            && !user_id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(FinoError::InvalidInput(format!(
                "invalid user id: {:?}",
                user_id
            )));
        }
        Ok(self.data_dir.join(format!("{}.json", user_id)))
    }

    async fn read(path: &Path) -> FinoResult<Option<Vec<LedgerTransaction>>> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => parse_ledger(&raw)
                .map(Some)
                .map_err(|e| FinoError::Serialization(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TransactionSource for JsonFileSource {
    async fn recent_transactions(&self, user_id: &str) -> FinoResult<Vec<LedgerTransaction>> {
        let path = self.user_path(user_id)?;
        if let Some(ledger) = Self::read(&path).await? {
            debug!(user_id, count = ledger.len(), "Loaded user ledger");
            return Ok(ledger);
        }

        if let Some(default_file) = &self.default_file {
            if let Some(ledger) = Self::read(default_file).await? {
                info!(
                    user_id,
                    file = %default_file.display(),
                    "User ledger not found, using default ledger"
                );
                return Ok(ledger);
            }
        }

        info!(user_id, "No ledger found, using empty history");
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        format!("json files in {}", self.data_dir.display())
    }

    fn is_available(&self) -> bool {
        self.data_dir.is_dir()
    }
}

/// 모든 사용자에게 같은 원장을 반환하는 소스.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    transactions: Vec<LedgerTransaction>,
}

impl StaticSource {
    pub fn new(transactions: Vec<LedgerTransaction>) -> Self {
        Self { transactions }
    }
}

#[async_trait]
impl TransactionSource for StaticSource {
    async fn recent_transactions(&self, _user_id: &str) -> FinoResult<Vec<LedgerTransaction>> {
        Ok(self.transactions.clone())
    }

    fn describe(&self) -> String {
        format!("static ledger ({} transactions)", self.transactions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = r#"{"recentTransactions":[
        {"date":"2025-05-01","amount":-12.5,"category":"Lebensmittel","description":"Coop"},
        {"date":"2025-05-02","amount":4200,"category":"Lohn","description":"Arbeitgeber"}
    ]}"#;

    #[tokio::test]
    async fn test_json_source_reads_user_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alice.json"), LEDGER).unwrap();

        let source = JsonFileSource::new(dir.path(), None);
        let ledger = source.recent_transactions("alice").await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].description, "Coop");
        assert!(source.is_available());
    }

    #[tokio::test]
    async fn test_json_source_falls_back_to_default_then_empty() {
        let dir = tempfile::tempdir().unwrap();
        let default_file = dir.path().join("default.json");
        std::fs::write(&default_file, LEDGER).unwrap();

        let source = JsonFileSource::new(dir.path(), Some(default_file));
        assert_eq!(source.recent_transactions("bob").await.unwrap().len(), 2);

        let source = JsonFileSource::new(dir.path(), Some(dir.path().join("missing.json")));
        assert!(source.recent_transactions("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_source_rejects_path_traversal() {
        let source = JsonFileSource::new("data/ledger", None);
        for id in ["../secret", "a/b", "", ".."] {
            assert!(matches!(
                source.recent_transactions(id).await,
                Err(FinoError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_json_source_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("carol.json"), "{not json").unwrap();

        let source = JsonFileSource::new(dir.path(), None);
        assert!(matches!(
            source.recent_transactions("carol").await,
            Err(FinoError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_static_source() {
        let ledger = parse_ledger(LEDGER).unwrap();
        let source = StaticSource::new(ledger);
        assert_eq!(source.recent_transactions("anyone").await.unwrap().len(), 2);
        assert!(source.describe().contains('2'));
    }
}
