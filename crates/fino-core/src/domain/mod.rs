//! 도메인 모델.

pub mod ledger;
pub mod tier;

pub use ledger::{load_ledger, parse_ledger, LedgerTransaction};
pub use tier::{LabelLanguage, ModelTier};
