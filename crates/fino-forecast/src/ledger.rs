//! 원장 거래를 모델 입력 레코드로 변환.
//!
//! 카테고리/가맹점 이름은 고정 id 맵으로 변환하고, 맵에 없는 이름은 어휘 범위
//! 안의 임의 id를 받습니다. 날짜는 요일/일/월의 sin·cos 순환 인코딩으로 바뀝니다.

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::f64::consts::PI;

use fino_core::{ForecastSettings, LedgerTransaction};

use crate::types::TransactionRecord;

/// 하루 (초).
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// 잔고가 없을 때 추정 잔고 하한.
const BALANCE_BASE: f64 = 5000.0;
/// 추정 잔고 범위.
const BALANCE_SPREAD: f64 = 10_000.0;

const CATEGORY_IDS: [(&str, i64); 9] = [
    ("Lebensmittel", 0),
    ("Transport", 1),
    ("Restaurants", 2),
    ("Shopping", 3),
    ("Unterhaltung", 4),
    ("Gesundheit", 5),
    ("Bildung", 6),
    ("Nebenkosten", 7),
    ("Sonstiges", 8),
];

const MERCHANT_IDS: [(&str, i64); 10] = [
    ("Migros", 0),
    ("Coop", 1),
    ("Denner", 2),
    ("Starbucks", 3),
    ("McDonald's", 4),
    ("SBB", 5),
    ("Swisscom", 6),
    ("UPC", 7),
    ("Netflix", 8),
    ("Spotify", 9),
];

/// 날짜의 순환 인코딩 (요일, 일, 월).
///
/// 요일은 일요일=0, 월은 0부터 셉니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarEncoding {
    pub day_of_week_sin: f64,
    pub day_of_week_cos: f64,
    pub day_of_month_sin: f64,
    pub day_of_month_cos: f64,
    pub month_of_year_sin: f64,
    pub month_of_year_cos: f64,
}

impl CalendarEncoding {
    /// 날짜 인코딩.
    pub fn from_date(date: &DateTime<Utc>) -> Self {
        let dow = date.weekday().num_days_from_sunday() as f64;
        let dom = date.day() as f64;
        let month = date.month0() as f64;
        Self {
            day_of_week_sin: (2.0 * PI * dow / 7.0).sin(),
            day_of_week_cos: (2.0 * PI * dow / 7.0).cos(),
            day_of_month_sin: (2.0 * PI * dom / 31.0).sin(),
            day_of_month_cos: (2.0 * PI * dom / 31.0).cos(),
            month_of_year_sin: (2.0 * PI * month / 12.0).sin(),
            month_of_year_cos: (2.0 * PI * month / 12.0).cos(),
        }
    }

    fn apply(&self, record: &mut TransactionRecord) {
        record.day_of_week_sin = self.day_of_week_sin;
        record.day_of_week_cos = self.day_of_week_cos;
        record.day_of_month_sin = self.day_of_month_sin;
        record.day_of_month_cos = self.day_of_month_cos;
        record.month_of_year_sin = self.month_of_year_sin;
        record.month_of_year_cos = self.month_of_year_cos;
    }
}

/// 원장 → 모델 레코드 변환기.
#[derive(Debug, Clone)]
pub struct RecordConverter {
    category_ids: HashMap<String, i64>,
    merchant_ids: HashMap<String, i64>,
    num_categories: usize,
    num_merchants: usize,
    max_history: usize,
}

impl Default for RecordConverter {
    fn default() -> Self {
        Self::new(41, 230, 50)
    }
}

impl RecordConverter {
    /// 기본 이름 맵으로 변환기 생성.
    pub fn new(num_categories: usize, num_merchants: usize, max_history: usize) -> Self {
        Self {
            category_ids: CATEGORY_IDS
                .iter()
                .map(|(name, id)| (name.to_string(), *id))
                .collect(),
            merchant_ids: MERCHANT_IDS
                .iter()
                .map(|(name, id)| (name.to_string(), *id))
                .collect(),
            num_categories,
            num_merchants,
            max_history,
        }
    }

    /// 설정에서 변환기 생성.
    pub fn from_settings(settings: &ForecastSettings) -> Self {
        Self::new(
            settings.num_categories,
            settings.num_merchants,
            settings.max_history,
        )
    }

    /// 카테고리 이름 매핑 추가.
    pub fn with_category(mut self, name: impl Into<String>, id: i64) -> Self {
        self.category_ids.insert(name.into(), id);
        self
    }

    /// 가맹점 이름 매핑 추가.
    pub fn with_merchant(mut self, name: impl Into<String>, id: i64) -> Self {
        self.merchant_ids.insert(name.into(), id);
        self
    }

    fn category_id<R: Rng>(&self, name: &str, rng: &mut R) -> i64 {
        self.category_ids
            .get(name)
            .copied()
            .unwrap_or_else(|| random_id(rng, self.num_categories))
    }

    fn merchant_id<R: Rng>(&self, name: &str, rng: &mut R) -> i64 {
        self.merchant_ids
            .get(name)
            .copied()
            .unwrap_or_else(|| random_id(rng, self.num_merchants))
    }

    /// 원장 앞쪽 `max_history`개 거래를 변환합니다.
    pub fn convert_with_rng<R: Rng>(
        &self,
        ledger: &[LedgerTransaction],
        rng: &mut R,
    ) -> Vec<TransactionRecord> {
        ledger
            .iter()
            .take(self.max_history)
            .enumerate()
            .map(|(index, tx)| {
                let amount = tx.amount.abs().to_f64().unwrap_or(0.0);
                let balance_before = tx
                    .balance_before
                    .and_then(|b| b.to_f64())
                    .unwrap_or_else(|| estimated_balance(rng));
                let delta = index as f64 * SECONDS_PER_DAY;

                let mut record = TransactionRecord {
                    amount,
                    balance_before,
                    category_id: self.category_id(&tx.category, rng),
                    merchant_id: self.merchant_id(&tx.description, rng),
                    time_delta: delta,
                    time_delta_category: delta,
                    time_delta_merchant: delta,
                    avg_amount_merchant: amount,
                    ..Default::default()
                };
                CalendarEncoding::from_date(&tx.date).apply(&mut record);
                record
            })
            .collect()
    }

    /// 스레드 난수로 변환합니다.
    pub fn convert(&self, ledger: &[LedgerTransaction]) -> Vec<TransactionRecord> {
        self.convert_with_rng(ledger, &mut rand::thread_rng())
    }

    /// 원장이 비어 있을 때 사용할 합성 이력.
    ///
    /// `now`부터 하루씩 거슬러 올라가는 `count`개의 지출 레코드를 만듭니다.
    pub fn synthetic_history<R: Rng>(
        &self,
        count: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<TransactionRecord> {
        (0..count)
            .map(|i| {
                let date = now - Duration::days(i as i64);
                let delta = i as f64 * SECONDS_PER_DAY;
                let mut record = TransactionRecord {
                    amount: rng.gen::<f64>() * 200.0 + 10.0,
                    balance_before: estimated_balance(rng),
                    category_id: random_id(rng, self.num_categories),
                    merchant_id: random_id(rng, self.num_merchants),
                    time_delta: delta,
                    time_delta_category: delta,
                    time_delta_merchant: delta,
                    avg_amount_merchant: rng.gen::<f64>() * 100.0 + 20.0,
                    ..Default::default()
                };
                CalendarEncoding::from_date(&date).apply(&mut record);
                record
            })
            .collect()
    }

    /// 변환할 최대 거래 수.
    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

fn random_id<R: Rng>(rng: &mut R, size: usize) -> i64 {
    if size == 0 {
        0
    } else {
        rng.gen_range(0..size) as i64
    }
}

fn estimated_balance<R: Rng>(rng: &mut R) -> f64 {
    BALANCE_BASE + rng.gen::<f64>() * BALANCE_SPREAD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn tx(day: u32, amount: rust_decimal::Decimal, category: &str, merchant: &str) -> LedgerTransaction {
        let date = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        LedgerTransaction::new(date, amount, category, merchant)
    }

    #[test]
    fn test_calendar_encoding() {
        // 2025-03-02 는 일요일
        let sunday = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let enc = CalendarEncoding::from_date(&sunday);
        assert!(enc.day_of_week_sin.abs() < 1e-12);
        assert!((enc.day_of_week_cos - 1.0).abs() < 1e-12);
        assert!((enc.day_of_month_sin - (2.0 * PI * 2.0 / 31.0).sin()).abs() < 1e-12);
        assert!((enc.month_of_year_sin - (2.0 * PI * 2.0 / 12.0).sin()).abs() < 1e-12);

        let january = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let enc = CalendarEncoding::from_date(&january);
        assert!(enc.month_of_year_sin.abs() < 1e-12);
        assert!((enc.month_of_year_cos - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_convert_known_names() {
        let converter = RecordConverter::default();
        let ledger = vec![
            tx(3, dec!(-42.50), "Lebensmittel", "Migros").with_balance(dec!(1200)),
            tx(4, dec!(-8.90), "Restaurants", "Starbucks"),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let records = converter.convert_with_rng(&ledger, &mut rng);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, 42.5);
        assert_eq!(records[0].balance_before, 1200.0);
        assert_eq!(records[0].category_id, 0);
        assert_eq!(records[0].merchant_id, 0);
        assert_eq!(records[0].avg_amount_merchant, 42.5);
        assert_eq!(records[0].time_delta, 0.0);

        assert_eq!(records[1].category_id, 2);
        assert_eq!(records[1].merchant_id, 3);
        assert_eq!(records[1].time_delta, SECONDS_PER_DAY);
        assert!((5000.0..15000.0).contains(&records[1].balance_before));
    }

    #[test]
    fn test_convert_unknown_names_stay_in_range() {
        let converter = RecordConverter::new(41, 230, 50);
        let ledger: Vec<_> = (1..=20)
            .map(|d| tx(d, dec!(-1), "Mystery", "Nowhere Ltd"))
            .collect();
        let mut rng = StdRng::seed_from_u64(9);
        for record in converter.convert_with_rng(&ledger, &mut rng) {
            assert!((0..41).contains(&record.category_id));
            assert!((0..230).contains(&record.merchant_id));
        }
    }

    #[test]
    fn test_convert_truncates_to_max_history() {
        let converter = RecordConverter::new(41, 230, 5);
        let ledger: Vec<_> = (1..=10).map(|d| tx(d, dec!(-1), "Transport", "SBB")).collect();
        let records = converter.convert(&ledger);
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].merchant_id, 5);
    }

    #[test]
    fn test_custom_mappings() {
        let converter = RecordConverter::default()
            .with_category("Reisen", 12)
            .with_merchant("Denner Express", 2);
        let records = converter.convert(&[tx(1, dec!(-5), "Reisen", "Denner Express")]);
        assert_eq!(records[0].category_id, 12);
        assert_eq!(records[0].merchant_id, 2);
    }

    #[test]
    fn test_synthetic_history() {
        let converter = RecordConverter::default();
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 8, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let records = converter.synthetic_history(50, now, &mut rng);

        assert_eq!(records.len(), 50);
        assert_eq!(records[49].time_delta, 49.0 * SECONDS_PER_DAY);
        for r in &records {
            assert!((10.0..210.0).contains(&r.amount));
            assert!((0..41).contains(&r.category_id));
            assert!((0..230).contains(&r.merchant_id));
        }
    }
}
