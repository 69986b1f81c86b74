//! Per-(number, type) running totals and risk classification.
//!
//! Summaries are always rebuilt from a full snapshot of the day's records.
//! Nothing here keeps state between calls, so the same snapshot always
//! yields the same summary.

use crate::bet::{BetRecord, BetType};
use crate::config::{CRITICAL_THRESHOLD, WARNING_THRESHOLD};
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// Grouping key for summary rows.
///
/// Kept structural so that no pair of distinct `(number, type)` values can
/// ever collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub number: String,
    pub bet_type: BetType,
}

impl GroupKey {
    pub fn new(number: impl Into<String>, bet_type: BetType) -> Self {
        GroupKey {
            number: number.into(),
            bet_type,
        }
    }

    pub fn of(record: &BetRecord) -> Self {
        GroupKey::new(record.number.clone(), record.bet_type.clone())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number, self.bet_type)
    }
}

/// Running totals for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub number: String,
    pub bet_type: BetType,

    /// Sum of the constituent stakes.
    pub base: u64,

    /// Sum of the constituent multipliers.
    pub mul: u64,

    /// Sum of the constituent amounts.
    pub amount: u64,

    /// Each record's formula text, in fold order.
    pub calcs: Vec<String>,
}

impl SummaryRow {
    fn empty(key: &GroupKey) -> Self {
        SummaryRow {
            number: key.number.clone(),
            bet_type: key.bet_type.clone(),
            base: 0,
            mul: 0,
            amount: 0,
            calcs: Vec::new(),
        }
    }

    fn fold(&mut self, record: &BetRecord) {
        self.base += u64::from(record.base);
        self.mul += u64::from(record.mul);
        self.amount += record.amount;
        self.calcs.push(record.calc.clone());
    }

    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.number.clone(), self.bet_type.clone())
    }

    pub fn level(&self) -> RiskLevel {
        classify(self)
    }
}

/// Summary rows in first-seen order, indexed by group key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    rows: Vec<SummaryRow>,
    index: HashMap<GroupKey, usize>,
}

impl Summary {
    pub fn get(&self, key: &GroupKey) -> Option<&SummaryRow> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<SummaryRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a Summary {
    type Item = &'a SummaryRow;
    type IntoIter = std::slice::Iter<'a, SummaryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Folds records into per-group totals in a single left-to-right pass.
///
/// A group's position is fixed by the first record seen for it, and its
/// `calcs` follow input order.
pub fn aggregate<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a BetRecord>,
{
    let mut summary = Summary::default();

    for record in records {
        let key = GroupKey::of(record);
        let idx = match summary.index.get(&key) {
            Some(&idx) => idx,
            None => {
                summary.rows.push(SummaryRow::empty(&key));
                let idx = summary.rows.len() - 1;
                summary.index.insert(key, idx);
                idx
            }
        };
        summary.rows[idx].fold(record);
    }

    summary
}

/// Exposure band of a group, judged on its summed stake only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Normal,
    Warning,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Warning => "warning",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `base >= 100` is critical, `base >= 80` is a warning, anything lower is normal.
pub fn classify(row: &SummaryRow) -> RiskLevel {
    if row.base >= CRITICAL_THRESHOLD {
        RiskLevel::Critical
    } else if row.base >= WARNING_THRESHOLD {
        RiskLevel::Warning
    } else {
        RiskLevel::Normal
    }
}

/// Everything derived from one snapshot of a day's records.
#[derive(Debug, Clone, Default)]
pub struct DaySheet {
    pub records: Vec<BetRecord>,
    pub summary: Summary,

    /// Sum of every record's amount.
    pub total_sales: u64,
}

impl DaySheet {
    pub fn from_records(records: Vec<BetRecord>) -> Self {
        let summary = aggregate(&records);
        let total_sales = records.iter().map(|r| r.amount).sum();

        debug!(
            "Recomputed sheet: {} records, {} groups, total {}",
            records.len(),
            summary.len(),
            total_sales
        );

        DaySheet {
            records,
            summary,
            total_sales,
        }
    }

    /// Rows at or above the critical threshold, in summary order.
    pub fn critical_rows(&self) -> Vec<&SummaryRow> {
        self.summary
            .iter()
            .filter(|row| classify(row) == RiskLevel::Critical)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bet::{BetId, DateKey, NewBet};
    use chrono::NaiveDate;

    fn record(id: &str, number: &str, bet_type: BetType, base: u32, mul: u32) -> BetRecord {
        let date = DateKey::new(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        NewBet::new(number, bet_type, base, mul).into_record(BetId::new(id), date)
    }

    fn row_with_base(base: u64) -> SummaryRow {
        SummaryRow {
            number: "1".to_string(),
            bet_type: BetType::Top,
            base,
            mul: 0,
            amount: 0,
            calcs: Vec::new(),
        }
    }

    #[test]
    fn test_aggregate_empty() {
        let summary = aggregate(&Vec::<BetRecord>::new());
        assert!(summary.is_empty());
        assert_eq!(summary.len(), 0);
    }

    #[test]
    fn test_aggregate_sums_group() {
        let records = vec![
            record("a", "123", BetType::Top, 50, 3),
            record("b", "123", BetType::Top, 60, 0),
        ];

        let summary = aggregate(&records);
        assert_eq!(summary.len(), 1);

        let row = summary.get(&GroupKey::new("123", BetType::Top)).unwrap();
        assert_eq!(row.base, 110);
        assert_eq!(row.mul, 3);
        assert_eq!(row.amount, 210);
        assert_eq!(row.calcs, vec!["50*3", "60"]);
        assert_eq!(row.level(), RiskLevel::Critical);
    }

    #[test]
    fn test_aggregate_keeps_first_seen_order() {
        let records = vec![
            record("a", "45", BetType::Bottom, 10, 0),
            record("b", "123", BetType::Top, 20, 0),
            record("c", "45", BetType::Bottom, 5, 0),
            record("d", "45", BetType::Top, 1, 0),
        ];

        let keys: Vec<GroupKey> = aggregate(&records).iter().map(SummaryRow::key).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::new("45", BetType::Bottom),
                GroupKey::new("123", BetType::Top),
                GroupKey::new("45", BetType::Top),
            ]
        );
    }

    #[test]
    fn test_aggregate_calcs_follow_input_order() {
        let forward = vec![
            record("a", "9", BetType::Top, 50, 3),
            record("b", "9", BetType::Top, 60, 0),
        ];
        let reversed: Vec<BetRecord> = forward.iter().rev().cloned().collect();

        let key = GroupKey::new("9", BetType::Top);
        let f = aggregate(&forward);
        let r = aggregate(&reversed);

        assert_eq!(f.get(&key).unwrap().amount, r.get(&key).unwrap().amount);
        assert_eq!(f.get(&key).unwrap().calcs, vec!["50*3", "60"]);
        assert_eq!(r.get(&key).unwrap().calcs, vec!["60", "50*3"]);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let records = vec![
            record("a", "1", BetType::Top, 5, 3),
            record("b", "2", BetType::ThreeToad, 7, 6),
            record("c", "1", BetType::Top, 9, 1),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_structural_key_has_no_boundary_collision() {
        let records = vec![
            record("a", "1", BetType::Other("2-x".to_string()), 10, 0),
            record("b", "1-2", BetType::Other("x".to_string()), 10, 0),
        ];
        assert_eq!(aggregate(&records).len(), 2);
    }

    #[test]
    fn test_unknown_types_group_normally() {
        let records = vec![
            record("a", "12", BetType::from_label("2 ตัวบน"), 10, 0),
            record("b", "12", BetType::from_label("2 ตัวบน"), 15, 0),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.rows()[0].base, 25);
    }

    #[test]
    fn test_named_and_spelled_out_label_share_a_group() {
        let records = vec![
            record("a", "123", BetType::Top, 50, 0),
            record("b", "123", BetType::Other("บน".to_string()), 60, 0),
        ];

        let summary = aggregate(&records);
        assert_eq!(summary.len(), 1);

        let row = summary.get(&GroupKey::new("123", BetType::Top)).unwrap();
        assert_eq!(row.base, 110);
        assert_eq!(row.calcs, vec!["50", "60"]);
        assert_eq!(row.level(), RiskLevel::Critical);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(&row_with_base(0)), RiskLevel::Normal);
        assert_eq!(classify(&row_with_base(79)), RiskLevel::Normal);
        assert_eq!(classify(&row_with_base(80)), RiskLevel::Warning);
        assert_eq!(classify(&row_with_base(99)), RiskLevel::Warning);
        assert_eq!(classify(&row_with_base(100)), RiskLevel::Critical);
        assert_eq!(classify(&row_with_base(5000)), RiskLevel::Critical);
    }

    #[test]
    fn test_classification_ignores_amount() {
        let mut row = row_with_base(10);
        row.mul = 500;
        row.amount = 10_000;
        assert_eq!(classify(&row), RiskLevel::Normal);
    }

    #[test]
    fn test_day_sheet_totals_and_critical_rows() {
        let sheet = DaySheet::from_records(vec![
            record("a", "123", BetType::Top, 50, 3),
            record("b", "123", BetType::Top, 60, 0),
            record("c", "88", BetType::Bottom, 20, 5),
        ]);

        assert_eq!(sheet.total_sales, 150 + 60 + 25);
        let critical = sheet.critical_rows();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].number, "123");
    }
}
