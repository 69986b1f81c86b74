//! CSV reports.
//!
//! Every export goes through [`to_csv`]: the header is the first row's field
//! names, every value is quoted, and rows are joined by `\n` with no trailing
//! newline. An empty row set is an error, never an empty file.

use crate::bet::BetRecord;
use crate::config::{self, DETAIL_SEPARATOR, UTF8_BOM};
use crate::error::{LedgerError, Result};
use crate::summary::{classify, RiskLevel, Summary, SummaryRow};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One export row: named fields in enumeration order. `None` renders as an
/// empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRow {
    fields: Vec<(String, Option<String>)>,
}

impl ExportRow {
    pub fn new() -> Self {
        ExportRow::default()
    }

    /// Appends a field, rendering the value with its `Display` text.
    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), Some(value.to_string())));
        self
    }

    /// Appends a field with no value.
    pub fn null_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), None));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Value of a field, with `None` for both absent and null fields.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    fn has_field_set(&self, names: &[&str]) -> bool {
        self.fields.len() == names.len() && names.iter().all(|n| self.fields.iter().any(|(f, _)| f == n))
    }
}

/// Serializes rows to CSV text.
///
/// Fails with [`LedgerError::NothingToExport`] on an empty slice, with
/// [`LedgerError::DuplicateField`] when the first row repeats a name, and with
/// [`LedgerError::RowShape`] when a row's field set differs from the first
/// row's. Values are looked up by name, so field order may vary after the
/// first row.
pub fn to_csv(rows: &[ExportRow]) -> Result<String> {
    let first = rows.first().ok_or(LedgerError::NothingToExport)?;
    let headers: Vec<&str> = first.names().collect();

    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(**h)) {
        return Err(LedgerError::DuplicateField(dup.to_string()));
    }

    for (idx, row) in rows.iter().enumerate().skip(1) {
        if !row.has_field_set(&headers) {
            return Err(LedgerError::RowShape {
                row: idx + 1,
                expected: headers.join(","),
                found: row.names().collect::<Vec<_>>().join(","),
            });
        }
    }

    let mut header_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header_writer.write_record(&headers)?;
    let buf = header_writer.into_inner().map_err(|e| e.into_error())?;

    let mut body_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);
    for row in rows {
        body_writer.write_record(headers.iter().map(|h| row.get(h).unwrap_or("")))?;
    }
    let mut buf = body_writer.into_inner().map_err(|e| e.into_error())?;

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }

    String::from_utf8(buf).map_err(|e| LedgerError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// How export text is framed for its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Prefix the output with a UTF-8 byte-order mark.
    pub byte_order_mark: bool,
}

impl ExportOptions {
    /// Options for spreadsheet consumers, honouring `LOTTO_CSV_BOM`.
    pub fn from_env() -> Self {
        ExportOptions {
            byte_order_mark: config::csv_bom_enabled(),
        }
    }

    pub fn plain() -> Self {
        ExportOptions {
            byte_order_mark: false,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            byte_order_mark: true,
        }
    }
}

/// Serializes `rows` and writes them to `writer`.
pub fn write_export<W: Write>(rows: &[ExportRow], mut writer: W, options: ExportOptions) -> Result<()> {
    let text = to_csv(rows)?;
    if options.byte_order_mark {
        writer.write_all(UTF8_BOM.as_bytes())?;
    }
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Writes an export file named `filename` inside `dir` and returns its path.
///
/// Nothing is created when the export is empty.
pub fn export_to_file(
    rows: &[ExportRow],
    dir: &Path,
    filename: &str,
    options: ExportOptions,
) -> Result<PathBuf> {
    let text = to_csv(rows)?;
    let path = dir.join(filename);

    let mut contents = Vec::with_capacity(text.len() + UTF8_BOM.len());
    if options.byte_order_mark {
        contents.extend_from_slice(UTF8_BOM.as_bytes());
    }
    contents.extend_from_slice(text.as_bytes());
    fs::write(&path, contents)?;

    debug!("Exported {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// One row per stored record, fields as stored.
pub fn full_export_rows(records: &[BetRecord]) -> Vec<ExportRow> {
    records
        .iter()
        .map(|r| {
            ExportRow::new()
                .field("id", &r.id)
                .field("number", &r.number)
                .field("type", &r.bet_type)
                .field("base", r.base)
                .field("mul", r.mul)
                .field("calc", &r.calc)
                .field("amount", r.amount)
                .field("date", r.date)
        })
        .collect()
}

/// Critical groups only, flattened for the over-threshold report.
pub fn critical_export_rows(summary: &Summary) -> Vec<ExportRow> {
    summary
        .iter()
        .filter(|row| classify(row) == RiskLevel::Critical)
        .map(|row| {
            ExportRow::new()
                .field("number", &row.number)
                .field("type", &row.bet_type)
                .field("base_total", row.base)
                .field("tod_total", row.mul)
                .field("total", row.amount)
                .field("detail", row.calcs.join(DETAIL_SEPARATOR))
        })
        .collect()
}

/// Every summary row with its risk level, as shown on the sales screen.
pub fn summary_table_rows(summary: &Summary) -> Vec<ExportRow> {
    summary.iter().map(summary_table_row).collect()
}

fn summary_table_row(row: &SummaryRow) -> ExportRow {
    ExportRow::new()
        .field("number", &row.number)
        .field("type", &row.bet_type)
        .field("base", row.base)
        .field("mul", row.mul)
        .field("amount", row.amount)
        .field("level", classify(row))
        .field("calcs", row.calcs.join(", "))
}

/// Full export of a day's raw records.
pub fn full_export(records: &[BetRecord]) -> Result<String> {
    to_csv(&full_export_rows(records))
}

/// Export of the critical groups of a summary.
pub fn critical_export(summary: &Summary) -> Result<String> {
    to_csv(&critical_export_rows(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bet::{BetId, BetType, DateKey, NewBet};
    use crate::summary::aggregate;
    use chrono::NaiveDate;

    fn record(id: &str, number: &str, bet_type: BetType, base: u32, mul: u32) -> BetRecord {
        let date = DateKey::new(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        NewBet::new(number, bet_type, base, mul).into_record(BetId::new(id), date)
    }

    #[test]
    fn test_empty_rows_is_nothing_to_export() {
        assert!(matches!(to_csv(&[]), Err(LedgerError::NothingToExport)));
        assert!(matches!(full_export(&[]), Err(LedgerError::NothingToExport)));
    }

    #[test]
    fn test_quotes_values_and_doubles_embedded_quotes() {
        let rows = vec![
            ExportRow::new().field("a", "x").field("b", "1"),
            ExportRow::new().field("a", "y\"z").field("b", ""),
        ];

        let csv = to_csv(&rows).unwrap();
        assert_eq!(csv, "a,b\n\"x\",\"1\"\n\"y\"\"z\",\"\"");
    }

    #[test]
    fn test_null_renders_empty() {
        let rows = vec![ExportRow::new().field("a", "x").null_field("b")];
        assert_eq!(to_csv(&rows).unwrap(), "a,b\n\"x\",\"\"");
    }

    #[test]
    fn test_field_order_follows_first_row() {
        let rows = vec![
            ExportRow::new().field("b", "1").field("a", "2"),
            ExportRow::new().field("a", "3").field("b", "4"),
        ];
        assert_eq!(to_csv(&rows).unwrap(), "b,a\n\"1\",\"2\"\n\"4\",\"3\"");
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let rows = vec![
            ExportRow::new().field("a", "1").field("b", "2"),
            ExportRow::new().field("a", "1").field("c", "2"),
        ];
        match to_csv(&rows) {
            Err(LedgerError::RowShape { row, expected, found }) => {
                assert_eq!(row, 2);
                assert_eq!(expected, "a,b");
                assert_eq!(found, "a,c");
            }
            other => panic!("Expected RowShape, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_repeated_header_names() {
        let rows = vec![
            ExportRow::new().field("a", "1").field("a", "2"),
            ExportRow::new().field("a", "1").field("b", "2"),
        ];
        match to_csv(&rows) {
            Err(LedgerError::DuplicateField(name)) => assert_eq!(name, "a"),
            other => panic!("Expected DuplicateField, got {:?}", other),
        }
    }

    #[test]
    fn test_thai_text_and_commas_survive() {
        let rows = vec![ExportRow::new().field("type", "3 ตัวโต๊ด").field("detail", "1, 2")];
        assert_eq!(to_csv(&rows).unwrap(), "type,detail\n\"3 ตัวโต๊ด\",\"1, 2\"");
    }

    #[test]
    fn test_write_export_with_bom() {
        let rows = vec![ExportRow::new().field("a", "1")];

        let mut out = Vec::new();
        write_export(&rows, &mut out, ExportOptions::default()).unwrap();
        assert_eq!(out, "\u{feff}a\n\"1\"".as_bytes());

        let mut out = Vec::new();
        write_export(&rows, &mut out, ExportOptions::plain()).unwrap();
        assert_eq!(out, b"a\n\"1\"");
    }

    #[test]
    fn test_full_export_one_row_per_record() {
        let records = vec![
            record("r1", "123", BetType::Top, 50, 3),
            record("r2", "123", BetType::Top, 60, 0),
        ];

        let csv = full_export(&records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,number,type,base,mul,calc,amount,date");
        assert_eq!(
            lines[1],
            "\"r1\",\"123\",\"บน\",\"50\",\"3\",\"50*3\",\"150\",\"2026-10-18\""
        );
        assert_eq!(
            lines[2],
            "\"r2\",\"123\",\"บน\",\"60\",\"0\",\"60\",\"60\",\"2026-10-18\""
        );
    }

    #[test]
    fn test_critical_export_only_critical_groups() {
        let records = vec![
            record("r1", "123", BetType::Top, 50, 3),
            record("r2", "123", BetType::Top, 60, 0),
            record("r3", "45", BetType::Bottom, 90, 0),
        ];

        let csv = critical_export(&aggregate(&records)).unwrap();
        assert_eq!(
            csv,
            "number,type,base_total,tod_total,total,detail\n\
             \"123\",\"บน\",\"110\",\"3\",\"210\",\"50*3 | 60\""
        );
    }

    #[test]
    fn test_critical_export_without_critical_groups() {
        let records = vec![record("r1", "45", BetType::Bottom, 99, 0)];
        assert!(matches!(
            critical_export(&aggregate(&records)),
            Err(LedgerError::NothingToExport)
        ));
    }

    #[test]
    fn test_summary_table_includes_level() {
        let records = vec![record("r1", "45", BetType::Bottom, 85, 0)];
        let rows = summary_table_rows(&aggregate(&records));
        assert_eq!(rows[0].get("level"), Some("warning"));
        assert_eq!(rows[0].get("calcs"), Some("85"));
    }
}
