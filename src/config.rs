//! Thresholds, export presets and environment settings.

use std::path::PathBuf;

/// Summed stake at which a group is flagged as a warning.
pub const WARNING_THRESHOLD: u64 = 80;

/// Summed stake at which a group is critical and lands in the critical export.
pub const CRITICAL_THRESHOLD: u64 = 100;

/// File name of the full export.
pub const FULL_EXPORT_FILENAME: &str = "lotto_all.csv";

/// File name of the critical-only export.
pub const CRITICAL_EXPORT_FILENAME: &str = "lotto_over_100.csv";

/// Joins a group's formula texts in the critical export.
pub const DETAIL_SEPARATOR: &str = " | ";

/// Prefix written by exports so spreadsheet applications decode Thai text as UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

/// Prepend a byte-order mark to export files (set LOTTO_CSV_BOM=0 to disable).
/// Default: true
pub fn csv_bom_enabled() -> bool {
    static CACHED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("LOTTO_CSV_BOM")
            .map(|v| !(v == "0" || v.to_lowercase() == "false"))
            .unwrap_or(true)
    })
}

/// Directory export files are written into (LOTTO_OUTPUT_DIR).
/// Default: current directory
pub fn output_dir() -> PathBuf {
    std::env::var_os("LOTTO_OUTPUT_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
