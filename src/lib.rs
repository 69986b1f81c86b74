//! # Lotto Ledger
//!
//! Bet entry, per-number aggregation and CSV reporting for a small lottery
//! sales desk.
//!
//! ## Design Principles
//!
//! - **Amounts fixed at entry**: a bet's amount and formula text are
//!   computed once, when it is submitted, and stored with it
//! - **Full recompute**: every store snapshot is re-aggregated from scratch,
//!   with no incremental state to drift
//! - **Structural grouping**: groups are keyed by `(number, type)` values,
//!   never by a joined string
//! - **Injected storage**: the ledger works against any [`BetStore`]
//!
//! ## Example
//!
//! ```
//! use lotto_ledger::{critical_export, BetDraft, DaySheet, Ledger, MemoryStore};
//!
//! let ledger = Ledger::new(MemoryStore::new());
//! ledger.submit(&BetDraft::new("123", "บน", "50", "3")).unwrap();
//! ledger.submit(&BetDraft::new("123", "บน", "60", "")).unwrap();
//!
//! let records = ledger.store().records_for(ledger.today()).unwrap();
//! let sheet = DaySheet::from_records(records);
//! assert_eq!(sheet.total_sales, 210);
//! assert!(critical_export(&sheet.summary).unwrap().contains("\"50*3 | 60\""));
//! ```

pub mod bet;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod store;
pub mod summary;

pub use bet::{calc_text, compute_amount, BetDraft, BetId, BetRecord, BetType, DateKey, NewBet};
pub use error::{LedgerError, Result};
pub use export::{
    critical_export, critical_export_rows, export_to_file, full_export, full_export_rows,
    summary_table_rows, to_csv, write_export, ExportOptions, ExportRow,
};
pub use ledger::Ledger;
pub use store::{BetStore, Clock, FixedClock, MemoryStore, SnapshotCallback, Subscription, SystemClock};
pub use summary::{aggregate, classify, DaySheet, GroupKey, RiskLevel, Summary, SummaryRow};
