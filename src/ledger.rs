//! The sales desk: validates submissions, talks to the store and turns its
//! snapshots into day sheets.
//!
//! The store is handed in at construction, so the ledger runs the same
//! against [`MemoryStore`](crate::store::MemoryStore) in tests as against any
//! other [`BetStore`]. The store also decides which day is today, so records
//! are stamped and watched by the same calendar.

use crate::bet::{BetDraft, BetId, BetRecord, BetType, DateKey};
use crate::error::{LedgerError, Result};
use crate::store::{BetStore, SnapshotCallback, Subscription};
use crate::summary::DaySheet;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::io::Read;

/// Bet entry front end over an injected store.
pub struct Ledger<S: BetStore> {
    store: S,
}

impl<S: BetStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Ledger { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Key of the day currently being sold, as the store stamps it.
    pub fn today(&self) -> DateKey {
        self.store.today()
    }

    /// Validates a draft and stores it.
    ///
    /// A rejected draft never reaches the store. Store failures are returned
    /// as-is.
    pub fn submit(&self, draft: &BetDraft) -> Result<BetId> {
        let bet = draft.validate()?;
        let (number, bet_type, calc, amount) = (
            bet.number.clone(),
            bet.bet_type.clone(),
            bet.calc.clone(),
            bet.amount,
        );

        let id = self.store.insert(bet)?;
        debug!(
            "Recorded {} {} ({}) = {} as {}",
            number, bet_type, calc, amount, id
        );
        Ok(id)
    }

    /// Deletes every record of `records` in the `(number, type)` group.
    ///
    /// Deletes run one at a time and stop at the first failure, whose error
    /// is returned; records deleted before it stay deleted. Returns how many
    /// records were removed.
    pub fn delete_group(
        &self,
        records: &[BetRecord],
        number: &str,
        bet_type: &BetType,
    ) -> Result<usize> {
        let mut deleted = 0;

        for record in records.iter().filter(|r| r.is_in_group(number, bet_type)) {
            if let Err(e) = self.store.delete_by_id(&record.id) {
                warn!(
                    "Deleting group {} ({}) stopped after {} records: {}",
                    number, bet_type, deleted, e
                );
                return Err(e);
            }
            deleted += 1;
        }

        debug!("Deleted {} records of group {} ({})", deleted, number, bet_type);
        Ok(deleted)
    }

    /// Subscribes to today's records; `on_sheet` gets a freshly computed
    /// [`DaySheet`] for the initial snapshot and after every change.
    pub fn watch_today<F>(&self, mut on_sheet: F) -> Result<Subscription>
    where
        F: FnMut(DaySheet) + Send + 'static,
    {
        let callback: SnapshotCallback =
            Box::new(move |records: &[BetRecord]| on_sheet(DaySheet::from_records(records.to_vec())));
        self.store.subscribe(self.today(), callback)
    }

    pub fn unwatch(&self, subscription: Subscription) -> Result<()> {
        self.store.unsubscribe(subscription)
    }

    /// Submits every row of a `number,type,base,mul` CSV.
    ///
    /// Rejected rows are logged at warn level and skipped; store failures
    /// abort the import. Returns the ids of the stored bets in file order.
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<Vec<BetId>> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut ids = Vec::new();
        for (row_idx, result) in csv_reader.deserialize::<BetDraft>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let draft = match result {
                Ok(draft) => draft,
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    continue;
                }
            };

            match self.submit(&draft) {
                Ok(id) => ids.push(id),
                Err(e @ LedgerError::Validation { .. }) => warn!("Row {}: {}", row_num, e),
                Err(e) => return Err(e),
            }
        }

        debug!("Imported {} bets", ids.len());
        Ok(ids)
    }
}
