//! Bet record storage.
//!
//! [`BetStore`] is the seam between the ledger and whatever persists the
//! records. [`MemoryStore`] is the in-process implementation used by the CLI
//! and the tests.

use crate::bet::{BetId, BetRecord, DateKey, NewBet};
use crate::error::{LedgerError, Result};
use chrono::{Local, NaiveDate};
use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

/// Receives the full set of a day's records on every change.
pub type SnapshotCallback = Box<dyn FnMut(&[BetRecord]) + Send>;

/// Handle returned by [`BetStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub date: DateKey,
}

/// Storage for bet records, scoped by day.
///
/// Implementations assign ids, stamp the current day on insert, and push a
/// snapshot of every matching record to subscribers after each change.
/// Snapshot order must be stable for a given store state.
pub trait BetStore: Send + Sync {
    /// The day new records are stamped with.
    fn today(&self) -> DateKey;

    /// Stores a bet and returns its new id.
    fn insert(&self, bet: NewBet) -> Result<BetId>;

    /// Registers `on_change` for records dated `date`. The current snapshot
    /// is delivered before this returns.
    fn subscribe(&self, date: DateKey, on_change: SnapshotCallback) -> Result<Subscription>;

    /// Stops deliveries to a subscription. Unknown handles are ignored.
    fn unsubscribe(&self, subscription: Subscription) -> Result<()>;

    /// Removes exactly one record.
    fn delete_by_id(&self, id: &BetId) -> Result<()>;
}

/// Source of the current calendar day.
pub trait Clock: Send + Sync {
    fn today(&self) -> DateKey;
}

/// The machine's local calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateKey {
        DateKey::new(Local::now().date_naive())
    }
}

/// A settable day, shared between clones.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        FixedClock {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        match self.date.lock() {
            Ok(mut guard) => *guard = date,
            Err(poisoned) => *poisoned.into_inner() = date,
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DateKey {
        let date = match self.date.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        DateKey::new(date)
    }
}

struct Subscriber {
    id: u64,
    date: DateKey,
    on_change: SnapshotCallback,
}

#[derive(Default)]
struct Records {
    rows: Vec<BetRecord>,
    next_id: u64,
}

/// In-memory [`BetStore`].
///
/// Records are kept in insertion order, which is also snapshot order.
/// Callbacks run on the mutating thread and must not call back into the
/// same store. A panicking callback is logged and does not fail the change
/// that triggered it.
pub struct MemoryStore<C: Clock = SystemClock> {
    records: Mutex<Records>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscription: Mutex<u64>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    pub fn new() -> Self {
        MemoryStore::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        MemoryStore {
            records: Mutex::new(Records::default()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: Mutex::new(0),
            clock,
        }
    }

    /// Current records for one day, in insertion order.
    pub fn records_for(&self, date: DateKey) -> Result<Vec<BetRecord>> {
        let records = lock(&self.records)?;
        Ok(records
            .rows
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    /// Number of records across all days.
    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.records)?.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Pushes the day's snapshot to its subscribers. The change is already
    /// committed, so delivery problems are logged rather than returned.
    fn notify(&self, date: DateKey) {
        let snapshot = match self.records_for(date) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping notification for {}: {}", date, e);
                return;
            }
        };

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for subscriber in subscribers.iter_mut().filter(|s| s.date == date) {
            debug!(
                "Delivering {} records for {} to subscription {}",
                snapshot.len(),
                date,
                subscriber.id
            );
            let delivered =
                panic::catch_unwind(AssertUnwindSafe(|| (subscriber.on_change)(&snapshot)));
            if delivered.is_err() {
                warn!("Subscription {} panicked while handling {}", subscriber.id, date);
            }
        }
    }
}

impl<C: Clock> BetStore for MemoryStore<C> {
    fn today(&self) -> DateKey {
        self.clock.today()
    }

    fn insert(&self, bet: NewBet) -> Result<BetId> {
        let date = self.clock.today();
        let id = {
            let mut records = lock(&self.records)?;
            records.next_id += 1;
            let id = BetId::new(format!("bet-{}", records.next_id));
            records.rows.push(bet.into_record(id.clone(), date));
            id
        };

        debug!("Stored {} for {}", id, date);
        self.notify(date);
        Ok(id)
    }

    fn subscribe(&self, date: DateKey, mut on_change: SnapshotCallback) -> Result<Subscription> {
        let id = {
            let mut next = lock(&self.next_subscription)?;
            *next += 1;
            *next
        };

        on_change(&self.records_for(date)?);

        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Subscriber {
                id,
                date,
                on_change,
            });

        debug!("Subscription {} watching {}", id, date);
        Ok(Subscription { id, date })
    }

    fn unsubscribe(&self, subscription: Subscription) -> Result<()> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|s| s.id != subscription.id);
        Ok(())
    }

    fn delete_by_id(&self, id: &BetId) -> Result<()> {
        let removed = {
            let mut records = lock(&self.records)?;
            let pos = records
                .rows
                .iter()
                .position(|r| &r.id == id)
                .ok_or_else(|| LedgerError::UnknownRecord(id.clone()))?;
            records.rows.remove(pos)
        };

        debug!("Deleted {} from {}", removed.id, removed.date);
        self.notify(removed.date);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| LedgerError::Store("store lock poisoned".to_string()))
}
