//! History ledger of successful evaluations.
//!
//! Entries are immutable once recorded and kept most-recent-first. The
//! ledger holds no presentation reference: it notifies registered listeners
//! of every change and leaves re-rendering to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A value returned by the evaluation engine.
///
/// Numbers are kept exactly as returned; rounding for display happens in
/// the display projector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResultValue {
    Number(f64),
    Text(String),
}

impl ResultValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Record of a single successful evaluation.
///
/// # Example
///
/// ```rust
/// use tally::core::{HistoryEntry, ResultValue};
///
/// let entry = HistoryEntry::new("2 + 3", ResultValue::Number(5.0));
/// assert_eq!(entry.expression(), "2 + 3");
/// assert_eq!(entry.result().to_string(), "5");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: Uuid,
    expression: String,
    result: ResultValue,
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(expression: impl Into<String>, result: ResultValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            expression: expression.into(),
            result,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn result(&self) -> &ResultValue {
        &self.result
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Change signal emitted after every ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerChange {
    Recorded { id: Uuid },
    Cleared { removed: usize },
}

type Listener = Box<dyn Fn(&LedgerChange) + Send + Sync>;

/// Append-only, most-recent-first record of successful evaluations.
///
/// Unbounded unless a cap is set with [`HistoryLedger::with_max_entries`];
/// when capped, the oldest entries are evicted first. A capped ledger
/// always keeps at least the latest entry.
///
/// # Example
///
/// ```rust
/// use tally::core::{HistoryLedger, ResultValue};
///
/// let mut ledger = HistoryLedger::new();
/// ledger.record("1 + 1", ResultValue::Number(2.0));
/// ledger.record("2 * 3", ResultValue::Number(6.0));
///
/// let expressions: Vec<_> = ledger.entries().iter().map(|e| e.expression()).collect();
/// assert_eq!(expressions, vec!["2 * 3", "1 + 1"]);
///
/// ledger.clear();
/// assert!(ledger.entries().is_empty());
/// ```
#[derive(Default, Serialize, Deserialize)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    max_entries: Option<usize>,
    #[serde(skip)]
    listeners: Vec<Listener>,
}

impl HistoryLedger {
    /// Create a new empty, unbounded ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the ledger at `max` entries.
    pub fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self.evict();
        self
    }

    /// Rebuild a ledger from entries ordered most-recent-first.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Register a listener notified after every `record` and `clear`.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&LedgerChange) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Prepend a new entry. No deduplication.
    pub fn record(&mut self, expression: impl Into<String>, result: ResultValue) -> &HistoryEntry {
        let entry = HistoryEntry::new(expression, result);
        let id = entry.id();
        self.entries.insert(0, entry);
        self.evict();
        self.notify(LedgerChange::Recorded { id });
        &self.entries[0]
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.notify(LedgerChange::Cleared { removed });
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    fn evict(&mut self) {
        if let Some(max) = self.max_entries {
            self.entries.truncate(max.max(1));
        }
    }

    fn notify(&self, change: LedgerChange) {
        for listener in &self.listeners {
            listener(&change);
        }
    }
}

impl fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("entries", &self.entries)
            .field("max_entries", &self.max_entries)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
