// 📚 Ledger Access Port - Read-only contract over the lending ledger
// The engines depend on this trait only, never on a concrete store.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// LEDGER RECORDS
// ============================================================================

/// Catalog item. Owned and mutated by the ledger collaborator; this crate
/// only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Page count. Zero means "not recorded".
    pub pages: i64,
    /// Configured copy count. Non-positive values occur in degraded catalog
    /// data and are surfaced as a precondition failure by the availability
    /// report, not rejected here.
    pub total_copies: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patron {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// One borrow event in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanEvent {
    pub id: i64,
    pub item_id: i64,
    pub patron_id: i64,
    pub borrowed_at: DateTime<Utc>,
    /// None = the loan is still outstanding.
    pub returned_at: Option<DateTime<Utc>>,
}

impl LoanEvent {
    pub fn is_outstanding(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Loan duration in fractional days, if the loan has been returned.
    /// A clock-skewed ledger can produce zero or negative durations; callers
    /// that aggregate durations must filter those out.
    pub fn duration_days(&self) -> Option<f64> {
        self.returned_at
            .map(|returned| (returned - self.borrowed_at).num_seconds() as f64 / 86_400.0)
    }
}

// ============================================================================
// LOAN FILTER
// ============================================================================

/// Filter applied by `LedgerRead::list_loans`. All criteria are optional and
/// combine with AND; the borrowed-at range is inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub item_id: Option<i64>,
    pub patron_id: Option<i64>,
    pub borrowed_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl LoanFilter {
    pub fn all() -> Self {
        LoanFilter::default()
    }

    pub fn for_item(item_id: i64) -> Self {
        LoanFilter {
            item_id: Some(item_id),
            ..LoanFilter::default()
        }
    }

    pub fn for_patron(patron_id: i64) -> Self {
        LoanFilter {
            patron_id: Some(patron_id),
            ..LoanFilter::default()
        }
    }

    pub fn borrowed_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.borrowed_between = Some((start, end));
        self
    }

    /// Check a single event against this filter.
    pub fn matches(&self, event: &LoanEvent) -> bool {
        if let Some(item_id) = self.item_id {
            if event.item_id != item_id {
                return false;
            }
        }

        if let Some(patron_id) = self.patron_id {
            if event.patron_id != patron_id {
                return false;
            }
        }

        if let Some((start, end)) = self.borrowed_between {
            if event.borrowed_at < start || event.borrowed_at > end {
                return false;
            }
        }

        true
    }
}

// ============================================================================
// READ PORT
// ============================================================================

/// Read-only view of the lending ledger.
///
/// Absence (empty collection, unmatched id) is a normal outcome at this
/// boundary; only actual read failures surface as errors, and they propagate
/// to the caller without retries.
pub trait LedgerRead {
    fn list_items(&self) -> Result<Vec<Item>>;
    fn get_item(&self, id: i64) -> Result<Option<Item>>;
    fn list_patrons(&self) -> Result<Vec<Patron>>;
    fn get_patron(&self, id: i64) -> Result<Option<Patron>>;
    fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<LoanEvent>>;
}

// ============================================================================
// IN-MEMORY LEDGER
// ============================================================================

/// Vec-backed ledger, primarily for tests and demos. Events are returned in
/// insertion order, which doubles as the deterministic "natural ordering" of
/// the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    items: Vec<Item>,
    patrons: Vec<Patron>,
    loans: Vec<LoanEvent>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        MemoryLedger::default()
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn add_patron(&mut self, patron: Patron) {
        self.patrons.push(patron);
    }

    pub fn add_loan(&mut self, loan: LoanEvent) {
        self.loans.push(loan);
    }
}

impl LedgerRead for MemoryLedger {
    fn list_items(&self) -> Result<Vec<Item>> {
        Ok(self.items.clone())
    }

    fn get_item(&self, id: i64) -> Result<Option<Item>> {
        Ok(self.items.iter().find(|item| item.id == id).cloned())
    }

    fn list_patrons(&self) -> Result<Vec<Patron>> {
        Ok(self.patrons.clone())
    }

    fn get_patron(&self, id: i64) -> Result<Option<Patron>> {
        Ok(self.patrons.iter().find(|p| p.id == id).cloned())
    }

    fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<LoanEvent>> {
        Ok(self
            .loans
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
