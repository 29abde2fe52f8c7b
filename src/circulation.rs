// 🔄 Circulation Engine - Top-borrowed items and copy availability
//
// Both reports are pure functions over a per-request ledger snapshot. The
// grouping pipeline is explicit (materialize, group, count, sort, limit)
// so ordering never depends on a query engine's defaults.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::ledger::{LedgerRead, LoanFilter};
use crate::report::{AvailabilityReport, AvailabilitySnapshot, RankedItem, TopBorrowedReport};
use crate::validate::{require_positive_id, require_positive_limit};

pub struct CirculationEngine<'a> {
    ledger: &'a dyn LedgerRead,
}

impl<'a> CirculationEngine<'a> {
    pub fn new(ledger: &'a dyn LedgerRead) -> Self {
        CirculationEngine { ledger }
    }

    /// The N most-borrowed items, ranked by total loan events.
    ///
    /// Ties break by ascending item id. Loans referencing items the catalog
    /// no longer resolves are skipped silently. Zero loan events overall is
    /// a valid outcome ("no borrow data"), not an error; an empty catalog
    /// is a precondition failure.
    pub fn top_borrowed(&self, limit: i64) -> EngineResult<TopBorrowedReport> {
        require_positive_limit(limit)?;

        let items = self.ledger.list_items()?;
        if items.is_empty() {
            return Err(EngineError::FailedPrecondition(
                "No items available in the catalog.".to_string(),
            ));
        }

        let loans = self.ledger.list_loans(&LoanFilter::all())?;
        if loans.is_empty() {
            return Ok(TopBorrowedReport::no_borrow_data());
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for loan in &loans {
            *counts.entry(loan.item_id).or_insert(0) += 1;
        }

        // Count descending, item id ascending on ties.
        let mut ranked: Vec<(i64, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit as usize);

        let by_id: HashMap<i64, _> = items.into_iter().map(|item| (item.id, item)).collect();

        let entries = ranked
            .into_iter()
            .filter_map(|(item_id, borrow_count)| {
                by_id.get(&item_id).map(|item| RankedItem {
                    id: item.id,
                    title: item.title.clone(),
                    author: item.author.clone(),
                    borrow_count,
                })
            })
            .collect();

        Ok(TopBorrowedReport::ranked(entries))
    }

    /// Borrowed vs available copies for one item.
    ///
    /// A non-positive configured copy count is degraded catalog data and
    /// fails the precondition; outstanding loans exceeding configured copies
    /// signal an upstream integrity violation and fail as Internal.
    pub fn availability(&self, item_id: i64) -> EngineResult<AvailabilityReport> {
        require_positive_id(item_id, "Item ID")?;

        let item = self.ledger.get_item(item_id)?.ok_or_else(|| {
            EngineError::NotFound(format!("Item with ID {} not found.", item_id))
        })?;

        if item.total_copies <= 0 {
            return Err(EngineError::FailedPrecondition(format!(
                "Item with ID {} has no available copies configured.",
                item_id
            )));
        }

        let loans = self.ledger.list_loans(&LoanFilter::for_item(item_id))?;
        let borrowed_count = loans.iter().filter(|loan| loan.is_outstanding()).count() as i64;

        if borrowed_count > item.total_copies {
            return Err(EngineError::Internal(format!(
                "Inconsistent data: borrowed copies ({}) exceed total copies ({}) for item ID {}.",
                borrowed_count, item.total_copies, item_id
            )));
        }

        Ok(AvailabilityReport::retrieved(AvailabilitySnapshot {
            id: item.id,
            borrowed_count,
            available_count: item.total_copies - borrowed_count,
        }))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Item, LoanEvent, MemoryLedger};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()
    }

    fn create_test_item(id: i64, title: &str, total_copies: i64) -> Item {
        Item {
            id,
            title: title.to_string(),
            author: format!("Author{}", id),
            pages: 300,
            total_copies,
        }
    }

    fn create_test_loan(id: i64, item_id: i64, patron_id: i64, returned: bool) -> LoanEvent {
        LoanEvent {
            id,
            item_id,
            patron_id,
            borrowed_at: ts(1),
            returned_at: if returned { Some(ts(8)) } else { None },
        }
    }

    #[test]
    fn test_top_borrowed_ranks_by_count() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 5));
        ledger.add_item(create_test_item(2, "Item2", 3));
        ledger.add_loan(create_test_loan(1, 1, 10, false));
        ledger.add_loan(create_test_loan(2, 1, 11, false));
        ledger.add_loan(create_test_loan(3, 2, 10, false));

        let report = CirculationEngine::new(&ledger).top_borrowed(2).unwrap();

        assert_eq!(report.message, "Top borrowed items retrieved successfully.");
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].id, 1);
        assert_eq!(report.items[0].borrow_count, 2);
        assert_eq!(report.items[1].id, 2);
        assert_eq!(report.items[1].borrow_count, 1);
    }

    #[test]
    fn test_top_borrowed_caps_at_limit_and_breaks_ties_by_id() {
        let mut ledger = MemoryLedger::new();
        for id in 1..=3 {
            ledger.add_item(create_test_item(id, "Item", 2));
            ledger.add_loan(create_test_loan(id, id, 10, false));
        }

        let report = CirculationEngine::new(&ledger).top_borrowed(2).unwrap();

        // All counts equal: ascending id wins.
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].id, 1);
        assert_eq!(report.items[1].id, 2);
    }

    #[test]
    fn test_top_borrowed_rejects_non_positive_limit() {
        let ledger = MemoryLedger::new();
        let engine = CirculationEngine::new(&ledger);

        for limit in [0, -5] {
            let err = engine.top_borrowed(limit).unwrap_err();
            assert_eq!(err.kind(), "InvalidArgument");
        }
    }

    #[test]
    fn test_top_borrowed_empty_catalog_is_precondition_failure() {
        let ledger = MemoryLedger::new();
        let err = CirculationEngine::new(&ledger).top_borrowed(5).unwrap_err();

        assert_eq!(err.kind(), "FailedPrecondition");
        assert!(err.to_string().contains("No items available in the catalog."));
    }

    #[test]
    fn test_top_borrowed_no_loans_is_soft_outcome() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 3));

        let report = CirculationEngine::new(&ledger).top_borrowed(5).unwrap();

        assert_eq!(report.message, "No borrow data available.");
        assert!(report.items.is_empty());
    }

    #[test]
    fn test_top_borrowed_skips_dangling_item_reference() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 3));
        ledger.add_loan(create_test_loan(1, 1, 10, false));
        // Item 99 was deleted from the catalog but its loans remain.
        ledger.add_loan(create_test_loan(2, 99, 10, false));
        ledger.add_loan(create_test_loan(3, 99, 11, false));

        let report = CirculationEngine::new(&ledger).top_borrowed(5).unwrap();

        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].id, 1);
    }

    #[test]
    fn test_availability_counts_outstanding_only() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 5));
        ledger.add_loan(create_test_loan(1, 1, 10, true)); // returned
        ledger.add_loan(create_test_loan(2, 1, 11, false)); // outstanding

        let report = CirculationEngine::new(&ledger).availability(1).unwrap();

        assert_eq!(report.snapshot.borrowed_count, 1);
        assert_eq!(report.snapshot.available_count, 4);
        assert_eq!(
            report.snapshot.borrowed_count + report.snapshot.available_count,
            5
        );
        assert_eq!(report.message, "Item availability retrieved successfully.");
    }

    #[test]
    fn test_availability_rejects_non_positive_id() {
        let ledger = MemoryLedger::new();
        let err = CirculationEngine::new(&ledger).availability(0).unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn test_availability_unknown_item_is_not_found() {
        let ledger = MemoryLedger::new();
        let err = CirculationEngine::new(&ledger).availability(42).unwrap_err();

        assert_eq!(err.kind(), "NotFound");
        assert!(err.to_string().contains("Item with ID 42 not found."));
    }

    #[test]
    fn test_availability_non_positive_copies_is_precondition_failure() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(3, "Degraded", -3));

        let err = CirculationEngine::new(&ledger).availability(3).unwrap_err();

        assert_eq!(err.kind(), "FailedPrecondition");
        assert!(err.to_string().contains("no available copies configured"));
    }

    #[test]
    fn test_availability_borrowed_exceeding_total_is_internal() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 3));
        for loan_id in 1..=4 {
            ledger.add_loan(create_test_loan(loan_id, 1, loan_id, false));
        }

        let err = CirculationEngine::new(&ledger).availability(1).unwrap_err();

        assert_eq!(err.kind(), "Internal");
        assert!(err.to_string().contains("exceed total copies"));
    }

    #[test]
    fn test_reports_are_idempotent_on_unchanged_ledger() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 5));
        ledger.add_loan(create_test_loan(1, 1, 10, false));

        let engine = CirculationEngine::new(&ledger);
        let first = engine.top_borrowed(3).unwrap();
        let second = engine.top_borrowed(3).unwrap();

        assert_eq!(first.items, second.items);
        assert_eq!(first.message, second.message);
    }
}
