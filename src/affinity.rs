// 🔗 Affinity Engine - Co-borrowing and reading-rate reports
//
// Related items measure the breadth of shared audience: each related item is
// scored by the number of DISTINCT patrons who borrowed both it and the
// target, never by raw event volume. Reading rate is a five-way
// short-circuit with one success state and four soft "no data" states, all
// of them successful responses distinguished only by message text.

use std::collections::{HashMap, HashSet};

use crate::error::EngineResult;
use crate::ledger::{LedgerRead, LoanFilter};
use crate::report::{
    round2, ReadingRateEstimate, ReadingRateReport, RelatedItem, RelatedItemsReport,
};

pub struct AffinityEngine<'a> {
    ledger: &'a dyn LedgerRead,
}

impl<'a> AffinityEngine<'a> {
    pub fn new(ledger: &'a dyn LedgerRead) -> Self {
        AffinityEngine { ledger }
    }

    /// Items that share borrowers with the target item.
    ///
    /// Any id is accepted here (no positivity check): an unmatched id simply
    /// has no borrowers and yields the soft "no borrowers" outcome. The
    /// target itself never appears in the results.
    pub fn related_items(&self, item_id: i64) -> EngineResult<RelatedItemsReport> {
        let target_loans = self.ledger.list_loans(&LoanFilter::for_item(item_id))?;
        let borrowers: HashSet<i64> = target_loans.iter().map(|loan| loan.patron_id).collect();

        if borrowers.is_empty() {
            return Ok(RelatedItemsReport::no_borrowers());
        }

        // Other loans by those same patrons, grouped by item, each group
        // keeping the distinct set of shared borrowers.
        let all_loans = self.ledger.list_loans(&LoanFilter::all())?;
        let mut shared: HashMap<i64, HashSet<i64>> = HashMap::new();
        for loan in &all_loans {
            if loan.item_id != item_id && borrowers.contains(&loan.patron_id) {
                shared.entry(loan.item_id).or_default().insert(loan.patron_id);
            }
        }

        let mut ranked: Vec<(i64, usize)> = shared
            .into_iter()
            .map(|(related_id, patrons)| (related_id, patrons.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let items = self.ledger.list_items()?;
        let by_id: HashMap<i64, _> = items.into_iter().map(|item| (item.id, item)).collect();

        let related = ranked
            .into_iter()
            .filter_map(|(related_id, common_borrower_count)| {
                by_id.get(&related_id).map(|item| RelatedItem {
                    id: item.id,
                    title: item.title.clone(),
                    author: item.author.clone(),
                    common_borrower_count,
                })
            })
            .collect();

        Ok(RelatedItemsReport::ranked(related))
    }

    /// Estimate how quickly readers move through an item's pages.
    ///
    /// Short-circuit order: unknown item, missing page count, no completed
    /// loans, no usable samples, then the estimate. Non-positive durations
    /// (same-day returns, clock skew) are excluded from both the duration
    /// sum and the sample count.
    pub fn reading_rate(&self, item_id: i64) -> EngineResult<ReadingRateReport> {
        let item = match self.ledger.get_item(item_id)? {
            Some(item) => item,
            None => return Ok(ReadingRateReport::item_not_found(item_id)),
        };

        if item.pages <= 0 {
            return Ok(ReadingRateReport::no_page_count(item.id, &item.title));
        }

        let loans = self.ledger.list_loans(&LoanFilter::for_item(item_id))?;
        let completed: Vec<f64> = loans.iter().filter_map(|loan| loan.duration_days()).collect();

        if completed.is_empty() {
            return Ok(ReadingRateReport::no_completed_loans(item.id, &item.title));
        }

        let usable: Vec<f64> = completed.into_iter().filter(|days| *days > 0.0).collect();
        if usable.is_empty() {
            return Ok(ReadingRateReport::insufficient_data(item.id, &item.title));
        }

        let total_days: f64 = usable.iter().sum();
        let average_days = total_days / usable.len() as f64;

        Ok(ReadingRateReport::estimated(ReadingRateEstimate {
            item_id: item.id,
            title: item.title,
            average_pages_per_day: round2(item.pages as f64 / average_days),
            sample_size: usable.len(),
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
        Utc.with_ymd_and_hms(2025, 5, day, 10, 0, 0).unwrap()
    }

    fn create_test_item(id: i64, title: &str, pages: i64) -> Item {
        Item {
            id,
            title: title.to_string(),
            author: format!("Author{}", id),
            pages,
            total_copies: 3,
        }
    }

    fn create_outstanding_loan(id: i64, item_id: i64, patron_id: i64) -> LoanEvent {
        LoanEvent {
            id,
            item_id,
            patron_id,
            borrowed_at: ts(1),
            returned_at: None,
        }
    }

    fn create_completed_loan(id: i64, item_id: i64, borrowed_day: u32, returned_day: u32) -> LoanEvent {
        LoanEvent {
            id,
            item_id,
            patron_id: 1,
            borrowed_at: ts(borrowed_day),
            returned_at: Some(ts(returned_day)),
        }
    }

    #[test]
    fn test_related_items_counts_distinct_patrons() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Target", 100));
        ledger.add_item(create_test_item(2, "Related", 100));
        // Patrons 10 and 11 borrowed the target.
        ledger.add_loan(create_outstanding_loan(1, 1, 10));
        ledger.add_loan(create_outstanding_loan(2, 1, 11));
        // Patron 10 borrowed item 2 three times; still ONE distinct patron.
        ledger.add_loan(create_outstanding_loan(3, 2, 10));
        ledger.add_loan(create_outstanding_loan(4, 2, 10));
        ledger.add_loan(create_outstanding_loan(5, 2, 10));

        let report = AffinityEngine::new(&ledger).related_items(1).unwrap();

        assert_eq!(report.message, "Related items retrieved successfully.");
        assert_eq!(report.related.len(), 1);
        assert_eq!(report.related[0].id, 2);
        assert_eq!(report.related[0].common_borrower_count, 1);
    }

    #[test]
    fn test_related_items_never_includes_target() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Target", 100));
        ledger.add_loan(create_outstanding_loan(1, 1, 10));
        ledger.add_loan(create_outstanding_loan(2, 1, 10));

        let report = AffinityEngine::new(&ledger).related_items(1).unwrap();

        assert!(report.related.iter().all(|related| related.id != 1));
        assert!(report.related.is_empty());
    }

    #[test]
    fn test_related_items_sorted_by_shared_audience() {
        let mut ledger = MemoryLedger::new();
        for id in 1..=3 {
            ledger.add_item(create_test_item(id, "Item", 100));
        }
        // Patrons 10, 11 borrowed target 1.
        ledger.add_loan(create_outstanding_loan(1, 1, 10));
        ledger.add_loan(create_outstanding_loan(2, 1, 11));
        // Item 3 shares both patrons, item 2 only one.
        ledger.add_loan(create_outstanding_loan(3, 3, 10));
        ledger.add_loan(create_outstanding_loan(4, 3, 11));
        ledger.add_loan(create_outstanding_loan(5, 2, 11));

        let report = AffinityEngine::new(&ledger).related_items(1).unwrap();

        assert_eq!(report.related.len(), 2);
        assert_eq!(report.related[0].id, 3);
        assert_eq!(report.related[0].common_borrower_count, 2);
        assert_eq!(report.related[1].id, 2);
        assert_eq!(report.related[1].common_borrower_count, 1);
    }

    #[test]
    fn test_related_items_no_borrowers_is_soft_outcome() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Lonely", 100));

        // Unknown ids are accepted too; both yield the same soft outcome.
        for id in [1, 999, -5] {
            let report = AffinityEngine::new(&ledger).related_items(id).unwrap();
            assert_eq!(
                report.message,
                "No patrons have borrowed the specified item."
            );
            assert!(report.related.is_empty());
        }
    }

    #[test]
    fn test_related_items_skips_dangling_item() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Target", 100));
        ledger.add_loan(create_outstanding_loan(1, 1, 10));
        // Item 77 no longer resolves in the catalog.
        ledger.add_loan(create_outstanding_loan(2, 77, 10));

        let report = AffinityEngine::new(&ledger).related_items(1).unwrap();

        assert!(report.related.is_empty());
    }

    #[test]
    fn test_reading_rate_example_from_two_loans() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 100));
        ledger.add_loan(create_completed_loan(1, 1, 1, 6)); // 5 days
        ledger.add_loan(create_completed_loan(2, 1, 10, 20)); // 10 days

        let report = AffinityEngine::new(&ledger).reading_rate(1).unwrap();

        // average duration 7.5 days -> 100 / 7.5 = 13.33
        assert_eq!(report.average_pages_per_day, Some(13.33));
        assert_eq!(report.sample_size, Some(2));
        assert_eq!(report.message, "Reading rate estimated successfully.");
    }

    #[test]
    fn test_reading_rate_unknown_item() {
        let ledger = MemoryLedger::new();
        let report = AffinityEngine::new(&ledger).reading_rate(9).unwrap();

        assert_eq!(report.message, "Item not found.");
        assert_eq!(report.item_id, 9);
        assert!(!report.has_estimate());
    }

    #[test]
    fn test_reading_rate_missing_page_count() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "NoPages", 0));

        let report = AffinityEngine::new(&ledger).reading_rate(1).unwrap();

        assert_eq!(report.message, "Page count not available for this item.");
        assert_eq!(report.title.as_deref(), Some("NoPages"));
        assert!(!report.has_estimate());
    }

    #[test]
    fn test_reading_rate_no_completed_loans() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 200));
        ledger.add_loan(create_outstanding_loan(1, 1, 10));

        let report = AffinityEngine::new(&ledger).reading_rate(1).unwrap();

        assert_eq!(
            report.message,
            "No completed borrow records found for this item."
        );
        assert!(!report.has_estimate());
    }

    #[test]
    fn test_reading_rate_excludes_non_positive_durations() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 100));
        // Same-instant return: completed but unusable.
        ledger.add_loan(create_completed_loan(1, 1, 4, 4));

        let report = AffinityEngine::new(&ledger).reading_rate(1).unwrap();

        assert_eq!(
            report.message,
            "Could not estimate reading rate due to insufficient data."
        );
        assert!(!report.has_estimate());
    }

    #[test]
    fn test_reading_rate_sample_count_ignores_skewed_loans() {
        let mut ledger = MemoryLedger::new();
        ledger.add_item(create_test_item(1, "Item1", 100));
        ledger.add_loan(create_completed_loan(1, 1, 1, 11)); // 10 days, usable
        ledger.add_loan(create_completed_loan(2, 1, 5, 5)); // zero-duration, excluded

        let report = AffinityEngine::new(&ledger).reading_rate(1).unwrap();

        assert_eq!(report.sample_size, Some(1));
        assert_eq!(report.average_pages_per_day, Some(10.0));
    }
}
