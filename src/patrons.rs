// 👤 Patron Engine - Top patrons and a patron's items within a date window
//
// Date windows are inclusive on both ends and never ordered-checked: an
// inverted window is accepted and yields the empty-range outcome. A missing
// patron is a soft response here, unlike the NotFound error item lookups
// raise (two distinct outcome kinds, kept deliberately; see DESIGN.md).

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::ledger::{LedgerRead, LoanFilter};
use crate::report::{PatronLoanSummary, PatronLoansReport, RankedPatron, TopPatronsReport};
use crate::validate::require_positive_limit;

pub struct PatronEngine<'a> {
    ledger: &'a dyn LedgerRead,
}

impl<'a> PatronEngine<'a> {
    pub fn new(ledger: &'a dyn LedgerRead) -> Self {
        PatronEngine { ledger }
    }

    /// The N patrons with the most borrow events inside the window.
    /// Ties break by ascending patron id.
    pub fn top_patrons(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> EngineResult<TopPatronsReport> {
        require_positive_limit(limit)?;

        let loans = self
            .ledger
            .list_loans(&LoanFilter::all().borrowed_between(start, end))?;
        if loans.is_empty() {
            return Ok(TopPatronsReport::no_records_in_range());
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for loan in &loans {
            *counts.entry(loan.patron_id).or_insert(0) += 1;
        }

        let mut ranked: Vec<(i64, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit as usize);

        let patrons = self.ledger.list_patrons()?;
        let by_id: HashMap<i64, _> = patrons.into_iter().map(|p| (p.id, p)).collect();

        let entries = ranked
            .into_iter()
            .filter_map(|(patron_id, borrow_count)| {
                by_id.get(&patron_id).map(|patron| RankedPatron {
                    id: patron.id,
                    name: patron.name.clone(),
                    borrow_count,
                })
            })
            .collect();

        Ok(TopPatronsReport::ranked(entries))
    }

    /// The distinct items one patron borrowed inside the window, one summary
    /// row per item, in first-borrowed order.
    pub fn patron_items(
        &self,
        patron_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<PatronLoansReport> {
        let patron = match self.ledger.get_patron(patron_id)? {
            Some(patron) => patron,
            None => return Ok(PatronLoansReport::patron_missing(patron_id)),
        };

        let loans = self
            .ledger
            .list_loans(&LoanFilter::for_patron(patron_id).borrowed_between(start, end))?;

        // Distinct item ids, first-seen order.
        let mut seen: Vec<i64> = Vec::new();
        for loan in &loans {
            if !seen.contains(&loan.item_id) {
                seen.push(loan.item_id);
            }
        }

        if seen.is_empty() {
            return Ok(PatronLoansReport::no_items_in_range());
        }

        let mut rows = Vec::new();
        for item_id in seen {
            // Dangling references are skipped, not escalated.
            if let Some(item) = self.ledger.get_item(item_id)? {
                rows.push(PatronLoanSummary {
                    item_id: item.id,
                    title: item.title,
                    author: item.author,
                    patron_name: patron.name.clone(),
                });
            }
        }

        Ok(PatronLoansReport::retrieved(rows))
    }
}

// ============================================================================
// TESTS
// ============================================================================
