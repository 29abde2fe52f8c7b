// 📊 Report Assembler - Response records for the six report operations
//
// Every response carries a human-readable `message`. Soft "no data" outcomes
// reuse the success path with an explanatory message and zero results;
// callers are expected to branch on the message, so the exact strings are
// part of the API surface and are asserted verbatim in tests.

use serde::{Deserialize, Serialize};

// ============================================================================
// DERIVED RECORDS (computed per request, never persisted)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub borrow_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub id: i64,
    pub borrowed_count: i64,
    pub available_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedItem {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Number of DISTINCT patrons who borrowed both the target item and this
    /// one. Breadth of shared audience, not volume of repeated borrowing.
    pub common_borrower_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRateEstimate {
    pub item_id: i64,
    pub title: String,
    /// Pages per day, rounded to 2 decimal places.
    pub average_pages_per_day: f64,
    /// Count of usable (positive-duration) completed loans.
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPatron {
    pub id: i64,
    pub name: String,
    pub borrow_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatronLoanSummary {
    pub item_id: i64,
    pub title: String,
    pub author: String,
    pub patron_name: String,
}

// ============================================================================
// RESPONSE RECORDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopBorrowedReport {
    pub message: String,
    pub items: Vec<RankedItem>,
}

impl TopBorrowedReport {
    pub fn ranked(items: Vec<RankedItem>) -> Self {
        TopBorrowedReport {
            message: "Top borrowed items retrieved successfully.".to_string(),
            items,
        }
    }

    /// Valid, non-exceptional outcome: the catalog has items but the ledger
    /// holds no borrow events at all.
    pub fn no_borrow_data() -> Self {
        TopBorrowedReport {
            message: "No borrow data available.".to_string(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub message: String,
    pub snapshot: AvailabilitySnapshot,
}

impl AvailabilityReport {
    pub fn retrieved(snapshot: AvailabilitySnapshot) -> Self {
        AvailabilityReport {
            message: "Item availability retrieved successfully.".to_string(),
            snapshot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedItemsReport {
    pub message: String,
    pub related: Vec<RelatedItem>,
}

impl RelatedItemsReport {
    pub fn ranked(related: Vec<RelatedItem>) -> Self {
        RelatedItemsReport {
            message: "Related items retrieved successfully.".to_string(),
            related,
        }
    }

    pub fn no_borrowers() -> Self {
        RelatedItemsReport {
            message: "No patrons have borrowed the specified item.".to_string(),
            related: Vec::new(),
        }
    }
}

/// Five-way terminal state: one success, four "no data" outcomes. All are
/// successful responses distinguished by message text; the numeric fields
/// are absent unless an estimate was actually produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRateReport {
    pub item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_pages_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
    pub message: String,
}

impl ReadingRateReport {
    pub fn item_not_found(item_id: i64) -> Self {
        ReadingRateReport {
            item_id,
            title: None,
            average_pages_per_day: None,
            sample_size: None,
            message: "Item not found.".to_string(),
        }
    }

    pub fn no_page_count(item_id: i64, title: &str) -> Self {
        ReadingRateReport {
            item_id,
            title: Some(title.to_string()),
            average_pages_per_day: None,
            sample_size: None,
            message: "Page count not available for this item.".to_string(),
        }
    }

    pub fn no_completed_loans(item_id: i64, title: &str) -> Self {
        ReadingRateReport {
            item_id,
            title: Some(title.to_string()),
            average_pages_per_day: None,
            sample_size: None,
            message: "No completed borrow records found for this item.".to_string(),
        }
    }

    pub fn insufficient_data(item_id: i64, title: &str) -> Self {
        ReadingRateReport {
            item_id,
            title: Some(title.to_string()),
            average_pages_per_day: None,
            sample_size: None,
            message: "Could not estimate reading rate due to insufficient data.".to_string(),
        }
    }

    pub fn estimated(estimate: ReadingRateEstimate) -> Self {
        ReadingRateReport {
            item_id: estimate.item_id,
            title: Some(estimate.title),
            average_pages_per_day: Some(estimate.average_pages_per_day),
            sample_size: Some(estimate.sample_size),
            message: "Reading rate estimated successfully.".to_string(),
        }
    }

    pub fn has_estimate(&self) -> bool {
        self.average_pages_per_day.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPatronsReport {
    pub message: String,
    pub patrons: Vec<RankedPatron>,
}

impl TopPatronsReport {
    pub fn ranked(patrons: Vec<RankedPatron>) -> Self {
        TopPatronsReport {
            message: "Patrons with most borrows retrieved successfully.".to_string(),
            patrons,
        }
    }

    pub fn no_records_in_range() -> Self {
        TopPatronsReport {
            message: "No borrow records found for the specified date range.".to_string(),
            patrons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatronLoansReport {
    pub message: String,
    pub items: Vec<PatronLoanSummary>,
}

impl PatronLoansReport {
    pub fn retrieved(items: Vec<PatronLoanSummary>) -> Self {
        PatronLoansReport {
            message: "Items retrieved successfully.".to_string(),
            items,
        }
    }

    /// Deliberately a soft response rather than a NotFound error; see
    /// DESIGN.md for the inconsistency with item lookups.
    pub fn patron_missing(patron_id: i64) -> Self {
        PatronLoansReport {
            message: format!("Patron does not exist. Invalid patron id: {}", patron_id),
            items: Vec::new(),
        }
    }

    pub fn no_items_in_range() -> Self {
        PatronLoansReport {
            message: "No items found for the specified patron and date range.".to_string(),
            items: Vec::new(),
        }
    }
}

/// Round to 2 decimal places, the precision every rate in these reports uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
