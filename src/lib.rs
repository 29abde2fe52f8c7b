// Circulation Insights - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod ledger;
pub mod error;
pub mod validate;
pub mod report;
pub mod circulation;
pub mod affinity;
pub mod patrons;
pub mod store;
pub mod util;

// Re-export commonly used types
pub use ledger::{Item, LedgerRead, LoanEvent, LoanFilter, MemoryLedger, Patron};
pub use error::{EngineError, EngineResult};
pub use report::{
    AvailabilityReport, AvailabilitySnapshot, PatronLoanSummary, PatronLoansReport, RankedItem,
    RankedPatron, ReadingRateEstimate, ReadingRateReport, RelatedItem, RelatedItemsReport,
    TopBorrowedReport, TopPatronsReport,
};
pub use circulation::CirculationEngine;
pub use affinity::AffinityEngine;
pub use patrons::PatronEngine;
pub use store::{
    insert_items, insert_loans, insert_patrons, load_loans_csv, seed_sample_data, setup_database,
    verify_counts, SqliteLedger,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
