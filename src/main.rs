// Circulation Insights - CLI
// Seeds/imports the ledger database and prints the six reports.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

use circulation_insights::{
    insert_loans, load_loans_csv, seed_sample_data, setup_database, verify_counts, AffinityEngine,
    CirculationEngine, EngineError, PatronEngine, SqliteLedger,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "init" => run_init(),
        "import" => {
            let csv = args.get(2).ok_or_else(|| anyhow!("Usage: import <loans.csv>"))?;
            run_import(Path::new(csv))
        }
        "top-items" => {
            let limit = parse_int(&args, 2, "N")?;
            run_report(|ledger| {
                let report = CirculationEngine::new(ledger).top_borrowed(limit)?;
                println!("{}", report.message);
                for (rank, item) in report.items.iter().enumerate() {
                    println!(
                        "  {}. [{}] {} by {} ({} borrows)",
                        rank + 1,
                        item.id,
                        item.title,
                        item.author,
                        item.borrow_count
                    );
                }
                Ok(())
            })
        }
        "availability" => {
            let id = parse_int(&args, 2, "ITEM_ID")?;
            run_report(|ledger| {
                let report = CirculationEngine::new(ledger).availability(id)?;
                println!("{}", report.message);
                println!(
                    "  item {}: {} borrowed, {} available",
                    report.snapshot.id,
                    report.snapshot.borrowed_count,
                    report.snapshot.available_count
                );
                Ok(())
            })
        }
        "related" => {
            let id = parse_int(&args, 2, "ITEM_ID")?;
            run_report(|ledger| {
                let report = AffinityEngine::new(ledger).related_items(id)?;
                println!("{}", report.message);
                for related in &report.related {
                    println!(
                        "  [{}] {} by {} ({} shared borrowers)",
                        related.id, related.title, related.author, related.common_borrower_count
                    );
                }
                Ok(())
            })
        }
        "rate" => {
            let id = parse_int(&args, 2, "ITEM_ID")?;
            run_report(|ledger| {
                let report = AffinityEngine::new(ledger).reading_rate(id)?;
                println!("{}", report.message);
                if let (Some(rate), Some(samples)) =
                    (report.average_pages_per_day, report.sample_size)
                {
                    println!("  {:.2} pages/day over {} completed loans", rate, samples);
                }
                Ok(())
            })
        }
        "top-patrons" => {
            let limit = parse_int(&args, 2, "N")?;
            let (start, end) = parse_window(&args, 3)?;
            run_report(|ledger| {
                let report = PatronEngine::new(ledger).top_patrons(start, end, limit)?;
                println!("{}", report.message);
                for (rank, patron) in report.patrons.iter().enumerate() {
                    println!(
                        "  {}. [{}] {} ({} borrows)",
                        rank + 1,
                        patron.id,
                        patron.name,
                        patron.borrow_count
                    );
                }
                Ok(())
            })
        }
        "patron-items" => {
            let id = parse_int(&args, 2, "PATRON_ID")?;
            let (start, end) = parse_window(&args, 3)?;
            run_report(|ledger| {
                let report = PatronEngine::new(ledger).patron_items(id, start, end)?;
                println!("{}", report.message);
                for row in &report.items {
                    println!(
                        "  [{}] {} by {} (borrowed by {})",
                        row.item_id, row.title, row.author, row.patron_name
                    );
                }
                Ok(())
            })
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Circulation Insights v{}", circulation_insights::VERSION);
    println!();
    println!("Usage:");
    println!("  circulation-insights init");
    println!("  circulation-insights import <loans.csv>");
    println!("  circulation-insights top-items <N>");
    println!("  circulation-insights availability <ITEM_ID>");
    println!("  circulation-insights related <ITEM_ID>");
    println!("  circulation-insights rate <ITEM_ID>");
    println!("  circulation-insights top-patrons <N> <START> <END>");
    println!("  circulation-insights patron-items <PATRON_ID> <START> <END>");
    println!();
    println!("Dates are YYYY-MM-DD. Database path comes from CIRCULATION_DB");
    println!("(default: ./circulation.db).");
}

fn db_path() -> PathBuf {
    env::var("CIRCULATION_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("circulation.db"))
}

fn run_init() -> Result<()> {
    println!("🗄️  Initializing ledger database...");

    let conn = Connection::open(db_path())?;
    setup_database(&conn)?;
    seed_sample_data(&conn)?;

    let (items, patrons, loans) = verify_counts(&conn)?;
    println!(
        "✓ Database ready: {} items, {} patrons, {} loan events",
        items, patrons, loans
    );

    Ok(())
}

fn run_import(csv_path: &Path) -> Result<()> {
    println!("📂 Importing loan events from {:?}...", csv_path);

    let loans = load_loans_csv(csv_path)?;
    println!("✓ Loaded {} loan events from CSV", loans.len());

    let conn = Connection::open(db_path())?;
    setup_database(&conn)?;
    let inserted = insert_loans(&conn, &loans)?;
    println!("✓ Inserted: {} loan events", inserted);

    let (_, _, total) = verify_counts(&conn)?;
    println!("✓ Ledger now contains {} loan events", total);

    Ok(())
}

fn run_report(report: impl FnOnce(&SqliteLedger) -> Result<(), EngineError>) -> Result<()> {
    let path = db_path();
    if !path.exists() {
        eprintln!("❌ Database not found at {:?}", path);
        eprintln!("   Run: circulation-insights init");
        std::process::exit(1);
    }

    let ledger = SqliteLedger::open(&path)?;

    if let Err(err) = report(&ledger) {
        eprintln!("❌ {}: {}", err.kind(), err);
        std::process::exit(1);
    }

    Ok(())
}

fn parse_int(args: &[String], index: usize, label: &str) -> Result<i64> {
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("Missing argument: {}", label))?;
    raw.parse()
        .with_context(|| format!("{} must be an integer, got {:?}", label, raw))
}

/// Parse an inclusive [START, END] date window: start-of-day to end-of-day UTC.
fn parse_window(args: &[String], index: usize) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_date(args, index, "START")?;
    let end = parse_date(args, index + 1, "END")?;

    Ok((
        start.and_hms_opt(0, 0, 0).unwrap().and_utc(),
        end.and_hms_opt(23, 59, 59).unwrap().and_utc(),
    ))
}

fn parse_date(args: &[String], index: usize, label: &str) -> Result<NaiveDate> {
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("Missing argument: {}", label))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("{} must be YYYY-MM-DD, got {:?}", label, raw))
}
