// 🗄️ SQLite Ledger Store - Durable backing for the read port
//
// One concrete LedgerRead implementation. The engines never see this module
// directly; swapping it for another store is a one-trait change.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Deserialize;
use std::path::Path;

use crate::ledger::{Item, LedgerRead, LoanEvent, LoanFilter, Patron};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            pages INTEGER NOT NULL DEFAULT 0,
            total_copies INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS patrons (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS loan_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL,
            patron_id INTEGER NOT NULL,
            borrowed_at TEXT NOT NULL,
            returned_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loans_item ON loan_events(item_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loans_patron ON loan_events(patron_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loans_borrowed_at ON loan_events(borrowed_at)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// WRITES (seeding/import only - the engines never write)
// ============================================================================

pub fn insert_items(conn: &Connection, items: &[Item]) -> Result<usize> {
    for item in items {
        conn.execute(
            "INSERT OR REPLACE INTO items (id, title, author, pages, total_copies)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![item.id, item.title, item.author, item.pages, item.total_copies],
        )?;
    }
    Ok(items.len())
}

pub fn insert_patrons(conn: &Connection, patrons: &[Patron]) -> Result<usize> {
    for patron in patrons {
        conn.execute(
            "INSERT OR REPLACE INTO patrons (id, name, email) VALUES (?1, ?2, ?3)",
            params![patron.id, patron.name, patron.email],
        )?;
    }
    Ok(patrons.len())
}

/// Insert loan events; ids are assigned by the store.
pub fn insert_loans(conn: &Connection, loans: &[LoanEvent]) -> Result<usize> {
    for loan in loans {
        conn.execute(
            "INSERT INTO loan_events (item_id, patron_id, borrowed_at, returned_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                loan.item_id,
                loan.patron_id,
                loan.borrowed_at.to_rfc3339(),
                loan.returned_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
    }
    Ok(loans.len())
}

/// Row counts: (items, patrons, loan events).
pub fn verify_counts(conn: &Connection) -> Result<(i64, i64, i64)> {
    let items: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
    let patrons: i64 = conn.query_row("SELECT COUNT(*) FROM patrons", [], |row| row.get(0))?;
    let loans: i64 = conn.query_row("SELECT COUNT(*) FROM loan_events", [], |row| row.get(0))?;
    Ok((items, patrons, loans))
}

// ============================================================================
// CSV IMPORT
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoanCsvRow {
    #[serde(rename = "Item_Id")]
    item_id: i64,

    #[serde(rename = "Patron_Id")]
    patron_id: i64,

    #[serde(rename = "Borrowed_At")]
    borrowed_at: String,

    /// Empty = still outstanding.
    #[serde(rename = "Returned_At", default)]
    returned_at: Option<String>,
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", value))?
        .with_timezone(&Utc))
}

/// Load loan events from a CSV export. Expected header:
/// `Item_Id,Patron_Id,Borrowed_At,Returned_At` with RFC 3339 timestamps.
pub fn load_loans_csv(csv_path: &Path) -> Result<Vec<LoanEvent>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut loans = Vec::new();

    for result in rdr.deserialize() {
        let row: LoanCsvRow = result.context("Failed to deserialize loan row")?;

        let returned_at = match row.returned_at.as_deref() {
            Some("") | None => None,
            Some(value) => Some(parse_rfc3339(value)?),
        };

        loans.push(LoanEvent {
            id: 0, // assigned on insert
            item_id: row.item_id,
            patron_id: row.patron_id,
            borrowed_at: parse_rfc3339(&row.borrowed_at)?,
            returned_at,
        });
    }

    Ok(loans)
}

// ============================================================================
// SAMPLE DATA
// ============================================================================

/// Seed a small, deterministic catalog and ledger for demos.
pub fn seed_sample_data(conn: &Connection) -> Result<()> {
    use chrono::TimeZone;

    let items = vec![
        Item { id: 1, title: "The Left Hand of Darkness".to_string(), author: "Ursula K. Le Guin".to_string(), pages: 304, total_copies: 4 },
        Item { id: 2, title: "A Wizard of Earthsea".to_string(), author: "Ursula K. Le Guin".to_string(), pages: 183, total_copies: 3 },
        Item { id: 3, title: "Dune".to_string(), author: "Frank Herbert".to_string(), pages: 412, total_copies: 5 },
        Item { id: 4, title: "Hyperion".to_string(), author: "Dan Simmons".to_string(), pages: 482, total_copies: 2 },
        Item { id: 5, title: "Uncatalogued Pamphlet".to_string(), author: "Anonymous".to_string(), pages: 0, total_copies: 1 },
    ];

    let patrons = vec![
        Patron { id: 1, name: "Ada Morales".to_string(), email: "ada@mail.com".to_string() },
        Patron { id: 2, name: "Ben Okafor".to_string(), email: "ben@mail.com".to_string() },
        Patron { id: 3, name: "Chloe Tanaka".to_string(), email: "chloe@mail.com".to_string() },
    ];

    let day = |d: u32| Utc.with_ymd_and_hms(2025, 7, d, 10, 0, 0).unwrap();
    let loan = |item_id: i64, patron_id: i64, borrowed: u32, returned: Option<u32>| LoanEvent {
        id: 0,
        item_id,
        patron_id,
        borrowed_at: day(borrowed),
        returned_at: returned.map(day),
    };

    let loans = vec![
        loan(1, 1, 1, Some(8)),
        loan(1, 2, 2, Some(12)),
        loan(1, 3, 10, None),
        loan(2, 1, 3, Some(5)),
        loan(3, 2, 4, None),
        loan(3, 1, 15, Some(22)),
        loan(4, 3, 6, Some(6)), // same-day return, unusable for rate math
        loan(2, 2, 18, None),
    ];

    insert_items(conn, &items)?;
    insert_patrons(conn, &patrons)?;
    insert_loans(conn, &loans)?;

    Ok(())
}

// ============================================================================
// READ PORT IMPLEMENTATION
// ============================================================================

/// SQLite-backed ledger. Loan filters are applied on the materialized event
/// set so result ordering is always the store's insertion order, independent
/// of any SQL plan.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    pub fn new(conn: Connection) -> Self {
        SqliteLedger { conn }
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;
        Ok(SqliteLedger { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_items(&self, sql: &str, id: Option<i64>) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<Item> {
            Ok(Item {
                id: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                pages: row.get(3)?,
                total_copies: row.get(4)?,
            })
        };

        let items = match id {
            Some(id) => stmt
                .query_map(params![id], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        Ok(items)
    }
}

fn parse_stored_timestamp(value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

impl LedgerRead for SqliteLedger {
    fn list_items(&self) -> Result<Vec<Item>> {
        self.query_items(
            "SELECT id, title, author, pages, total_copies FROM items ORDER BY id",
            None,
        )
    }

    fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let mut items = self.query_items(
            "SELECT id, title, author, pages, total_copies FROM items WHERE id = ?1",
            Some(id),
        )?;
        Ok(items.pop())
    }

    fn list_patrons(&self) -> Result<Vec<Patron>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM patrons ORDER BY id")?;

        let patrons = stmt
            .query_map([], |row| {
                Ok(Patron {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(patrons)
    }

    fn get_patron(&self, id: i64) -> Result<Option<Patron>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM patrons WHERE id = ?1")?;

        let mut patrons = stmt
            .query_map(params![id], |row| {
                Ok(Patron {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(patrons.pop())
    }

    fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<LoanEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_id, patron_id, borrowed_at, returned_at
             FROM loan_events
             ORDER BY id",
        )?;

        let loans = stmt
            .query_map([], |row| {
                let borrowed_at: String = row.get(3)?;
                let returned_at: Option<String> = row.get(4)?;

                Ok(LoanEvent {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    patron_id: row.get(2)?,
                    borrowed_at: parse_stored_timestamp(borrowed_at)?,
                    returned_at: returned_at.map(parse_stored_timestamp).transpose()?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(loans.into_iter().filter(|event| filter.matches(event)).collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
