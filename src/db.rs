use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::importer::read_processed;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS article_history (
    id INTEGER PRIMARY KEY,
    article_id TEXT NOT NULL,
    article_name TEXT NOT NULL,
    supplier TEXT NOT NULL,
    supplier_id TEXT NOT NULL,
    unit TEXT NOT NULL,
    warengruppe TEXT,
    kernsortiment TEXT,
    order_count INTEGER NOT NULL,
    total_quantity REAL NOT NULL,
    first_order_date TEXT,
    last_order_date TEXT,
    avg_price INTEGER NOT NULL,
    last_price INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS weekly_suggestions (
    id INTEGER PRIMARY KEY,
    week_number INTEGER NOT NULL,
    year INTEGER NOT NULL,
    week_start TEXT NOT NULL,
    week_end TEXT NOT NULL,
    items TEXT NOT NULL,
    total_amount INTEGER NOT NULL,
    confidence INTEGER NOT NULL,
    is_approved INTEGER DEFAULT 0,
    approved_at TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    record_count INTEGER,
    checksum TEXT,
    imported_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub struct SeedResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
    pub total_orders: usize,
    pub first_order_date: Option<String>,
    pub last_order_date: Option<String>,
}

/// Load a processed JSON file into `article_history`. A file whose checksum
/// was already recorded is reported as a duplicate and left alone. Articles
/// that fail to insert are logged and skipped, never fatal.
pub fn seed_articles(conn: &Connection, json_path: &Path, keep_existing: bool) -> Result<SeedResult> {
    let checksum = compute_checksum(json_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(SeedResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
                total_orders: 0,
                first_order_date: None,
                last_order_date: None,
            });
        }
    }

    let articles = read_processed(json_path)?;

    if !keep_existing {
        conn.execute("DELETE FROM article_history", [])?;
    }

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for article in &articles {
        let inserted = conn.execute(
            "INSERT INTO article_history (article_id, article_name, supplier, supplier_id, unit, \
             warengruppe, kernsortiment, order_count, total_quantity, first_order_date, \
             last_order_date, avg_price, last_price) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                article.article_id,
                article.article_name,
                article.supplier,
                article.supplier_id,
                article.unit,
                article.warengruppe,
                article.kernsortiment,
                article.order_count as i64,
                article.total_quantity,
                article.first_order_date,
                article.last_order_date,
                article.avg_price,
                article.last_price,
            ],
        );
        match inserted {
            Ok(_) => imported += 1,
            Err(e) => {
                eprintln!("Error seeding article {}: {e}", article.article_id);
                skipped += 1;
            }
        }
    }

    conn.execute(
        "INSERT INTO imports (filename, record_count, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            json_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            articles.len() as i64,
            checksum,
        ],
    )?;

    let total_orders = articles.iter().map(|a| a.order_count).sum();
    let first_order_date = articles
        .iter()
        .map(|a| a.first_order_date.as_str())
        .filter(|d| !d.is_empty())
        .min()
        .map(str::to_string);
    let last_order_date = articles
        .iter()
        .map(|a| a.last_order_date.as_str())
        .filter(|d| !d.is_empty())
        .max()
        .map(str::to_string);

    Ok(SeedResult {
        imported,
        skipped,
        duplicate_file: false,
        total_orders,
        first_order_date,
        last_order_date,
    })
}
