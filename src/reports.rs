use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Top articles
// ---------------------------------------------------------------------------

pub struct TopArticle {
    pub article_name: String,
    pub supplier: String,
    pub order_count: i64,
    pub total_quantity: f64,
    pub unit: String,
    pub last_price: i64,
}

pub fn get_top_articles(conn: &Connection, limit: usize) -> Result<Vec<TopArticle>> {
    let mut stmt = conn.prepare(
        "SELECT article_name, supplier, order_count, total_quantity, unit, last_price \
         FROM article_history ORDER BY order_count DESC, id ASC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], |row| {
        Ok(TopArticle {
            article_name: row.get(0)?,
            supplier: row.get(1)?,
            order_count: row.get(2)?,
            total_quantity: row.get(3)?,
            unit: row.get(4)?,
            last_price: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Supplier summary
// ---------------------------------------------------------------------------

pub struct SupplierSummary {
    pub supplier_id: String,
    pub supplier: String,
    pub articles: i64,
    pub orders: i64,
}

pub fn get_supplier_summary(conn: &Connection) -> Result<Vec<SupplierSummary>> {
    let mut stmt = conn.prepare(
        "SELECT supplier_id, supplier, COUNT(*) as articles, SUM(order_count) as orders \
         FROM article_history GROUP BY supplier_id, supplier ORDER BY orders DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SupplierSummary {
            supplier_id: row.get(0)?,
            supplier: row.get(1)?,
            articles: row.get(2)?,
            orders: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Database statistics
// ---------------------------------------------------------------------------

pub struct DbStats {
    pub articles: i64,
    pub total_orders: i64,
    pub imports: i64,
    pub suggestions: i64,
}

pub fn get_stats(conn: &Connection) -> Result<DbStats> {
    let articles: i64 = conn.query_row("SELECT count(*) FROM article_history", [], |r| r.get(0))?;
    let total_orders: i64 = conn.query_row(
        "SELECT COALESCE(SUM(order_count), 0) FROM article_history",
        [],
        |r| r.get(0),
    )?;
    let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;
    let suggestions: i64 =
        conn.query_row("SELECT count(*) FROM weekly_suggestions", [], |r| r.get(0))?;
    Ok(DbStats {
        articles,
        total_orders,
        imports,
        suggestions,
    })
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write the full article history as CSV. Returns the number of data rows.
pub fn export_csv(conn: &Connection, path: &Path) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "article_id",
        "article_name",
        "supplier",
        "supplier_id",
        "unit",
        "warengruppe",
        "kernsortiment",
        "order_count",
        "total_quantity",
        "first_order_date",
        "last_order_date",
        "avg_price",
        "last_price",
    ])?;

    let mut stmt = conn.prepare(
        "SELECT article_id, article_name, supplier, supplier_id, unit, warengruppe, \
         kernsortiment, order_count, total_quantity, first_order_date, last_order_date, \
         avg_price, last_price FROM article_history ORDER BY order_count DESC, id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, i64>(7)?,
            row.get::<_, f64>(8)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, Option<String>>(10)?,
            row.get::<_, i64>(11)?,
            row.get::<_, i64>(12)?,
        ))
    })?;

    let mut count = 0usize;
    for row in rows {
        let r = row?;
        wtr.write_record([
            r.0,
            r.1,
            r.2,
            r.3,
            r.4,
            r.5.unwrap_or_default(),
            r.6.unwrap_or_default(),
            r.7.to_string(),
            r.8.to_string(),
            r.9.unwrap_or_default(),
            r.10.unwrap_or_default(),
            r.11.to_string(),
            r.12.to_string(),
        ])?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}
