use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::fmt::{eur, qty};
use crate::reports;
use crate::settings;

fn open_db(db: Option<&str>) -> Result<rusqlite::Connection> {
    let db_path = db.map(PathBuf::from).unwrap_or_else(settings::db_path);
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn top(limit: usize, db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let articles = reports::get_top_articles(&conn, limit)?;

    if articles.is_empty() {
        println!("No articles in the database. Run `orderhist seed` first.");
        return Ok(());
    }

    println!("{}", format!("Top {limit} articles by order count").bold());
    let mut table = Table::new();
    table.set_header(vec!["Article", "Supplier", "Orders", "Total Qty", "Last Price"]);
    for article in &articles {
        table.add_row(vec![
            Cell::new(&article.article_name),
            Cell::new(&article.supplier),
            Cell::new(article.order_count),
            Cell::new(format!("{} {}", qty(article.total_quantity), article.unit)),
            Cell::new(eur(article.last_price)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn suppliers(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let suppliers = reports::get_supplier_summary(&conn)?;

    if suppliers.is_empty() {
        println!("No articles in the database. Run `orderhist seed` first.");
        return Ok(());
    }

    println!("{}", "Order volume per supplier".bold());
    let mut table = Table::new();
    table.set_header(vec!["Supplier", "ID", "Articles", "Orders"]);
    for s in &suppliers {
        table.add_row(vec![
            Cell::new(&s.supplier),
            Cell::new(&s.supplier_id),
            Cell::new(s.articles),
            Cell::new(s.orders),
        ]);
    }
    println!("{table}");
    Ok(())
}
