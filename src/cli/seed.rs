use std::path::PathBuf;

use crate::db::{get_connection, init_db, seed_articles};
use crate::error::Result;
use crate::settings;

pub fn run(file: Option<&str>, db: Option<&str>, keep_existing: bool) -> Result<()> {
    let json_path = file
        .map(PathBuf::from)
        .unwrap_or_else(settings::processed_json_path);
    let db_path = db.map(PathBuf::from).unwrap_or_else(settings::db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    println!("Seeding article history from: {}", json_path.display());
    let result = seed_articles(&conn, &json_path, keep_existing)?;

    if result.duplicate_file {
        println!("This file has already been seeded (duplicate checksum).");
        return Ok(());
    }

    println!("{} articles imported, {} skipped", result.imported, result.skipped);

    println!();
    println!("Statistics:");
    println!("- Total articles: {}", result.imported);
    println!("- Total orders: {}", result.total_orders);
    if result.imported > 0 {
        println!(
            "- Avg orders per article: {:.1}",
            result.total_orders as f64 / result.imported as f64
        );
    }
    if let (Some(first), Some(last)) = (&result.first_order_date, &result.last_order_date) {
        println!("- Date range: {first} to {last}");
    }

    Ok(())
}
