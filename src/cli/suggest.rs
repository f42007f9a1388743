use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::fmt::eur;
use crate::importer::read_processed;
use crate::settings;
use crate::suggest;

pub fn run(file: Option<&str>, db: Option<&str>, weeks: u32) -> Result<()> {
    let json_path = file
        .map(PathBuf::from)
        .unwrap_or_else(settings::processed_json_path);
    let db_path = db.map(PathBuf::from).unwrap_or_else(settings::db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!("Generating weekly order suggestions...");
    let articles = read_processed(&json_path)?;
    let today = chrono::Local::now().date_naive();
    let suggestions = suggest::generate(&articles, today, weeks);

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    suggest::store(&conn, &suggestions)?;

    for s in &suggestions {
        println!(
            "Week {}/{}: {} items, {} ({}% confidence)",
            s.week_number,
            s.year,
            s.items.len(),
            eur(s.total_amount),
            s.confidence
        );
    }
    println!();
    println!("{} weekly suggestions stored", suggestions.len());

    Ok(())
}
