use std::path::PathBuf;

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::reports::get_stats;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("orderhist.db");
    let json_path = data_dir.join("orders_processed.json");

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!(
        "Processed:  {}{}",
        json_path.display(),
        if json_path.exists() { "" } else { " (not found)" }
    );

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let stats = get_stats(&conn)?;

        println!();
        println!("Articles:      {}", stats.articles);
        println!("Orders:        {}", stats.total_orders);
        println!("Imports:       {}", stats.imports);
        println!("Suggestions:   {}", stats.suggestions);
    } else {
        println!();
        println!("Database not found. Run `orderhist init` to set up.");
    }

    Ok(())
}
