use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::reports::export_csv;
use crate::settings;

pub fn run(db: Option<&str>, output: Option<&str>) -> Result<()> {
    let db_path = db.map(PathBuf::from).unwrap_or_else(settings::db_path);
    let output = output
        .map(PathBuf::from)
        .unwrap_or_else(|| settings::get_data_dir().join("article_history.csv"));
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    let rows = export_csv(&conn, &output)?;
    println!("Wrote {} ({rows} rows)", output.display());
    Ok(())
}
