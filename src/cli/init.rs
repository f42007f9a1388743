use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{default_data_dir, save_settings, shellexpand_path, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let dir = data_dir
        .map(|d| PathBuf::from(shellexpand_path(&d)))
        .unwrap_or_else(default_data_dir);
    std::fs::create_dir_all(&dir)?;

    let settings = Settings {
        data_dir: dir.to_string_lossy().to_string(),
    };
    save_settings(&settings)?;

    let conn = get_connection(&dir.join("orderhist.db"))?;
    init_db(&conn)?;

    println!("Initialized orderhist data directory at {}", dir.display());
    Ok(())
}
