pub mod export;
pub mod import;
pub mod init;
pub mod report;
pub mod seed;
pub mod status;
pub mod suggest;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "orderhist", about = "Order-history import CLI for hotel procurement.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up orderhist: choose a data directory and initialize the database.
    Init {
        /// Path for orderhist data (default: ~/Documents/orderhist)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a jb-x XLSX order export and write the aggregated JSON.
    Import {
        /// Path to the XLSX order export
        file: String,
        /// Output path for the processed JSON (default: <data_dir>/orders_processed.json)
        #[arg(long)]
        output: Option<String>,
    },
    /// Seed the article-history database from a processed JSON file.
    Seed {
        /// Processed JSON file (default: <data_dir>/orders_processed.json)
        file: Option<String>,
        /// Database path (default: <data_dir>/orderhist.db)
        #[arg(long)]
        db: Option<String>,
        /// Append instead of replacing the existing article history
        #[arg(long)]
        keep_existing: bool,
    },
    /// Generate weekly order suggestions from the processed order history.
    Suggest {
        /// Processed JSON file (default: <data_dir>/orders_processed.json)
        file: Option<String>,
        /// Database path (default: <data_dir>/orderhist.db)
        #[arg(long)]
        db: Option<String>,
        /// Number of upcoming weeks to project
        #[arg(long, default_value = "4")]
        weeks: u32,
    },
    /// Generate reports from the seeded database.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export the article history as CSV.
    Export {
        /// Database path (default: <data_dir>/orderhist.db)
        #[arg(long)]
        db: Option<String>,
        /// Output path (default: <data_dir>/article_history.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Most-ordered articles.
    Top {
        /// Number of articles to show
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Database path (default: <data_dir>/orderhist.db)
        #[arg(long)]
        db: Option<String>,
    },
    /// Order volume per supplier.
    Suppliers {
        /// Database path (default: <data_dir>/orderhist.db)
        #[arg(long)]
        db: Option<String>,
    },
}
