mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod reports;
mod settings;
mod suggest;

use clap::Parser;

use cli::{Cli, Commands, ReportCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file, output } => cli::import::run(&file, output.as_deref()),
        Commands::Seed {
            file,
            db,
            keep_existing,
        } => cli::seed::run(file.as_deref(), db.as_deref(), keep_existing),
        Commands::Suggest { file, db, weeks } => {
            cli::suggest::run(file.as_deref(), db.as_deref(), weeks)
        }
        Commands::Report { command } => match command {
            ReportCommands::Top { limit, db } => cli::report::top(limit, db.as_deref()),
            ReportCommands::Suppliers { db } => cli::report::suppliers(db.as_deref()),
        },
        Commands::Export { db, output } => cli::export::run(db.as_deref(), output.as_deref()),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
