use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::{eur, qty};
use crate::importer;
use crate::settings;

pub fn run(file: &str, output: Option<&str>) -> Result<()> {
    let input = PathBuf::from(file);
    let output = output
        .map(PathBuf::from)
        .unwrap_or_else(settings::processed_json_path);

    println!("Parsing order export: {}", input.display());
    let articles = importer::parse_workbook(&input)?;

    let total_orders: usize = articles.iter().map(|a| a.order_count).sum();
    println!("Found {} unique articles", articles.len());
    println!("Total orders: {total_orders}");

    importer::write_json(&output, &articles)?;
    println!("Saved processed data to: {}", output.display());

    if articles.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "Top 10 most ordered articles".bold());
    let mut table = Table::new();
    table.set_header(vec!["#", "Article", "Supplier", "Orders", "Total Qty", "Last Price"]);
    for (i, article) in articles.iter().take(10).enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
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
