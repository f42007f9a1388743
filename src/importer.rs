use std::path::Path;

use calamine::{Data, Reader};
use indexmap::IndexMap;

use crate::error::{OrderhistError, Result};
use crate::models::{ArticleSummary, OrderEntry, OrderRow};

// Column layout of the jb-x order export:
// 0: Lieferant ("id name"), 1: Artikelnr, 2: Artikelbezeichnung,
// 3: Kernsortiment, 4: Warengruppe, 5: Bestellnummer, 6: Bestelldatum,
// 7: Währung, 8: Menge, 9: Einheit, 10: Einzelpreis, 11: Bestellvolumen
const COLUMNS: usize = 12;

// ---------------------------------------------------------------------------
// Cell coercion helpers
// ---------------------------------------------------------------------------

pub fn excel_serial_to_datetime(serial: f64) -> chrono::NaiveDateTime {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let days = serial.trunc() as i64;
    let secs = (serial.fract() * 86_400.0).round() as i64;
    base + chrono::Duration::days(days) + chrono::Duration::seconds(secs)
}

/// A cell that coerces to "no value": empty, blank string, zero, or false.
fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        Data::Int(i) => *i == 0,
        Data::Float(f) => *f == 0.0,
        Data::Bool(b) => !b,
        _ => false,
    }
}

/// Coerce a cell to text, falling back to `default` when blank. Whole floats
/// render without the decimal point, like numeric article ids in the export.
fn cell_text(cell: &Data, default: &str) -> String {
    if is_blank(cell) {
        return default.to_string();
    }
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Coerce a cell to a number, defaulting blanks to 0. A non-numeric string is
/// a row error, not a default.
fn cell_number(cell: &Data) -> Result<f64> {
    if is_blank(cell) {
        return Ok(0.0);
    }
    match cell {
        Data::Float(f) => Ok(*f),
        Data::Int(i) => Ok(*i as f64),
        Data::Bool(_) => Ok(1.0),
        Data::String(s) => s
            .trim()
            .parse()
            .map_err(|_| OrderhistError::Other(format!("could not convert '{s}' to number"))),
        other => Err(OrderhistError::Other(format!(
            "could not convert cell {other:?} to number"
        ))),
    }
}

/// An order date is only valid when the cell is date-typed; numeric or string
/// cells that merely look like dates do not count.
fn cell_date(cell: &Data) -> Option<String> {
    match cell {
        Data::DateTime(dt) if dt.is_datetime() => Some(
            excel_serial_to_datetime(dt.as_f64())
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        ),
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
            }
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| format!("{}T00:00:00", d.format("%Y-%m-%d")))
        }
        _ => None,
    }
}

/// Split a packed "id name" supplier label. No space means id and name are
/// both the whole label.
fn split_supplier(label: &str) -> (String, String) {
    match label.split_once(' ') {
        Some((id, name)) => (id.to_string(), name.to_string()),
        None => (label.to_string(), label.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Parse one data row. `Ok(None)` rows are silently excluded (empty supplier
/// cell, missing/non-date order date); `Err` rows are logged by the caller.
fn parse_row(row: &[Data]) -> Result<Option<OrderRow>> {
    if row.is_empty() || is_blank(&row[0]) {
        return Ok(None);
    }
    if row.len() < COLUMNS {
        return Err(OrderhistError::Other(format!(
            "row has {} columns, expected {COLUMNS}",
            row.len()
        )));
    }

    let supplier_full = cell_text(&row[0], "Unbekannt");
    let (supplier_id, supplier_name) = split_supplier(&supplier_full);

    let article_id = cell_text(&row[1], "");
    let article_name = cell_text(&row[2], "");
    let kernsortiment = cell_text(&row[3], "");
    let warengruppe = cell_text(&row[4], "");
    let order_number = cell_text(&row[5], "");
    let currency = cell_text(&row[7], "EUR");
    let quantity = cell_number(&row[8])?;
    let unit = cell_text(&row[9], "STK");
    let unit_price = cell_number(&row[10])?;
    // Column 11 must still coerce; a malformed order volume skips the row.
    cell_number(&row[11])?;

    let Some(date) = cell_date(&row[6]) else {
        return Ok(None);
    };

    // Truncate toward zero, matching the observed cent conversion.
    let unit_price_cents = (unit_price * 100.0) as i64;

    Ok(Some(OrderRow {
        supplier_id,
        supplier_name,
        article_id,
        article_name,
        kernsortiment,
        warengruppe,
        order_number,
        date,
        currency,
        quantity,
        unit,
        unit_price_cents,
    }))
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

struct Aggregate {
    article_id: String,
    article_name: String,
    supplier: String,
    supplier_id: String,
    unit: String,
    warengruppe: String,
    kernsortiment: String,
    orders: Vec<OrderEntry>,
    total_quantity: f64,
    prices: Vec<i64>,
}

/// Fold data rows (header already skipped) into one summary per
/// (supplier, article) pair. Row errors go to stderr and the row is dropped;
/// they never abort the run.
pub fn aggregate_rows<'a>(rows: impl Iterator<Item = &'a [Data]>) -> Vec<ArticleSummary> {
    // Insertion order decides ties in the final sort, so the map must keep it.
    let mut articles: IndexMap<String, Aggregate> = IndexMap::new();

    for row in rows {
        let parsed = match parse_row(row) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("Error processing row: {e}");
                continue;
            }
        };

        let key = format!("{}_{}", parsed.supplier_id, parsed.article_id);
        let entry = articles.entry(key).or_insert_with(|| Aggregate {
            article_id: parsed.article_id.clone(),
            article_name: parsed.article_name.clone(),
            supplier: parsed.supplier_name.clone(),
            supplier_id: parsed.supplier_id.clone(),
            unit: parsed.unit.clone(),
            warengruppe: parsed.warengruppe.clone(),
            kernsortiment: parsed.kernsortiment.clone(),
            orders: Vec::new(),
            total_quantity: 0.0,
            prices: Vec::new(),
        });

        entry.orders.push(OrderEntry {
            date: parsed.date,
            quantity: parsed.quantity,
            price: parsed.unit_price_cents,
            order_number: parsed.order_number,
        });
        entry.total_quantity += parsed.quantity;
        if parsed.unit_price_cents > 0 {
            entry.prices.push(parsed.unit_price_cents);
        }
    }

    let mut result: Vec<ArticleSummary> = articles
        .into_values()
        .map(|mut agg| {
            agg.orders.sort_by(|a, b| a.date.cmp(&b.date));

            let avg_price = if agg.prices.is_empty() {
                0
            } else {
                agg.prices.iter().sum::<i64>() / agg.prices.len() as i64
            };

            ArticleSummary {
                article_id: agg.article_id,
                article_name: agg.article_name,
                supplier: agg.supplier,
                supplier_id: agg.supplier_id,
                unit: agg.unit,
                warengruppe: agg.warengruppe,
                kernsortiment: agg.kernsortiment,
                order_count: agg.orders.len(),
                total_quantity: agg.total_quantity,
                last_order_date: agg.orders.last().map(|o| o.date.clone()).unwrap_or_default(),
                first_order_date: agg.orders.first().map(|o| o.date.clone()).unwrap_or_default(),
                avg_price,
                last_price: agg.orders.last().map(|o| o.price).unwrap_or(0),
                orders: agg.orders,
            }
        })
        .collect();

    // Most ordered first; sort_by is stable so ties keep encounter order.
    result.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    result
}

// ---------------------------------------------------------------------------
// Workbook and JSON I/O
// ---------------------------------------------------------------------------

pub fn parse_workbook(path: &Path) -> Result<Vec<ArticleSummary>> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| OrderhistError::Workbook(format!("failed to open {}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| OrderhistError::Workbook("workbook has no worksheets".to_string()))?
        .map_err(|e| OrderhistError::Workbook(e.to_string()))?;

    // First row is the header.
    Ok(aggregate_rows(range.rows().skip(1)))
}

pub fn write_json(path: &Path, articles: &[ArticleSummary]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(articles)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn read_processed(path: &Path) -> Result<Vec<ArticleSummary>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_row(
        supplier: &str,
        article: &str,
        name: &str,
        order_no: &str,
        date: &str,
        quantity: f64,
        price: f64,
    ) -> Vec<Data> {
        vec![
            Data::String(supplier.to_string()),
            Data::String(article.to_string()),
            Data::String(name.to_string()),
            Data::Empty,
            Data::Empty,
            Data::String(order_no.to_string()),
            Data::DateTimeIso(date.to_string()),
            Data::String("EUR".to_string()),
            Data::Float(quantity),
            Data::String("STK".to_string()),
            Data::Float(price),
            Data::Float(quantity * price),
        ]
    }

    fn aggregate(rows: &[Vec<Data>]) -> Vec<ArticleSummary> {
        aggregate_rows(rows.iter().map(|r| r.as_slice()))
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        assert_eq!(
            excel_serial_to_datetime(45667.0).format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2025-01-10T00:00:00"
        );
        assert_eq!(
            excel_serial_to_datetime(44931.5).format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2023-01-05T12:00:00"
        );
    }

    #[test]
    fn test_cell_text_defaults_and_whole_floats() {
        assert_eq!(cell_text(&Data::Empty, "STK"), "STK");
        assert_eq!(cell_text(&Data::String(String::new()), "EUR"), "EUR");
        assert_eq!(cell_text(&Data::Float(801798.0), ""), "801798");
        assert_eq!(cell_text(&Data::Float(1.5), ""), "1.5");
        assert_eq!(cell_text(&Data::String("KI123".to_string()), ""), "KI123");
    }

    #[test]
    fn test_cell_number() {
        assert_eq!(cell_number(&Data::Empty).unwrap(), 0.0);
        assert_eq!(cell_number(&Data::Float(2.5)).unwrap(), 2.5);
        assert_eq!(cell_number(&Data::Int(3)).unwrap(), 3.0);
        assert_eq!(cell_number(&Data::String(" 4.25 ".to_string())).unwrap(), 4.25);
        assert!(cell_number(&Data::String("n/a".to_string())).is_err());
    }

    #[test]
    fn test_split_supplier() {
        assert_eq!(
            split_supplier("801798 PURO Hotelkosmetik GmbH"),
            ("801798".to_string(), "PURO Hotelkosmetik GmbH".to_string())
        );
        assert_eq!(
            split_supplier("801798"),
            ("801798".to_string(), "801798".to_string())
        );
    }

    #[test]
    fn test_aggregates_two_orders_for_same_article() {
        let rows = vec![
            order_row("801798 PURO Hotelkosmetik GmbH", "A1", "Soap", "O1", "2023-01-05T00:00:00", 10.0, 2.50),
            order_row("801798 PURO Hotelkosmetik GmbH", "A1", "Soap", "O2", "2023-02-01T00:00:00", 5.0, 3.00),
        ];
        let result = aggregate(&rows);
        assert_eq!(result.len(), 1);
        let a = &result[0];
        assert_eq!(a.supplier_id, "801798");
        assert_eq!(a.supplier, "PURO Hotelkosmetik GmbH");
        assert_eq!(a.article_id, "A1");
        assert_eq!(a.order_count, 2);
        assert_eq!(a.total_quantity, 15.0);
        assert_eq!(a.avg_price, 275);
        assert_eq!(a.last_price, 300);
        assert_eq!(a.first_order_date, "2023-01-05T00:00:00");
        assert_eq!(a.last_order_date, "2023-02-01T00:00:00");
        assert_eq!(a.orders[0].order_number, "O1");
    }

    #[test]
    fn test_orders_sorted_by_date_within_aggregate() {
        let rows = vec![
            order_row("100 Metzgerei Huber", "W1", "Wurst", "O2", "2023-03-01T00:00:00", 1.0, 5.0),
            order_row("100 Metzgerei Huber", "W1", "Wurst", "O1", "2023-01-01T00:00:00", 1.0, 5.0),
            order_row("100 Metzgerei Huber", "W1", "Wurst", "O3", "2023-02-01T00:00:00", 1.0, 5.0),
        ];
        let result = aggregate(&rows);
        let dates: Vec<&str> = result[0].orders.iter().map(|o| o.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["2023-01-01T00:00:00", "2023-02-01T00:00:00", "2023-03-01T00:00:00"]
        );
    }

    #[test]
    fn test_result_sorted_by_order_count_stable() {
        let rows = vec![
            order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 1.0),
            order_row("2 Beta", "B", "Second", "O2", "2023-01-02T00:00:00", 1.0, 1.0),
            order_row("2 Beta", "B", "Second", "O3", "2023-01-03T00:00:00", 1.0, 1.0),
            order_row("3 Gamma", "C", "Third", "O4", "2023-01-04T00:00:00", 1.0, 1.0),
        ];
        let result = aggregate(&rows);
        let names: Vec<&str> = result.iter().map(|a| a.article_name.as_str()).collect();
        // Beta leads on count; Alpha and Gamma tie and keep encounter order.
        assert_eq!(names, vec!["Second", "First", "Third"]);
    }

    #[test]
    fn test_rows_without_date_are_excluded() {
        let mut no_date = order_row("1 Alpha", "A", "First", "O1", "", 1.0, 1.0);
        no_date[6] = Data::Empty;
        let mut string_date = order_row("1 Alpha", "A", "First", "O2", "", 1.0, 1.0);
        string_date[6] = Data::String("2023-01-01".to_string());
        let mut float_date = order_row("1 Alpha", "A", "First", "O3", "", 1.0, 1.0);
        float_date[6] = Data::Float(44931.0);
        let result = aggregate(&[no_date, string_date, float_date]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_rows_with_empty_first_cell_are_skipped() {
        let mut blank = order_row("", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 1.0);
        blank[0] = Data::Empty;
        let kept = order_row("1 Alpha", "A", "First", "O2", "2023-01-02T00:00:00", 1.0, 1.0);
        let result = aggregate(&[blank, kept]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_count, 1);
    }

    #[test]
    fn test_malformed_quantity_skips_row_only() {
        let mut bad = order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 1.0);
        bad[8] = Data::String("viele".to_string());
        let good = order_row("1 Alpha", "A", "First", "O2", "2023-01-02T00:00:00", 2.0, 1.0);
        let result = aggregate(&[bad, good]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_count, 1);
        assert_eq!(result[0].total_quantity, 2.0);
    }

    #[test]
    fn test_short_row_is_an_error_not_a_panic() {
        let short = vec![Data::String("1 Alpha".to_string()), Data::String("A".to_string())];
        let good = order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 1.0);
        let result = aggregate(&[short, good]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_count, 1);
    }

    #[test]
    fn test_price_conversion_truncates_toward_zero() {
        let rows = vec![order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 2.509)];
        let result = aggregate(&rows);
        assert_eq!(result[0].orders[0].price, 250);
    }

    #[test]
    fn test_zero_prices_do_not_enter_average() {
        let rows = vec![
            order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 0.0),
            order_row("1 Alpha", "A", "First", "O2", "2023-01-02T00:00:00", 1.0, 3.0),
        ];
        let result = aggregate(&rows);
        assert_eq!(result[0].avg_price, 300);
        assert_eq!(result[0].order_count, 2);
    }

    #[test]
    fn test_avg_price_zero_without_positive_prices() {
        let rows = vec![order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 0.0)];
        let result = aggregate(&rows);
        assert_eq!(result[0].avg_price, 0);
        assert_eq!(result[0].last_price, 0);
    }

    #[test]
    fn test_avg_price_floors_the_mean() {
        let rows = vec![
            order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 1.0),
            order_row("1 Alpha", "A", "First", "O2", "2023-01-02T00:00:00", 1.0, 1.0),
            order_row("1 Alpha", "A", "First", "O3", "2023-01-03T00:00:00", 1.0, 2.0),
        ];
        // mean of [100, 100, 200] = 133.33 -> 133
        let result = aggregate(&rows);
        assert_eq!(result[0].avg_price, 133);
    }

    #[test]
    fn test_unit_and_currency_defaults() {
        let mut row = order_row("1 Alpha", "A", "First", "O1", "2023-01-01T00:00:00", 1.0, 1.0);
        row[7] = Data::Empty;
        row[9] = Data::Empty;
        let result = aggregate(&[row]);
        assert_eq!(result[0].unit, "STK");
    }

    #[test]
    fn test_identity_fields_come_from_first_row() {
        let rows = vec![
            order_row("1 Alpha", "A", "First name", "O1", "2023-01-01T00:00:00", 1.0, 1.0),
            order_row("1 Alpha", "A", "Renamed", "O2", "2023-01-02T00:00:00", 1.0, 1.0),
        ];
        let result = aggregate(&rows);
        assert_eq!(result[0].article_name, "First name");
    }

    #[test]
    fn test_excel_datetime_cells_are_accepted() {
        let mut row = order_row("1 Alpha", "A", "First", "O1", "", 1.0, 1.0);
        row[6] = Data::DateTime(calamine::ExcelDateTime::new(
            44931.0,
            calamine::ExcelDateTimeType::DateTime,
            false,
        ));
        let result = aggregate(&[row]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].first_order_date, "2023-01-05T00:00:00");
    }

    #[test]
    fn test_write_json_pretty_preserves_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("processed.json");
        let rows = vec![order_row("1 Käserei Süd", "A", "Bergkäse", "O1", "2023-01-01T00:00:00", 1.0, 1.0)];
        let articles = aggregate(&rows);
        write_json(&path, &articles).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("  \"articleId\""));
        assert!(content.contains("Bergkäse"));
        assert!(content.contains("Käserei Süd"));
        assert!(!content.contains("\\u"));
        let back = read_processed(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].article_name, "Bergkäse");
    }
}
