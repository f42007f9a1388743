use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use indexmap::IndexMap;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ArticleSummary;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionItem {
    pub article_id: String,
    pub article_name: String,
    pub supplier: String,
    pub unit: String,
    pub quantity: i64,
    pub price: i64,
    pub confidence: u32,
}

#[derive(Debug, Clone)]
pub struct WeeklySuggestion {
    pub week_number: u32,
    pub year: i32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub items: Vec<SuggestionItem>,
    pub total_amount: i64,
    pub confidence: u32,
}

/// One historical order line, carried with its article identity.
#[derive(Debug, Clone)]
struct Occurrence {
    article_id: String,
    article_name: String,
    supplier: String,
    unit: String,
    quantity: f64,
    price: i64,
}

struct Tally {
    total: f64,
    count: u32,
    sample: Occurrence,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn parse_order_date(date: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn tally<'a>(orders: impl Iterator<Item = &'a Occurrence>) -> IndexMap<String, Tally> {
    let mut tallies: IndexMap<String, Tally> = IndexMap::new();
    for order in orders {
        let entry = tallies.entry(order.article_id.clone()).or_insert_with(|| Tally {
            total: 0.0,
            count: 0,
            sample: order.clone(),
        });
        entry.total += order.quantity;
        entry.count += 1;
    }
    tallies
}

/// Rank tallied articles by how often they were ordered, keep the `limit`
/// busiest, and turn them into suggestion items. The divisor decides what the
/// suggested quantity is averaged over (matching weeks, or raw occurrences).
fn build_items(
    tallies: IndexMap<String, Tally>,
    limit: usize,
    divisor_for: impl Fn(&Tally) -> f64,
    base_confidence: u32,
) -> Vec<SuggestionItem> {
    let mut ranked: Vec<Tally> = tallies.into_values().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|t| {
            let quantity = (t.total / divisor_for(&t)).round() as i64;
            let confidence = (base_confidence + t.count * 5).min(95);
            SuggestionItem {
                article_id: t.sample.article_id,
                article_name: t.sample.article_name,
                supplier: t.sample.supplier,
                unit: t.sample.unit,
                quantity,
                price: t.sample.price,
                confidence,
            }
        })
        .collect()
}

/// Project order suggestions for the next `weeks` ISO weeks starting at
/// `today`, based on what was historically ordered in the same week of the
/// year. Weeks with no history fall back to the all-time average.
pub fn generate(articles: &[ArticleSummary], today: NaiveDate, weeks: u32) -> Vec<WeeklySuggestion> {
    // Bucket every historical order line by ISO week.
    let mut weekly_orders: IndexMap<String, Vec<Occurrence>> = IndexMap::new();
    for article in articles {
        for order in &article.orders {
            let Some(date) = parse_order_date(&order.date) else {
                continue;
            };
            let iso = date.iso_week();
            let key = format!("{}-W{:02}", iso.year(), iso.week());
            weekly_orders.entry(key).or_default().push(Occurrence {
                article_id: article.article_id.clone(),
                article_name: article.article_name.clone(),
                supplier: article.supplier.clone(),
                unit: article.unit.clone(),
                quantity: order.quantity,
                price: order.price,
            });
        }
    }

    let mut suggestions = Vec::new();
    for i in 0..weeks {
        let target = today + Duration::weeks(i as i64);
        let iso = target.iso_week();
        let (week, year) = (iso.week(), iso.year());
        let week_start =
            NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).unwrap_or(target);
        let week_end = week_start + Duration::days(6);

        let suffix = format!("-W{week:02}");
        let matching: Vec<&Vec<Occurrence>> = weekly_orders
            .iter()
            .filter(|(key, _)| key.ends_with(&suffix))
            .map(|(_, orders)| orders)
            .collect();

        let (items, confidence) = if matching.is_empty() {
            let tallies = tally(weekly_orders.values().flatten());
            let items = build_items(tallies, 20, |t| t.count as f64, 50);
            (items, 60)
        } else {
            let matched_weeks = matching.len();
            let tallies = tally(matching.into_iter().flatten());
            let items = build_items(tallies, 30, |_| matched_weeks as f64, 60);
            (items, (70 + matched_weeks as u32 * 5).min(90))
        };

        let total_amount = items.iter().map(|it| it.quantity * it.price).sum();
        suggestions.push(WeeklySuggestion {
            week_number: week,
            year,
            week_start,
            week_end,
            items,
            total_amount,
            confidence,
        });
    }
    suggestions
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Replace all stored suggestions with a fresh batch.
pub fn store(conn: &Connection, suggestions: &[WeeklySuggestion]) -> Result<()> {
    conn.execute("DELETE FROM weekly_suggestions", [])?;
    for s in suggestions {
        conn.execute(
            "INSERT INTO weekly_suggestions (week_number, year, week_start, week_end, items, \
             total_amount, confidence) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                s.week_number,
                s.year,
                s.week_start.format("%Y-%m-%d").to_string(),
                s.week_end.format("%Y-%m-%d").to_string(),
                serde_json::to_string(&s.items)?,
                s.total_amount,
                s.confidence,
            ],
        )?;
    }
    Ok(())
}
