use arbiwatch_core::Snapshot;
use arbiwatch_core::sources::{SentimentRecord, TrackRecord};

/// Box-drawn table with fixed column widths.
pub struct TableFormatter {
    headers: Vec<&'static str>,
    widths: Vec<usize>,
}

impl TableFormatter {
    /// Size each column to its widest cell, between the header width and `max_width`.
    pub fn new(headers: Vec<&'static str>, rows: &[Vec<String>], max_width: usize) -> Self {
        let widths = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count())
                    .min(max_width)
            })
            .collect();

        Self { headers, widths }
    }

    pub fn print_table(&self, rows: &[Vec<String>]) {
        println!("{}", self.border('┌', '┬', '┐'));
        println!("{}", self.row(self.headers.iter().map(|h| h.to_string())));
        println!("{}", self.border('├', '┼', '┤'));
        for row in rows {
            println!("{}", self.row(row.iter().cloned()));
        }
        println!("{}", self.border('└', '┴', '┘'));
    }

    fn border(&self, left: char, middle: char, right: char) -> String {
        let segments: Vec<String> = self.widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}", left, segments.join(&middle.to_string()), right)
    }

    fn row(&self, cells: impl Iterator<Item = String>) -> String {
        let cells: Vec<String> = cells
            .zip(&self.widths)
            .map(|(cell, width)| format!(" {} ", truncate(&cell, *width)))
            .collect();
        format!("│{}│", cells.join("│"))
    }
}

pub fn track_rows(records: &[TrackRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            vec![
                record.coin1.clone(),
                record.min_exchange.clone(),
                record.min_price1.to_string(),
                record.max_exchange.clone(),
                record.max_price1.to_string(),
                format!("{:.2}%", record.profit_percentage),
            ]
        })
        .collect()
}

pub fn sentiment_rows(records: &[SentimentRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            vec![
                record.symbol().unwrap_or("?").to_string(),
                record
                    .overall_sentiment()
                    .map(|score| format!("{:.2}", score))
                    .unwrap_or_else(|| "-".to_string()),
                record
                    .signal()
                    .map(|signal| signal.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect()
}

/// Print every dataset of a snapshot followed by its countdown.
pub fn print_snapshot(snapshot: &Snapshot) {
    println!("\nArbitrage pairs ({}):", snapshot.pair_data.len());
    if snapshot.pair_data.is_empty() {
        println!("  No arbitrage pairs.");
    }
    for pair in &snapshot.pair_data {
        println!("  {}", pair);
    }

    println!("\nTracked pairs ({}):", snapshot.track_data.len());
    if snapshot.track_data.is_empty() {
        println!("  No tracked pairs.");
    } else {
        let rows = track_rows(&snapshot.track_data);
        TableFormatter::new(
            vec!["Coin", "Min Exchange", "Min Price", "Max Exchange", "Max Price", "Profit"],
            &rows,
            24,
        )
        .print_table(&rows);
    }

    println!("\nMarket sentiment ({}):", snapshot.sentiment_data.len());
    if snapshot.sentiment_data.is_empty() {
        println!("  No sentiment data.");
    } else {
        let rows = sentiment_rows(&snapshot.sentiment_data);
        TableFormatter::new(vec!["Symbol", "Score", "Signal"], &rows, 16).print_table(&rows);
    }

    if snapshot.next_refresh_at.is_some() {
        println!("\nNext refresh in: {}", snapshot.countdown_label());
    }
}

/// Truncate a string to a maximum display width, adding "..." if truncated.
///
/// Uses character count (not byte count) to safely handle UTF-8 strings
/// including emoji and multi-byte characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        format!("{:<width$}", s, width = max_len)
    } else {
        // Safely truncate at character boundaries, not byte boundaries
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_len)
    }
}
