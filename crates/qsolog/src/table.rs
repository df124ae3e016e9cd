//! Table presentation of a log.
//!
//! A [`LogTable`] holds the entries of a log as numbered rows, newest first,
//! and supports per-column sorting and a case-insensitive search filter.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fields::format_power;
use crate::qso::{Band, Column, LogEntry, LogFile};

/// Direction of a column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// The opposite direction, as when a header is clicked twice.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// One numbered row of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// 1-based position of the entry in the log file.
    pub seq: usize,
    /// The entry shown on this row.
    #[serde(flatten)]
    pub entry: LogEntry,
    #[serde(skip)]
    hidden: bool,
}

impl Row {
    /// Check if the current search filter hides this row.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Display text of a column.
    #[must_use]
    pub fn display(&self, column: Column) -> String {
        format_cell(&self.entry, column, self.seq)
    }
}

/// Entries of a log arranged for display.
#[derive(Debug, Clone, Default)]
pub struct LogTable {
    rows: Vec<Row>,
    sorted_by: Option<(Column, SortOrder)>,
    filter: Option<String>,
}

impl LogTable {
    /// Build a table from a log, newest entry first.
    #[must_use]
    pub fn from_log(log: &LogFile) -> Self {
        let mut rows: Vec<Row> = log
            .numbered()
            .map(|(seq, entry)| Row {
                seq,
                entry: entry.clone(),
                hidden: false,
            })
            .collect();
        rows.reverse();
        Self {
            rows,
            sorted_by: None,
            filter: None,
        }
    }

    /// Number of rows, hidden ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows not hidden by the search filter, in display order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| !row.hidden)
    }

    /// Find a row by sequence number.
    #[must_use]
    pub fn row(&self, seq: usize) -> Option<&Row> {
        self.rows.iter().find(|row| row.seq == seq)
    }

    /// The column and direction of the last sort, if any.
    #[must_use]
    pub fn sorted_by(&self) -> Option<(Column, SortOrder)> {
        self.sorted_by
    }

    /// The active search term, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Sort rows by a column.
    ///
    /// The sort is stable. Times and dates sort chronologically, bands by
    /// their position in the band plan and numeric columns by value. Values
    /// that do not parse go last whichever the direction.
    pub fn sort_by(&mut self, column: Column, order: SortOrder) {
        let mut keyed: Vec<(Option<SortKey>, Row)> = self
            .rows
            .drain(..)
            .map(|row| (sort_key(&row, column), row))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), order));
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        self.sorted_by = Some((column, order));
        debug!(%column, ?order, "Sorted table");
    }

    /// Hide rows that do not contain `term` in any column.
    ///
    /// Matching is a case-insensitive substring test against the displayed
    /// text. When nothing matches the table is left unfiltered. Returns the
    /// number of matching rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySearch`] if the term is blank.
    pub fn search(&mut self, term: &str) -> Result<usize> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::EmptySearch);
        }
        let needle = term.to_lowercase();
        let matches: Vec<bool> = self
            .rows
            .iter()
            .map(|row| {
                Column::ALL
                    .into_iter()
                    .any(|column| row.display(column).to_lowercase().contains(&needle))
            })
            .collect();
        let count = matches.iter().filter(|m| **m).count();

        if count == 0 {
            self.clear_search();
        } else {
            for (row, matched) in self.rows.iter_mut().zip(matches) {
                row.hidden = !matched;
            }
            self.filter = Some(term.to_string());
        }
        debug!(term, count, "Searched table");
        Ok(count)
    }

    /// Show all rows again.
    pub fn clear_search(&mut self) {
        for row in &mut self.rows {
            row.hidden = false;
        }
        self.filter = None;
    }

    /// Replace the entry on a row, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowNotFound`] if no row has the sequence number.
    pub fn replace(&mut self, seq: usize, entry: LogEntry) -> Result<()> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.seq == seq)
            .ok_or(Error::RowNotFound { seq })?;
        row.entry = entry;
        Ok(())
    }

    /// Remove a row, returning its entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowNotFound`] if no row has the sequence number.
    pub fn remove(&mut self, seq: usize) -> Result<LogEntry> {
        let index = self
            .rows
            .iter()
            .position(|row| row.seq == seq)
            .ok_or(Error::RowNotFound { seq })?;
        Ok(self.rows.remove(index).entry)
    }
}

/// Display text of an entry's column.
///
/// Frequencies show three decimals and reports whole numbers. Power shows
/// two decimals when stored with a decimal point. Numeric text that does not
/// parse displays as a formatted zero.
#[must_use]
pub fn format_cell(entry: &LogEntry, column: Column, seq: usize) -> String {
    match column {
        Column::Seq => format!("{seq:04}"),
        Column::Freq => format!("{:.3}", parse_number(&entry.freq).unwrap_or(0.0)),
        Column::Tx => format_report(&entry.tx),
        Column::Rx => format_report(&entry.rx),
        Column::Pwr => parse_number(&entry.pwr)
            .map_or_else(|| "0".to_string(), |watts| format_power(&entry.pwr, watts)),
        _ => entry.cell(column).unwrap_or_default(),
    }
}

fn format_report(text: &str) -> String {
    text.trim()
        .parse::<i64>()
        .map_or_else(|_| "0".to_string(), |value| value.to_string())
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey {
    Seq(usize),
    Time(NaiveTime),
    Date(NaiveDate),
    Band(Band),
    Number(f64),
    Text(String),
}

fn sort_key(row: &Row, column: Column) -> Option<SortKey> {
    let entry = &row.entry;
    match column {
        Column::Seq => Some(SortKey::Seq(row.seq)),
        Column::Time => entry.parsed_time().map(SortKey::Time),
        Column::Date => entry.parsed_date().map(SortKey::Date),
        Column::Band => Some(SortKey::Band(entry.band)),
        Column::Freq | Column::Tx | Column::Rx | Column::Pwr => entry
            .cell(column)
            .and_then(|text| parse_number(&text))
            .map(SortKey::Number),
        Column::Call | Column::Mode | Column::Qso => entry.cell(column).map(SortKey::Text),
    }
}

fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qso::tests::entry;

    fn table_of(entries: Vec<LogEntry>) -> LogTable {
        let mut log = LogFile::new("N0CALL", "FN31");
        log.log = entries;
        LogTable::from_log(&log)
    }

    fn column_text(table: &LogTable, column: Column) -> Vec<String> {
        table.rows().iter().map(|row| row.display(column)).collect()
    }

    fn stored(table: &LogTable, column: Column) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|row| row.entry.cell(column).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_newest_first() {
        let table = table_of(vec![
            entry("2024-01-01", "10:00", "FIRST"),
            entry("2024-01-01", "11:00", "SECOND"),
        ]);
        let seqs: Vec<usize> = table.rows().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![2, 1]);
        assert_eq!(table.rows()[0].display(Column::Seq), "0002");
    }

    #[test]
    fn test_band_sort_uses_band_plan() {
        let mut entries = Vec::new();
        for band in [Band::Cm70, Band::M160, Band::M10] {
            let mut e = entry("2024-01-01", "10:00", "W1AW");
            e.band = band;
            entries.push(e);
        }
        let mut table = table_of(entries);

        table.sort_by(Column::Band, SortOrder::Ascending);
        assert_eq!(column_text(&table, Column::Band), ["160m", "10m", "70cm"]);

        table.sort_by(Column::Band, SortOrder::Descending);
        assert_eq!(column_text(&table, Column::Band), ["70cm", "10m", "160m"]);
    }

    #[test]
    fn test_numeric_sort_puts_unparsable_last() {
        let mut entries = Vec::new();
        for freq in ["14.250", "3.500", "-"] {
            let mut e = entry("2024-01-01", "10:00", "W1AW");
            e.freq = freq.to_string();
            entries.push(e);
        }
        let mut table = table_of(entries);

        table.sort_by(Column::Freq, SortOrder::Ascending);
        assert_eq!(stored(&table, Column::Freq), ["3.500", "14.250", "-"]);

        table.sort_by(Column::Freq, SortOrder::Descending);
        assert_eq!(stored(&table, Column::Freq), ["14.250", "3.500", "-"]);
    }

    #[test]
    fn test_numeric_sort_is_by_value() {
        let mut entries = Vec::new();
        for tx in ["59", "-10", "5"] {
            let mut e = entry("2024-01-01", "10:00", "W1AW");
            e.tx = tx.to_string();
            entries.push(e);
        }
        let mut table = table_of(entries);
        table.sort_by(Column::Tx, SortOrder::Ascending);
        assert_eq!(stored(&table, Column::Tx), ["-10", "5", "59"]);
    }

    #[test]
    fn test_time_and_date_sort_chronologically() {
        let mut table = table_of(vec![
            entry("2024-01-10", "9:05", "A"),
            entry("2024-01-09", "10:00", "B"),
            entry("garbage", "23:00", "C"),
        ]);

        table.sort_by(Column::Time, SortOrder::Ascending);
        assert_eq!(stored(&table, Column::Call), ["A", "B", "C"]);

        table.sort_by(Column::Date, SortOrder::Descending);
        assert_eq!(stored(&table, Column::Call), ["A", "B", "C"]);

        table.sort_by(Column::Date, SortOrder::Ascending);
        assert_eq!(stored(&table, Column::Call), ["B", "A", "C"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut table = table_of(vec![
            entry("2024-01-01", "10:00", "ONE"),
            entry("2024-01-01", "10:00", "TWO"),
            entry("2024-01-01", "10:00", "THREE"),
        ]);
        table.sort_by(Column::Band, SortOrder::Descending);
        assert_eq!(stored(&table, Column::Call), ["THREE", "TWO", "ONE"]);
        assert_eq!(table.sorted_by(), Some((Column::Band, SortOrder::Descending)));
    }

    #[test]
    fn test_sort_by_sequence() {
        let mut table = table_of(vec![
            entry("2024-01-01", "10:00", "ONE"),
            entry("2024-01-01", "11:00", "TWO"),
        ]);
        table.sort_by(Column::Seq, SortOrder::Ascending);
        assert_eq!(stored(&table, Column::Call), ["ONE", "TWO"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut table = table_of(vec![
            entry("2024-01-01", "10:00", "W1AW"),
            entry("2024-01-01", "11:00", "K1ABC"),
        ]);
        assert_eq!(table.search("w1a").unwrap(), 1);
        let visible: Vec<&str> = table.visible_rows().map(|r| r.entry.call.as_str()).collect();
        assert_eq!(visible, ["W1AW"]);
        assert_eq!(table.filter(), Some("w1a"));

        table.clear_search();
        assert_eq!(table.visible_rows().count(), 2);
        assert_eq!(table.filter(), None);
    }

    #[test]
    fn test_search_matches_displayed_text() {
        let mut table = table_of(vec![entry("2024-01-01", "10:00", "W1AW")]);
        assert_eq!(table.search("0001").unwrap(), 1);
        assert_eq!(table.search("14.250").unwrap(), 1);
    }

    #[test]
    fn test_search_without_match_leaves_table_unfiltered() {
        let mut table = table_of(vec![
            entry("2024-01-01", "10:00", "W1AW"),
            entry("2024-01-01", "11:00", "K1ABC"),
        ]);
        table.search("W1AW").unwrap();
        assert_eq!(table.search("ZZZ").unwrap(), 0);
        assert_eq!(table.visible_rows().count(), 2);
    }

    #[test]
    fn test_empty_search() {
        let mut table = table_of(vec![entry("2024-01-01", "10:00", "W1AW")]);
        assert!(matches!(table.search("  "), Err(Error::EmptySearch)));
    }

    #[test]
    fn test_replace_and_remove() {
        let mut table = table_of(vec![
            entry("2024-01-01", "10:00", "W1AW"),
            entry("2024-01-01", "11:00", "K1ABC"),
        ]);
        table
            .replace(1, entry("2024-01-01", "10:00", "W1AX"))
            .unwrap();
        assert_eq!(table.row(1).unwrap().entry.call, "W1AX");

        let removed = table.remove(2).unwrap();
        assert_eq!(removed.call, "K1ABC");
        assert_eq!(table.len(), 1);
        assert!(matches!(table.remove(2), Err(Error::RowNotFound { seq: 2 })));
    }

    #[test]
    fn test_format_cell() {
        let mut e = entry("2024-01-01", "10:00", "W1AW");
        e.freq = "7".to_string();
        e.pwr = "5.5".to_string();
        e.tx = "+5".to_string();
        assert_eq!(format_cell(&e, Column::Freq, 1), "7.000");
        assert_eq!(format_cell(&e, Column::Pwr, 1), "5.50");
        assert_eq!(format_cell(&e, Column::Tx, 1), "5");
        assert_eq!(format_cell(&e, Column::Seq, 12), "0012");
        assert_eq!(format_cell(&e, Column::Mode, 1), "SSB");
    }

    #[test]
    fn test_format_cell_unparsable_is_zero() {
        let mut e = entry("2024-01-01", "10:00", "W1AW");
        e.freq = "-".to_string();
        e.rx = "S9".to_string();
        e.pwr = "qrp".to_string();
        assert_eq!(format_cell(&e, Column::Freq, 1), "0.000");
        assert_eq!(format_cell(&e, Column::Rx, 1), "0");
        assert_eq!(format_cell(&e, Column::Pwr, 1), "0");
    }

    #[test]
    fn test_sort_order_toggle() {
        assert_eq!(SortOrder::Ascending.toggled(), SortOrder::Descending);
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
    }
}
