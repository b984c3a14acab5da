use std::collections::BTreeMap;

use crate::content::TextSpan;
use crate::extract::{StreamSettings, Table};

/// Gaps wider than this fraction of the font size read as a word break
const WORD_SPACE_RATIO: f64 = 0.15;

/// Find tables formed by text alignment alone
pub fn detect_tables(spans: &[TextSpan], settings: &StreamSettings) -> Vec<Table> {
    let spans: Vec<TextSpan> = spans.iter().filter(|s| !s.text.trim().is_empty()).cloned().collect();
    if spans.is_empty() {
        return Vec::new();
    }

    // Calculate adaptive tolerance based on average font size
    let avg_font_size = spans.iter().map(|s| s.font_size).sum::<f64>() / spans.len() as f64;
    let rows: Vec<Vec<TextSpan>> = cluster_into_rows(spans, avg_font_size * 0.5)
        .into_iter()
        .map(|row| merge_phrases(row, settings.word_gap_ratio))
        .collect();

    let is_candidate = |row: &[TextSpan]| count_x_clusters(row, settings.column_tolerance) >= settings.min_columns;

    // Maximal runs of consecutive candidate rows
    let mut tables = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        if !is_candidate(&rows[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < rows.len() && is_candidate(&rows[i]) {
            i += 1;
        }
        if i - start >= settings.min_rows {
            tables.push(build_table(&rows[start..i]));
        }
    }

    tables
}

/// Group spans into rows by Y coordinate, top to bottom, each sorted by X
pub(super) fn cluster_into_rows(mut spans: Vec<TextSpan>, tolerance: f64) -> Vec<Vec<TextSpan>> {
    // Sort by Y descending (top to bottom), then X ascending
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<TextSpan>> = Vec::new();
    let mut current_row: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f64> = None;

    for span in spans {
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => {
                // Same row
                current_row.push(span);
            }
            _ => {
                // New row
                if !current_row.is_empty() {
                    rows.push(current_row);
                }
                current_y = Some(span.y);
                current_row = vec![span];
            }
        }
    }

    if !current_row.is_empty() {
        rows.push(current_row);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    rows
}

/// Merge horizontally adjacent spans of a row into phrases
fn merge_phrases(row: Vec<TextSpan>, word_gap_ratio: f64) -> Vec<TextSpan> {
    let mut phrases: Vec<TextSpan> = Vec::new();

    for span in row {
        match phrases.last_mut() {
            Some(last) if span.x - last.right() < word_gap_ratio * last.font_size.max(span.font_size) => {
                if span.x - last.right() > last.font_size * WORD_SPACE_RATIO {
                    last.text.push(' ');
                }
                last.text.push_str(&span.text);
                last.width = last.width.max(span.right() - last.x);
            }
            _ => phrases.push(span),
        }
    }

    phrases
}

/// Text of spans in reading order: lines top to bottom, words left to right
pub(super) fn join_spans(spans: Vec<TextSpan>) -> String {
    if spans.is_empty() {
        return String::new();
    }
    let avg_font_size = spans.iter().map(|s| s.font_size).sum::<f64>() / spans.len() as f64;

    cluster_into_rows(spans, avg_font_size * 0.5)
        .into_iter()
        .flat_map(|row| merge_phrases(row, f64::INFINITY))
        .map(|phrase| phrase.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count distinct X-position clusters in a line
fn count_x_clusters(spans: &[TextSpan], tolerance: f64) -> usize {
    if spans.is_empty() {
        return 0;
    }

    let mut xs: Vec<f64> = spans.iter().map(|s| s.x).collect();
    xs.sort_by(f64::total_cmp);

    let mut clusters = 1;
    let mut last_x = xs[0];

    for &x in &xs[1..] {
        if (x - last_x).abs() > tolerance {
            clusters += 1;
            last_x = x;
        }
    }

    clusters
}

/// Lay a run of rows out on shared columns
fn build_table(rows: &[Vec<TextSpan>]) -> Table {
    let columns = column_ranges(rows);

    let grid = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = vec![String::new(); columns.len()];
            for phrase in row {
                let col = nearest_column(phrase, &columns);
                // Append to cell (may have multiple phrases in same cell)
                if !cells[col].is_empty() {
                    cells[col].push(' ');
                }
                cells[col].push_str(&phrase.text);
            }
            cells
        })
        .collect();

    Table::from_rows(grid)
}

/// Horizontal extent of each column, left to right.
///
/// Rows with the most common phrase count define the layout; wider
/// headers or wrapped cells in other rows cannot add columns.
fn column_ranges(rows: &[Vec<TextSpan>]) -> Vec<(f64, f64)> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.len()).or_insert(0) += 1;
    }
    // Ties go to the layout with more columns
    let width = counts
        .iter()
        .max_by_key(|&(len, n)| (*n, *len))
        .map(|(len, _)| *len)
        .unwrap_or(0);

    let mut ranges = vec![(f64::INFINITY, f64::NEG_INFINITY); width];
    for row in rows.iter().filter(|r| r.len() == width) {
        for (range, phrase) in ranges.iter_mut().zip(row) {
            range.0 = range.0.min(phrase.x);
            range.1 = range.1.max(phrase.right());
        }
    }

    // Overlapping extents describe one column
    ranges.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.0 <= last.1 => last.1 = last.1.max(range.1),
            _ => merged.push(range),
        }
    }

    merged
}

fn nearest_column(phrase: &TextSpan, columns: &[(f64, f64)]) -> usize {
    let center = phrase.center_x();
    let distance = |&(lo, hi): &(f64, f64)| {
        if center < lo {
            lo - center
        } else if center > hi {
            center - hi
        } else {
            0.0
        }
    };

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(a).total_cmp(&distance(b)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
