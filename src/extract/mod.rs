//! Table detection over interpreted pages.
//!
//! Two detectors share one entry point: lattice reads the ruling lines a
//! page draws, stream infers columns from how text lines up.

mod lattice;
mod stream;
mod table;

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::content::PageContent;
use crate::document::Document;
use crate::error::{PdfError, Result};

pub use table::Table;

/// Detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Ruling lines present
    Lattice,
    /// Whitespace-separated columns
    Stream,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Lattice => "lattice",
            Flavor::Stream => "stream",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for ruling-line detection, in PDF points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeSettings {
    /// Maximum skew for a line to count as horizontal or vertical, and
    /// the distance under which parallel rulings are one line
    pub snap_tolerance: f64,
    /// Gap bridged when joining collinear pieces or crossing lines
    pub join_tolerance: f64,
    /// Filled rectangles at most this thick are drawn rules
    pub line_thickness: f64,
    /// Shorter pieces are ignored
    pub min_segment_length: f64,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 2.0,
            join_tolerance: 2.0,
            line_thickness: 2.0,
            min_segment_length: 5.0,
        }
    }
}

/// Tunables for text-alignment detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Consecutive aligned rows needed for a table
    pub min_rows: usize,
    /// Distinct columns a row needs to count as tabular
    pub min_columns: usize,
    /// Left edges closer than this (points) are one column
    pub column_tolerance: f64,
    /// Spans closer than this many font sizes are one phrase
    pub word_gap_ratio: f64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            column_tolerance: 10.0,
            word_gap_ratio: 1.0,
        }
    }
}

/// Everything that shapes an extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Upper bound on one conversion; 0 disables it
    pub timeout_seconds: u64,
    /// Emit a leading `0,1,2,...` row of positional column labels
    pub column_index_header: bool,
    pub lattice: LatticeSettings,
    pub stream: StreamSettings,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            column_index_header: false,
            lattice: LatticeSettings::default(),
            stream: StreamSettings::default(),
        }
    }
}

/// Tables on one interpreted page, top to bottom
pub fn detect_page(page: &PageContent, flavor: Flavor, settings: &ExtractionSettings) -> Vec<Table> {
    match flavor {
        Flavor::Lattice => lattice::detect_tables(page, &settings.lattice),
        Flavor::Stream => stream::detect_tables(&page.spans, &settings.stream),
    }
}

/// Detect tables on every page, in page order.
///
/// A page that cannot be interpreted is skipped; the document only fails
/// when no page could be read at all.
pub fn read_tables(doc: &mut Document<'_>, flavor: Flavor, settings: &ExtractionSettings) -> Result<Vec<Table>> {
    let page_count = doc.page_count()?;
    let mut tables = Vec::new();
    let mut first_error: Option<PdfError> = None;
    let mut pages_read = 0;

    for index in 0..page_count {
        let page = match doc.extract_page(index) {
            Ok(page) => page,
            Err(e) => {
                warn!("Page {} unreadable: {}", index + 1, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
                continue;
            }
        };
        pages_read += 1;

        let found = detect_page(&page, flavor, settings);
        debug!("Page {}: {} {} table(s)", index + 1, found.len(), flavor);
        tables.extend(found);
    }

    match first_error {
        Some(e) if pages_read == 0 => Err(e),
        _ => Ok(tables),
    }
}
