//! PDF to CSV pipeline: detect, concatenate, export.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::document::Document;
use crate::error::{ExtractError, PdfError};
use crate::extract::{self, ExtractionSettings, Flavor, Table};

/// Outcome of running one detection flavor over a document
#[derive(Debug)]
pub enum Attempt {
    Found(Vec<Table>),
    Empty,
    Failed(PdfError),
    /// Not tried
    Skipped,
}

impl Attempt {
    pub fn table_count(&self) -> usize {
        match self {
            Attempt::Found(tables) => tables.len(),
            _ => 0,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Found(tables) => write!(f, "found {} table(s)", tables.len()),
            Attempt::Empty => f.write_str("no tables"),
            Attempt::Failed(e) => write!(f, "failed: {}", e),
            Attempt::Skipped => f.write_str("skipped"),
        }
    }
}

/// Result of a conversion that got as far as reading the input
#[derive(Debug)]
pub enum Extraction {
    Csv {
        path: PathBuf,
        flavor: Flavor,
        tables: usize,
        rows: usize,
    },
    NoTables {
        lattice: Attempt,
        stream: Attempt,
    },
}

/// Which flavors to try
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Lattice first, stream when lattice finds nothing
    #[default]
    Fallback,
    Only(Flavor),
}

/// CSV output path for a PDF: same location, `.csv` extension
pub fn csv_path_for(pdf: &Path) -> PathBuf {
    pdf.with_extension("csv")
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    settings: ExtractionSettings,
}

impl Extractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Parse `data` and run one flavor over every page
    pub fn attempt(&self, data: &[u8], flavor: Flavor) -> Attempt {
        let result = Document::parse(data).and_then(|mut doc| extract::read_tables(&mut doc, flavor, &self.settings));

        match result {
            Ok(mut tables) => {
                tables.retain(|t| !t.is_empty());
                if tables.is_empty() {
                    Attempt::Empty
                } else {
                    Attempt::Found(tables)
                }
            }
            Err(e) => Attempt::Failed(e),
        }
    }

    /// Convert `pdf` to a CSV beside it, trying lattice then stream
    pub fn extract(&self, pdf: &Path) -> Result<Extraction, ExtractError> {
        self.extract_to(pdf, &csv_path_for(pdf), Strategy::Fallback)
    }

    pub fn extract_to(&self, pdf: &Path, csv_path: &Path, strategy: Strategy) -> Result<Extraction, ExtractError> {
        let start = Instant::now();
        let data = fs::read(pdf).map_err(|source| ExtractError::ReadInput {
            path: pdf.to_path_buf(),
            source,
        })?;

        let (lattice, stream) = match strategy {
            Strategy::Fallback => {
                let lattice = self.attempt(&data, Flavor::Lattice);
                match &lattice {
                    Attempt::Found(_) => (lattice, Attempt::Skipped),
                    Attempt::Failed(e) => {
                        warn!("Lattice extraction failed for {}: {}", pdf.display(), e);
                        (lattice, self.attempt(&data, Flavor::Stream))
                    }
                    _ => {
                        debug!("Lattice found no tables in {}, trying stream", pdf.display());
                        (lattice, self.attempt(&data, Flavor::Stream))
                    }
                }
            }
            Strategy::Only(Flavor::Lattice) => (self.attempt(&data, Flavor::Lattice), Attempt::Skipped),
            Strategy::Only(Flavor::Stream) => (Attempt::Skipped, self.attempt(&data, Flavor::Stream)),
        };

        let (flavor, tables) = match (lattice, stream) {
            (Attempt::Found(tables), _) => (Flavor::Lattice, tables),
            (_, Attempt::Found(tables)) => (Flavor::Stream, tables),
            (lattice, stream) => {
                info!(
                    "No tables in {} (lattice: {}, stream: {}) in {:.2?}",
                    pdf.display(),
                    lattice,
                    stream,
                    start.elapsed()
                );
                return Ok(Extraction::NoTables { lattice, stream });
            }
        };

        let combined = Table::concat(&tables);
        let csv = self.render_csv(&combined);
        fs::write(csv_path, csv).map_err(|source| ExtractError::WriteCsv {
            path: csv_path.to_path_buf(),
            source,
        })?;

        info!(
            "Extracted {} table(s), {} row(s) from {} with {} in {:.2?}",
            tables.len(),
            combined.rows.len(),
            pdf.display(),
            flavor,
            start.elapsed()
        );

        Ok(Extraction::Csv {
            path: csv_path.to_path_buf(),
            flavor,
            tables: tables.len(),
            rows: combined.rows.len(),
        })
    }

    fn render_csv(&self, table: &Table) -> String {
        if !self.settings.column_index_header {
            return table.to_csv();
        }
        let labels: Vec<String> = (0..table.num_columns).map(|i| i.to_string()).collect();
        format!("{}\n{}", labels.join(","), table.to_csv())
    }
}
