use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use pdf2csv::extract::{self, ExtractionSettings};
use pdf2csv::logging::init_logging;
use pdf2csv::{Config, Document, Extraction, Extractor, Flavor, Strategy, csv_path_for, server};

#[derive(Parser)]
#[command(name = "pdf2csv")]
#[command(about = "Detect tables in PDF files and export them as one CSV", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file; `PDF2CSV_*` variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (POST /convert).
    Serve,

    /// Convert one PDF to CSV.
    Convert {
        pdf: PathBuf,
        /// Output path. Default: the PDF path with a .csv extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = FlavorArg::Auto)]
        flavor: FlavorArg,
        /// Print a JSON summary instead of the output path
        #[arg(long)]
        json: bool,
    },

    /// Show what the reader and both detectors see, page by page.
    Inspect {
        pdf: PathBuf,
        /// Only this page (1-indexed)
        #[arg(long)]
        page: Option<usize>,
        /// List every text span with its position
        #[arg(long)]
        spans: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FlavorArg {
    Lattice,
    Stream,
    /// Lattice, then stream when lattice finds nothing
    Auto,
}

impl From<FlavorArg> for Strategy {
    fn from(arg: FlavorArg) -> Self {
        match arg {
            FlavorArg::Lattice => Strategy::Only(Flavor::Lattice),
            FlavorArg::Stream => Strategy::Only(Flavor::Stream),
            FlavorArg::Auto => Strategy::Fallback,
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    match cli.command {
        Command::Serve => {
            server::run(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Convert {
            pdf,
            output,
            flavor,
            json,
        } => convert(&pdf, output, flavor.into(), json, config.extraction),
        Command::Inspect { pdf, page, spans } => {
            inspect(&pdf, page, spans, &config.extraction)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn convert(
    pdf: &Path,
    output: Option<PathBuf>,
    strategy: Strategy,
    json: bool,
    settings: ExtractionSettings,
) -> anyhow::Result<ExitCode> {
    let csv_path = output.unwrap_or_else(|| csv_path_for(pdf));
    let extraction = Extractor::new(settings).extract_to(pdf, &csv_path, strategy)?;

    match extraction {
        Extraction::Csv {
            path,
            flavor,
            tables,
            rows,
        } => {
            if json {
                let summary = serde_json::json!({
                    "csv": path,
                    "flavor": flavor,
                    "tables": tables,
                    "rows": rows,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Extraction::NoTables { lattice, stream } => {
            if json {
                let summary = serde_json::json!({
                    "error": "No tables detected",
                    "lattice": lattice.to_string(),
                    "stream": stream.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                eprintln!("No tables detected (lattice: {}, stream: {})", lattice, stream);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn inspect(pdf: &Path, page_filter: Option<usize>, show_spans: bool, settings: &ExtractionSettings) -> anyhow::Result<()> {
    let data = fs::read(pdf).with_context(|| format!("Failed to read {}", pdf.display()))?;
    let mut doc = Document::parse(&data).with_context(|| format!("Failed to parse {}", pdf.display()))?;

    let page_count = doc.page_count()?;
    println!("{}: {} page(s), {} object(s)", pdf.display(), page_count, doc.object_count());

    let pages: Vec<usize> = match page_filter {
        Some(p) if p >= 1 && p <= page_count => vec![p - 1],
        Some(p) => anyhow::bail!("Invalid page number: {} (document has {} pages)", p, page_count),
        None => (0..page_count).collect(),
    };

    for index in pages {
        println!();
        let page = match doc.extract_page(index) {
            Ok(page) => page,
            Err(e) => {
                println!("--- Page {} --- unreadable: {}", index + 1, e);
                continue;
            }
        };

        let [x0, y0, x1, y1] = page.media_box;
        println!(
            "--- Page {} --- {}x{}pt, {} span(s), {} segment(s), {} bar(s)",
            index + 1,
            x1 - x0,
            y1 - y0,
            page.spans.len(),
            page.segments.len(),
            page.bars.len()
        );

        if show_spans {
            for span in &page.spans {
                println!("[{:.1}, {:.1}] ({}pt, w {:.1}): {}", span.x, span.y, span.font_size, span.width, span.text);
            }
        }

        for flavor in [Flavor::Lattice, Flavor::Stream] {
            let tables = extract::detect_page(&page, flavor, settings);
            println!("{}: {} table(s)", flavor, tables.len());
            for (i, table) in tables.iter().enumerate() {
                println!("  #{} ({} x {})", i + 1, table.rows.len(), table.num_columns);
                for line in table.to_text().lines() {
                    println!("    {}", line);
                }
            }
        }
    }

    Ok(())
}
