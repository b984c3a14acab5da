pub mod config;
pub mod content;
pub mod convert;
pub mod decode;
pub mod document;
pub mod error;
pub mod extract;
pub mod font;
pub mod logging;
pub mod parser;
pub mod server;
pub mod types;

pub use config::Config;
pub use content::{PageContent, TextSpan};
pub use convert::{Attempt, Extraction, Extractor, Strategy, csv_path_for};
pub use decode::decode_stream;
pub use document::Document;
pub use error::{ExtractError, PdfError, Result};
pub use extract::{ExtractionSettings, Flavor, Table};
pub use types::{ObjRef, PdfObject};
