mod object;

pub use object::{Dict, ObjRef, PdfObject};
