pub mod lexer;
mod object;

pub use lexer::{Lexer, Token};

/// Deepest array/dictionary nesting either parser accepts
pub const MAX_NESTING: usize = 128;
pub use object::Parser;
