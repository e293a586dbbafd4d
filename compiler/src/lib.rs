//! mapirops-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.mr` specification files,
//!  2) Canonical rendering of parsed files back to MR text,
//!  3) C code generation: type declarations, push/pull prototypes and
//!     push/pull bodies calling into the libmapirops runtime,
//!  4) A driver writing one `.h`/`.c` pair per specification,
//!  5) Error types (`MrError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod render;
pub mod gen_c;
pub mod driver;

use error::MrError;
use types::MrFile;

pub use driver::{Generator, SpecReport, SpecificationCursor};
pub use gen_c::{generate_header, generate_source, DefaultArmPolicy, GeneratorOptions};

/// Tokenize and parse MR source text.
/// Returns `Err(MrError::ParseError)` at the first syntax error.
pub fn parse_source(text: &str) -> Result<MrFile, MrError> {
    let tokens = tokenizer::tokenize(text)?;
    parser::parse_mr(&tokens)
}
