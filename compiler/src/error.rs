use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
        offset: usize,
    },

    #[error("Code generation error: {0}")]
    GenerateError(String),

    #[error("Cannot write {}: {source}", path.display())]
    Output {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MrError {
    /// Position of a parse error as `(line, column)`, if this is one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            MrError::ParseError { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}
