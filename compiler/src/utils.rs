use crate::error::MrError;
use crate::tokenizer::Token;

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize, offset: usize) -> MrError {
    MrError::ParseError {
        msg: msg.to_string(),
        line,
        column,
        offset,
    }
}

/// Parse error located at `tok`.
pub fn error_at(msg: &str, tok: &Token) -> MrError {
    error(msg, tok.line, tok.column, tok.offset)
}

/// How a token is named in diagnostics.
pub fn describe(tok: &Token) -> String {
    if tok.text.is_empty() {
        "end of file".to_string()
    } else {
        quote(&tok.text)
    }
}

/// Render `source` with a caret under `column` of `line`, for terminal output.
pub fn caret_excerpt(source: &str, line: usize, column: usize) -> String {
    let text = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
    format!("{}\n{}^", text, " ".repeat(column.saturating_sub(1)))
}
