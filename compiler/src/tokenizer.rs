use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::MrError;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(0[xX][0-9A-Fa-f]+\b|\d+\b|"(?:[^"\\\n]|\\.)*"|[=;,|{}\[\]()]|\b[A-Za-z_][A-Za-z0-9_]*\b|//[^\n]*|/\*(?s:.*?)\*/|\s+)"#
    ).unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
    pub offset: usize,
}

fn is_trivia(part: &str) -> bool {
    part.starts_with("//") || part.starts_with("/*") || part.trim().is_empty()
}

/// Split MR source text into tokens. Whitespace and comments are dropped and
/// an empty end-of-file token is always appended.
pub fn tokenize(text: &str) -> Result<Vec<Token>, MrError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
                last_end,
            ));
        }

        if !is_trivia(part) {
            tokens.push(Token {
                text:   part.to_string(),
                line,
                column,
                offset: start,
            });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
            last_end,
        ));
    }

    tokens.push(Token {
        text:   String::new(),
        line,
        column,
        offset: text.len(),
    });
    Ok(tokens)
}
