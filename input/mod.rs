//! Free-text prediction input parsing.
//!
//! The shell accepts one comma-separated line of raw feature values. Each
//! token is coerced by shape: a token made of ASCII digits with at most one
//! decimal point becomes a number, anything else stays text. The ambiguity
//! lives entirely in [`TokenValue`] so downstream code never re-guesses.

use std::fmt;
use thiserror::Error;

/// A raw prediction value, tagged by how it parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Number(v) => write!(f, "{v}"),
            TokenValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Expected {expected} comma-separated values, got {found}.")]
    CountMismatch { expected: usize, found: usize },
}

/// Splits `text` on commas, trims each token, and coerces it.
///
/// The numeric shape test is deliberately narrow: only digits and at most
/// one `.` qualify, so `-3` and `1e5` stay text. Token count must equal
/// `expected` or no value is produced at all.
pub fn parse_input_row(text: &str, expected: usize) -> Result<Vec<TokenValue>, InputError> {
    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    if tokens.len() != expected {
        return Err(InputError::CountMismatch {
            expected,
            found: tokens.len(),
        });
    }
    Ok(tokens.into_iter().map(coerce_token).collect())
}

fn coerce_token(token: &str) -> TokenValue {
    if looks_numeric(token) {
        match token.parse::<f64>() {
            Ok(v) => TokenValue::Number(v),
            Err(_) => TokenValue::Text(token.to_string()),
        }
    } else {
        TokenValue::Text(token.to_string())
    }
}

fn looks_numeric(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let mut dots = 0usize;
    for c in token.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1 && token.chars().any(|c| c.is_ascii_digit())
}
