//! String sets
//!
//! Canonical storage: each element null-terminated, then one extra null.
//! `{a, b}` is stored as `a\0b\0\0`; the empty set is a single `\0`.

use crate::{AttrError, AttrResult};

/// Which delimiter an input list uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Comma,
    Whitespace,
}

/// Split markup input into distinct tokens in first-seen order.
///
/// Tokens are separated either by commas or by whitespace, never both. A
/// single trailing delimiter is tolerated.
pub fn parse_tokens(input: &str) -> AttrResult<Vec<&str>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let has_comma = trimmed.contains(',');
    let delimiter = if has_comma { Delimiter::Comma } else { Delimiter::Whitespace };

    let mut tokens: Vec<&str> = Vec::new();
    match delimiter {
        Delimiter::Whitespace => {
            for token in trimmed.split_whitespace() {
                push_unique(&mut tokens, token);
            }
        }
        Delimiter::Comma => {
            let body = trimmed.strip_suffix(',').unwrap_or(trimmed);
            for raw in body.split(',') {
                let token = raw.trim();
                // Whitespace inside a comma list means the delimiters were mixed
                if token.is_empty() || token.contains(char::is_whitespace) {
                    return Err(AttrError::TypeMismatch);
                }
                push_unique(&mut tokens, token);
            }
        }
    }
    Ok(tokens)
}

fn push_unique<'a>(tokens: &mut Vec<&'a str>, token: &'a str) {
    if !tokens.contains(&token) {
        tokens.push(token);
    }
}

/// Encode elements into canonical storage
pub fn encode<'a, I>(elements: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for element in elements {
        out.extend_from_slice(element.as_bytes());
        out.push(0);
    }
    out.push(0);
    out
}

/// Parse and encode markup input
pub fn canonicalize(input: &str) -> AttrResult<Vec<u8>> {
    let tokens = parse_tokens(input)?;
    if tokens.iter().any(|t| t.as_bytes().contains(&0)) {
        return Err(AttrError::TypeMismatch);
    }
    Ok(encode(tokens))
}

/// Iterate the elements of canonical storage
pub fn elements(payload: &[u8]) -> impl Iterator<Item = &str> + '_ {
    payload
        .split(|&b| b == 0)
        .take_while(|s| !s.is_empty())
        .filter_map(|s| std::str::from_utf8(s).ok())
}

pub fn contains(payload: &[u8], element: &str) -> bool {
    elements(payload).any(|e| e == element)
}

/// Elements of `a` followed by elements of `b` not already in `a`
pub fn union(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut merged: Vec<&str> = elements(a).collect();
    for element in elements(b) {
        push_unique(&mut merged, element);
    }
    encode(merged)
}

/// Elements of `a` not in `b`
pub fn difference(a: &[u8], b: &[u8]) -> Vec<u8> {
    encode(elements(a).filter(|e| !contains(b, e)))
}

/// Join elements with a delimiter
pub fn join(payload: &[u8], delimiter: &str) -> String {
    elements(payload).collect::<Vec<_>>().join(delimiter)
}
