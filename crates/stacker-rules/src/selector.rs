//! Selector Parser
//!
//! ```text
//! selector := clause ("," clause)*
//! clause   := part (WS+ part)*
//! part     := (ident | "*")? ("." ident | ":" ident)*
//! ident    := [A-Za-z_][A-Za-z0-9_-]*
//! ```
//!
//! Parts read right to left: the last part matches the node itself, each
//! part to its left matches the next parent up. A part with no tag matches
//! any tag.

use crate::error::SelectorError;
use crate::hash::{MAX_RULE_CLASSES, MAX_SELECTOR_DEPTH, part_hash, pseudo_class_hash, class_hash, rule_key, tag_hash};

/// Parsed selector: rule keys for every clause, innermost part first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSelector {
    keys: Vec<u64>,
    clause_lengths: Vec<u8>,
}

impl ParsedSelector {
    pub fn num_clauses(&self) -> usize {
        self.clause_lengths.len()
    }

    /// Total keys over all clauses
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    /// Keys of one clause, depth 0 first
    pub fn clause(&self, index: usize) -> &[u64] {
        let start: usize = self.clause_lengths[..index].iter().map(|&n| n as usize).sum();
        &self.keys[start..start + self.clause_lengths[index] as usize]
    }

    pub fn clauses(&self) -> impl Iterator<Item = &[u64]> + '_ {
        let mut start = 0usize;
        self.clause_lengths.iter().map(move |&n| {
            let clause = &self.keys[start..start + n as usize];
            start += n as usize;
            clause
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace, reporting whether any was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn invalid(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::InvalidChar { offset: self.pos, ch },
            None => SelectorError::IllFormed,
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }

    fn part(&mut self) -> Result<u64, SelectorError> {
        let tag = match self.peek() {
            Some('*') => {
                self.bump();
                "*"
            }
            Some('.') | Some(':') => "*",
            Some(c) if is_ident_start(c) => self.ident().unwrap_or("*"),
            _ => return Err(self.invalid()),
        };

        let mut qualifiers = Vec::new();
        while let Some(prefix @ ('.' | ':')) = self.peek() {
            self.bump();
            let name = self.ident().ok_or(SelectorError::MissingClass)?;
            qualifiers.push(if prefix == '.' { class_hash(name) } else { pseudo_class_hash(name) });
            if qualifiers.len() > MAX_RULE_CLASSES {
                return Err(SelectorError::TooLong);
            }
        }
        Ok(part_hash(tag_hash(tag), &mut qualifiers))
    }

    /// One clause, returning part hashes left to right
    fn clause(&mut self) -> Result<Vec<u64>, SelectorError> {
        self.skip_ws();
        if matches!(self.peek(), None | Some(',')) {
            return Err(SelectorError::IllFormed);
        }
        let mut parts = Vec::new();
        loop {
            parts.push(self.part()?);
            if parts.len() > MAX_SELECTOR_DEPTH {
                return Err(SelectorError::TooLong);
            }
            let spaced = self.skip_ws();
            match self.peek() {
                None | Some(',') => return Ok(parts),
                Some(_) if spaced => continue,
                Some(_) => return Err(self.invalid()),
            }
        }
    }
}

/// Parse a selector string
pub fn parse_selector(src: &str) -> Result<ParsedSelector, SelectorError> {
    if src.trim().is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut parser = Parser { src, pos: 0 };
    let mut selector = ParsedSelector::default();
    loop {
        let parts = parser.clause()?;
        selector.clause_lengths.push(parts.len() as u8);
        selector
            .keys
            .extend(parts.iter().rev().enumerate().map(|(depth, &h)| rule_key(h, depth)));
        match parser.peek() {
            Some(',') => parser.bump(),
            _ => return Ok(selector),
        }
    }
}
