//! Query clause parser
//!
//! Understands the lunr-style syntax theme users already type into the box:
//! whitespace-separated clauses of the form `[+|-][field:]term[~N][^N]`,
//! where `*` inside the term is a wildcard. The relaxation chain builds its
//! prefix and fuzzy stages by appending `*` and `~1` to the raw query text,
//! so those modifiers always land on the last clause.

use crate::interface::Field;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query has no clauses")]
    Empty,
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("expected a term in clause `{0}`")]
    MissingTerm(String),
    #[error("expected a number after `{modifier}` in clause `{clause}`")]
    ExpectedNumber { modifier: char, clause: String },
}

/// Whether a clause must, may, or must not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Prohibited,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub presence: Presence,
    /// Restrict matching to one field; `None` searches every field
    pub field: Option<Field>,
    /// Raw term text; may contain `*` wildcards
    pub term: String,
    pub edit_distance: Option<u8>,
    pub boost: f32,
}

impl Clause {
    pub fn is_wildcard(&self) -> bool {
        self.term.contains('*')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub clauses: Vec<Clause>,
}

pub fn parse(query: &str) -> Result<ParsedQuery, QueryError> {
    let clauses = query
        .split_whitespace()
        .map(parse_clause)
        .collect::<Result<Vec<_>, _>>()?;
    if clauses.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(ParsedQuery { clauses })
}

fn parse_clause(raw: &str) -> Result<Clause, QueryError> {
    let (presence, rest) = match raw.chars().next() {
        Some('+') => (Presence::Required, &raw[1..]),
        Some('-') => (Presence::Prohibited, &raw[1..]),
        _ => (Presence::Optional, raw),
    };

    // Modifiers start at the first `~` or `^`; a `:` before that names a field
    let body_end = rest.find(['~', '^']).unwrap_or(rest.len());
    let (body, mut modifiers) = rest.split_at(body_end);

    let (field, term) = match body.split_once(':') {
        Some((name, term)) => {
            let field = Field::from_name(name)
                .ok_or_else(|| QueryError::UnknownField(name.to_string()))?;
            (Some(field), term)
        }
        None => (None, body),
    };

    if term.is_empty() {
        return Err(QueryError::MissingTerm(raw.to_string()));
    }

    let mut clause = Clause {
        presence,
        field,
        term: term.to_string(),
        edit_distance: None,
        boost: 1.0,
    };

    while let Some(modifier) = modifiers.chars().next() {
        let after = &modifiers[1..];
        let digits_end = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());
        let expected = || QueryError::ExpectedNumber {
            modifier,
            clause: raw.to_string(),
        };
        let value: u32 = after[..digits_end].parse().map_err(|_| expected())?;
        match modifier {
            '~' => clause.edit_distance = Some(u8::try_from(value).map_err(|_| expected())?),
            _ => clause.boost = value as f32,
        }
        modifiers = &after[digits_end..];
        // Only another modifier may follow a number
        if !modifiers.is_empty() && !modifiers.starts_with(['~', '^']) {
            return Err(expected());
        }
    }

    Ok(clause)
}
