use thiserror::Error;

use crate::style::StyleKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    #[error("a {kind} style named '{name}' already exists")]
    DuplicateName { kind: StyleKind, name: String },
    #[error("no {kind} style at position {index}")]
    NotFound { kind: StyleKind, index: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("could not parse filter query '{query}' near '{remaining}'")]
    Parse { query: String, remaining: String },
    #[error("filter query references rule {index}, but only {count} rules are active")]
    RuleOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PivotError {
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error("legend field {index} does not exist")]
    LegendFieldNotFound { index: usize },
    #[error("no row override for row {pk}")]
    OverrideNotFound { pk: usize },
    #[error("{section} entry {index} does not exist")]
    OutOfRange { section: &'static str, index: usize },
}
