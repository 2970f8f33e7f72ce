// Abstract Syntax Tree for custom filter queries

use crate::error::QueryError;

/// Boolean combination of numbered filter rules (1-indexed).
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Rule(usize),
    Not(Box<Query>),
    And(Box<Query>, Box<Query>),
    Or(Box<Query>, Box<Query>),
}

impl Query {
    pub fn not(q: Query) -> Self {
        Query::Not(Box::new(q))
    }

    pub fn and(a: Query, b: Query) -> Self {
        Query::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: Query, b: Query) -> Self {
        Query::Or(Box::new(a), Box::new(b))
    }

    /// Ensure every referenced rule number lies within `1..=count`.
    pub fn check(&self, count: usize) -> Result<(), QueryError> {
        match self {
            Query::Rule(i) if *i == 0 || *i > count => Err(QueryError::RuleOutOfRange {
                index: *i,
                count,
            }),
            Query::Rule(_) => Ok(()),
            Query::Not(q) => q.check(count),
            Query::And(a, b) | Query::Or(a, b) => {
                a.check(count)?;
                b.check(count)
            }
        }
    }

    /// Evaluate against per-rule outcomes; `passes[0]` is rule 1. Call [`Query::check`] first.
    pub fn matches(&self, passes: &[bool]) -> bool {
        match self {
            Query::Rule(i) => passes.get(i.wrapping_sub(1)).copied().unwrap_or(false),
            Query::Not(q) => !q.matches(passes),
            Query::And(a, b) => a.matches(passes) && b.matches(passes),
            Query::Or(a, b) => a.matches(passes) || b.matches(passes),
        }
    }
}
