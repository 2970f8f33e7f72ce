//! Row filtering by predicate rules combined with AND, OR, or a custom boolean query.

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::data::FieldValue;
use crate::ir::RenderRow;
use crate::parser::parse_query;
use crate::settings::{FilterLogic, FilterRule, Quantifier};

/// Whether `value` satisfies a single rule.
///
/// Text comparisons are case-insensitive. Numeric quantifiers are false, never an error, when
/// either side is not numeric.
pub fn rule_passes(rule: &FilterRule, value: &FieldValue) -> bool {
    let numeric = |cmp: fn(f64, f64) -> bool| match (value.as_number(), rule.value.as_number()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    };
    let contains = || {
        value
            .to_string()
            .to_lowercase()
            .contains(&rule.value.as_text().to_lowercase())
    };

    match rule.quantifier {
        Quantifier::Gt => numeric(|a, b| a > b),
        Quantifier::Gte => numeric(|a, b| a >= b),
        Quantifier::Lt => numeric(|a, b| a < b),
        Quantifier::Lte => numeric(|a, b| a <= b),
        Quantifier::Exact => value.to_string().to_lowercase() == rule.value.as_text().to_lowercase(),
        Quantifier::Contains => contains(),
        Quantifier::NotContains => !contains(),
        Quantifier::Unknown => true,
    }
}

fn active_rules(rules: &[FilterRule]) -> Vec<&FilterRule> {
    rules
        .iter()
        .filter(|r| {
            if r.quantifier == Quantifier::Unknown {
                warn!(field = %r.field_name, "skipping filter with unrecognized quantifier");
            }
            r.is_active()
        })
        .collect()
}

/// Filter rows. `query` is only consulted for [`FilterLogic::Custom`], where rule numbers
/// (1-indexed) refer to the active rules in document order. A query that fails to parse or
/// references a missing rule matches no rows.
pub fn apply(
    rows: Vec<RenderRow>,
    rules: &[FilterRule],
    logic: FilterLogic,
    query: &str,
) -> Vec<RenderRow> {
    let active = active_rules(rules);
    if active.is_empty() {
        return rows;
    }

    let before = rows.len();
    let kept = match logic {
        FilterLogic::And => active.iter().fold(rows, |rows, rule| {
            rows.into_iter()
                .filter(|row| rule_passes(rule, row.field(&rule.field_name)))
                .collect()
        }),
        FilterLogic::Or => union(rows, &active),
        FilterLogic::Custom => custom(rows, &active, query),
    };
    debug!(?logic, before, after = kept.len(), "applied filters");
    kept
}

/// Rows passing any rule, in the order they are first matched rule by rule.
fn union(rows: Vec<RenderRow>, rules: &[&FilterRule]) -> Vec<RenderRow> {
    let mut order: IndexSet<usize> = IndexSet::new();
    for rule in rules {
        for (i, row) in rows.iter().enumerate() {
            if rule_passes(rule, row.field(&rule.field_name)) {
                order.insert(i);
            }
        }
    }

    let mut slots: Vec<Option<RenderRow>> = rows.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

fn custom(rows: Vec<RenderRow>, rules: &[&FilterRule], query: &str) -> Vec<RenderRow> {
    let parsed = parse_query(query).and_then(|q| q.check(rules.len()).map(|_| q));
    let query = match parsed {
        Ok(q) => q,
        Err(e) => {
            warn!(error = %e, "custom filter query rejected; no rows match");
            return Vec::new();
        }
    };

    rows.into_iter()
        .filter(|row| {
            let passes: Vec<bool> = rules
                .iter()
                .map(|rule| rule_passes(rule, row.field(&rule.field_name)))
                .collect();
            query.matches(&passes)
        })
        .collect()
}
