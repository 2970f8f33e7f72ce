//! Multi-key natural sorting and manual row-override ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::ir::RenderRow;
use crate::settings::{is_set, RowOverride, SortOrder, SortRule};

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Split into alternating runs of numeric (digits and `.`) and non-numeric characters.
fn chunks(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut class: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let numeric = is_numeric_char(c);
        if class.is_some_and(|prev| prev != numeric) {
            out.push(&s[start..i]);
            start = i;
        }
        class = Some(numeric);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Comparison key for one chunk. Numbers sort before text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Chunk<'a> {
    Num(f64),
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    /// Runs like `1.2.3` that are not a valid number compare as text.
    fn of(chunk: &'a str) -> Self {
        // text runs such as "inf" or "NaN" also parse as f64
        if !chunk.starts_with(is_numeric_char) {
            return Chunk::Text(chunk);
        }
        match chunk.parse::<f64>() {
            Ok(n) => Chunk::Num(n),
            Err(_) => Chunk::Text(chunk),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Num(a), Chunk::Num(b)) => a.total_cmp(b),
            (Chunk::Num(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Num(_)) => Ordering::Greater,
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
        }
    }
}

/// Alphanumeric ("natural") comparison: `a2` sorts before `a10`.
///
/// Chunk keys are compared lexicographically, so this is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ka = chunks(a).into_iter().map(Chunk::of);
    let mut kb = chunks(b).into_iter().map(Chunk::of);
    loop {
        match (ka.next(), kb.next()) {
            (Some(x), Some(y)) => match x.compare(&y) {
                Ordering::Equal => continue,
                ord => return ord,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

fn custom_position(tokens: &[String], value: &str) -> isize {
    tokens
        .iter()
        .position(|t| t == value)
        .map_or(-1, |i| i as isize)
}

/// Compare two rows: the first rule that orders the stringified values decides.
pub fn compare_rows(a: &RenderRow, b: &RenderRow, rules: &[SortRule]) -> Ordering {
    for rule in rules.iter().filter(|r| is_set(&r.field_name)) {
        let av = a.field(&rule.field_name).to_string();
        let bv = b.field(&rule.field_name).to_string();
        if av == bv {
            continue;
        }
        let ord = match rule.order {
            SortOrder::Asc => natural_cmp(&av, &bv),
            SortOrder::Desc => natural_cmp(&bv, &av),
            SortOrder::Custom => {
                custom_position(&rule.custom, &av).cmp(&custom_position(&rule.custom, &bv))
            }
        };
        // values like "1.0" and "1" tie; later rules decide
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort.
pub fn sort(mut rows: Vec<RenderRow>, rules: &[SortRule]) -> Vec<RenderRow> {
    if !rules.is_empty() {
        rows.sort_by(|a, b| compare_rows(a, b, rules));
    }
    rows
}

/// Apply manual overrides after automatic ordering.
///
/// Rows with `include == false` are dropped. Rows whose override carries an `index` are slotted
/// at that position (clamped, ascending by index); everything else keeps its relative order.
pub fn apply_overrides(rows: Vec<RenderRow>, overrides: &[RowOverride]) -> Vec<RenderRow> {
    if overrides.is_empty() {
        return rows;
    }
    let by_pk: HashMap<usize, &RowOverride> = overrides.iter().map(|o| (o.pk, o)).collect();

    let mut placed: Vec<(usize, RenderRow)> = Vec::new();
    let mut rest: Vec<RenderRow> = Vec::with_capacity(rows.len());
    let mut excluded = 0;
    for row in rows {
        match by_pk.get(&row.pk) {
            Some(o) if !o.include => excluded += 1,
            Some(RowOverride { index: Some(idx), .. }) => placed.push((*idx, row)),
            _ => rest.push(row),
        }
    }

    placed.sort_by_key(|(idx, _)| *idx);
    let moved = placed.len();
    for (idx, row) in placed {
        let at = idx.min(rest.len());
        rest.insert(at, row);
    }
    debug!(excluded, moved, "applied row overrides");
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldValue, Row};

    fn rows_of(values: Vec<FieldValue>) -> Vec<RenderRow> {
        values
            .into_iter()
            .enumerate()
            .map(|(pk, v)| {
                let mut row = Row::new();
                row.insert("a", v);
                RenderRow::new(pk, row)
            })
            .collect()
    }

    fn values(rows: &[RenderRow]) -> Vec<String> {
        rows.iter().map(|r| r.field("a").to_string()).collect()
    }

    fn pks(rows: &[RenderRow]) -> Vec<usize> {
        rows.iter().map(|r| r.pk).collect()
    }

    #[test]
    fn test_chunks() {
        assert_eq!(chunks("abc12.5def3"), vec!["abc", "12.5", "def", "3"]);
        assert!(chunks("").is_empty());
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("b1", "a9"), Ordering::Greater);
        assert_eq!(natural_cmp("1.5", "1.25"), Ordering::Greater);
        assert_eq!(natural_cmp("rat", "rat 2"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_dotted_runs() {
        assert_eq!(natural_cmp("1.9", "1.10"), Ordering::Greater);
        // not a number, so it sorts after every numeric run
        assert_eq!(natural_cmp("1.2.3", "1.9"), Ordering::Greater);
        assert_eq!(natural_cmp("1.2.3", "1.10"), Ordering::Greater);
        assert_eq!(natural_cmp("inf", "5"), Ordering::Greater);
        assert_eq!(natural_cmp("1.0", "1"), Ordering::Equal);
    }

    #[test]
    fn test_sort_version_like_values() {
        let raw = [
            ".5", ".5.1.2", "91.2", "1.2.5", "a", "10", "0.5", "1.", "210", "1.20", "101",
            ".0a", "1.2", ".1.1", "1.2", "1.2", ".5", ".01.2", "1.221.", "1.0", "910",
        ];
        let rows = rows_of(raw.iter().map(|v| (*v).into()).collect());
        let sorted = values(&sort(rows, &[SortRule::new("a", SortOrder::Asc)]));
        assert_eq!(sorted.len(), raw.len());
        for pair in sorted.windows(2) {
            assert_ne!(natural_cmp(&pair[0], &pair[1]), Ordering::Greater, "{:?}", pair);
        }
    }

    #[test]
    fn test_equal_values_fall_through_to_next_rule() {
        let mk = |pk: usize, a: &str, b: f64| RenderRow::new(pk, Row::new().with("a", a).with("b", b));
        let rows = vec![mk(0, "1.0", 3.0), mk(1, "1", 1.0), mk(2, "1.0", 2.0)];
        let sorted = sort(
            rows,
            &[SortRule::new("a", SortOrder::Asc), SortRule::new("b", SortOrder::Asc)],
        );
        assert_eq!(pks(&sorted), vec![1, 2, 0]);
    }

    #[test]
    fn test_mixed_numeric_natural_order() {
        let rows = rows_of(vec![1.0.into(), "10".into(), "2".into()]);
        let sorted = sort(rows, &[SortRule::new("a", SortOrder::Asc)]);
        assert_eq!(values(&sorted), vec!["1", "2", "10"]);
    }

    #[test]
    fn test_desc() {
        let rows = rows_of(vec!["a1".into(), "a3".into(), "a2".into()]);
        let sorted = sort(rows, &[SortRule::new("a", SortOrder::Desc)]);
        assert_eq!(values(&sorted), vec!["a3", "a2", "a1"]);
    }

    #[test]
    fn test_custom_order_unlisted_first() {
        let rows = rows_of(vec!["high".into(), "low".into(), "other".into(), "mid".into()]);
        let sorted = sort(rows, &[SortRule::custom("a", &["low", "mid", "high"])]);
        assert_eq!(values(&sorted), vec!["other", "low", "mid", "high"]);
    }

    #[test]
    fn test_multi_key_and_stability() {
        let mk = |pk: usize, g: &str, v: f64| RenderRow::new(pk, Row::new().with("g", g).with("v", v));
        let rows = vec![mk(0, "b", 2.0), mk(1, "a", 2.0), mk(2, "b", 1.0), mk(3, "a", 2.0)];
        let sorted = sort(
            rows,
            &[SortRule::new("g", SortOrder::Asc), SortRule::new("v", SortOrder::Asc)],
        );
        assert_eq!(pks(&sorted), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_no_rules_keeps_order() {
        let rows = rows_of(vec!["c".into(), "a".into(), "b".into()]);
        assert_eq!(pks(&sort(rows, &[])), vec![0, 1, 2]);
    }

    #[test]
    fn test_override_index_moves_row_first() {
        let rows = rows_of(vec!["p1".into(), "p2".into(), "p3".into()]);
        let mut o = RowOverride::new(1);
        o.index = Some(0);
        let out = apply_overrides(rows, &[o]);
        assert_eq!(pks(&out), vec![1, 0, 2]);
    }

    #[test]
    fn test_override_exclude_and_clamp() {
        let rows = rows_of(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        let mut drop = RowOverride::new(2);
        drop.include = false;
        let mut far = RowOverride::new(0);
        far.index = Some(99);
        let out = apply_overrides(rows, &[drop, far]);
        assert_eq!(pks(&out), vec![1, 3, 0]);
    }

    #[test]
    fn test_full_manual_order() {
        let rows = rows_of(vec!["a".into(), "b".into(), "c".into()]);
        let overrides: Vec<RowOverride> = [(0, 2), (1, 0), (2, 1)]
            .iter()
            .map(|(pk, idx)| RowOverride { index: Some(*idx), ..RowOverride::new(*pk) })
            .collect();
        assert_eq!(pks(&apply_overrides(rows, &overrides)), vec![1, 2, 0]);
    }
}
