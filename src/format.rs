//! Per-row style resolution: base series styles, conditional formatting, and manual overrides.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::ir::{RenderRow, SeriesKey};
use crate::scale::{extent, LinearColorScale, PowScale, Rgb};
use crate::settings::{is_set, ConditionType, ConditionalFormat, Settings};
use crate::style::{Style, StyleKind, StyleRegistry};

/// Series that can carry conditional formatting, with their rules.
fn formatted_series(settings: &Settings) -> Vec<(SeriesKey, &[ConditionalFormat])> {
    let mut series = Vec::new();
    for (i, point) in settings.datapoint_settings.iter().enumerate() {
        if is_set(&point.field_name) {
            series.push((SeriesKey::Points(i), point.conditional_formatting.as_slice()));
        }
    }
    if let Some(line) = settings.dataline() {
        if is_set(&line.low_field_name) && is_set(&line.high_field_name) {
            series.push((SeriesKey::Bars, line.conditional_formatting.as_slice()));
        }
    }
    if is_set(&settings.barchart.field_name) {
        series.push((
            SeriesKey::BarchartBar,
            settings.barchart.conditional_formatting.as_slice(),
        ));
    }
    series
}

/// Attach the configured style of every series to every row.
pub fn attach_base_styles(rows: &mut [RenderRow], settings: &Settings) {
    let styles = &settings.styles;
    let mut base: Vec<(SeriesKey, Style)> = Vec::new();
    for (i, point) in settings.datapoint_settings.iter().enumerate() {
        if is_set(&point.field_name) {
            base.push((SeriesKey::Points(i), Style::Symbol(styles.symbol(&point.marker_style))));
        }
    }
    if let Some(line) = settings.dataline() {
        if is_set(&line.low_field_name) && is_set(&line.high_field_name) {
            base.push((SeriesKey::Bars, Style::Line(styles.line(&line.marker_style))));
        }
    }
    if is_set(&settings.barchart.field_name) {
        base.push((
            SeriesKey::BarchartBar,
            Style::Rectangle(styles.rectangle(&settings.barchart.bar_style)),
        ));
    }
    for (i, desc) in settings.description_settings.iter().enumerate() {
        if is_set(&desc.field_name) {
            base.push((SeriesKey::Text(i), Style::Text(styles.text(&desc.text_style))));
        }
    }

    for row in rows.iter_mut() {
        row.styles = base.iter().cloned().collect();
    }
}

/// Apply every series' conditional-formatting rules, in order.
///
/// Numeric domains come from `rows` as given, so filtering must already have happened.
pub fn apply_conditional_formatting(rows: &mut [RenderRow], settings: &Settings) {
    for (key, rules) in formatted_series(settings) {
        for rule in rules {
            apply_rule(rows, key, rule, &settings.styles);
        }
    }
}

fn apply_rule(rows: &mut [RenderRow], key: SeriesKey, rule: &ConditionalFormat, styles: &StyleRegistry) {
    if !is_set(&rule.field_name) {
        return;
    }
    match rule.condition_type {
        ConditionType::DiscreteStyle => discrete_style(rows, key, rule, styles),
        ConditionType::PointSize => point_size(rows, key, rule),
        ConditionType::PointColor => point_color(rows, key, rule),
        ConditionType::Unknown => {
            warn!(series = %key, field = %rule.field_name, "skipping unrecognized conditional format");
        }
    }
}

fn discrete_style(rows: &mut [RenderRow], key: SeriesKey, rule: &ConditionalFormat, styles: &StyleRegistry) {
    let table: HashMap<&str, &str> = rule
        .discrete_styles
        .iter()
        .filter(|d| is_set(&d.style))
        .map(|d| (d.key.as_str(), d.style.as_str()))
        .collect();

    let kind = key.style_kind();
    for row in rows.iter_mut() {
        let value = row.field(&rule.field_name).to_string();
        if let Some(name) = table.get(value.as_str()) {
            row.styles.insert(key, styles.resolve(kind, name));
        }
    }
}

fn numeric_domain(rows: &[RenderRow], field: &str) -> Option<(f64, f64)> {
    extent(rows.iter().map(|r| r.field(field).as_number()))
}

fn point_size(rows: &mut [RenderRow], key: SeriesKey, rule: &ConditionalFormat) {
    let Some(domain) = numeric_domain(rows, &rule.field_name) else {
        return;
    };
    let scale = PowScale::sqrt(domain, (rule.min_size, rule.max_size));
    for row in rows.iter_mut() {
        let Some(v) = row.field(&rule.field_name).as_number() else {
            continue;
        };
        if let Some(style) = row.styles.get(&key) {
            let sized = with_size(style.clone(), scale.map(v));
            row.styles.insert(key, sized);
        }
    }
}

fn point_color(rows: &mut [RenderRow], key: SeriesKey, rule: &ConditionalFormat) {
    let colors = rule
        .min_color
        .parse::<Rgb>()
        .and_then(|lo| rule.max_color.parse::<Rgb>().map(|hi| (lo, hi)));
    let range = match colors {
        Ok(range) => range,
        Err(e) => {
            warn!(series = %key, error = %e, "skipping color format");
            return;
        }
    };
    let Some(domain) = numeric_domain(rows, &rule.field_name) else {
        return;
    };
    let scale = LinearColorScale::new(domain, range);
    for row in rows.iter_mut() {
        let Some(v) = row.field(&rule.field_name).as_number() else {
            continue;
        };
        if let Some(style) = row.styles.get(&key) {
            let colored = with_color(style.clone(), &scale.map(v).to_string());
            row.styles.insert(key, colored);
        }
    }
}

fn with_size(style: Style, size: f64) -> Style {
    match style {
        Style::Symbol(mut s) => {
            s.size = size;
            Style::Symbol(s)
        }
        Style::Line(mut s) => {
            s.stroke_width = size;
            Style::Line(s)
        }
        other => {
            debug!(kind = %other.kind(), "size formatting does not apply");
            other
        }
    }
}

fn with_color(style: Style, color: &str) -> Style {
    match style {
        Style::Symbol(mut s) => {
            s.fill = color.to_string();
            Style::Symbol(s)
        }
        Style::Line(mut s) => {
            s.stroke = color.to_string();
            Style::Line(s)
        }
        Style::Rectangle(mut s) => {
            s.fill = color.to_string();
            Style::Rectangle(s)
        }
        Style::Text(mut s) => {
            s.fill = color.to_string();
            Style::Text(s)
        }
    }
}

/// Manual per-row styles win over base styles and conditional formatting.
pub fn apply_override_styles(rows: &mut [RenderRow], settings: &Settings) {
    if settings.row_overrides.is_empty() {
        return;
    }
    let styles = &settings.styles;
    for row in rows.iter_mut() {
        let Some(o) = settings.override_for(row.pk) else {
            continue;
        };
        for (key, style) in row.styles.iter_mut() {
            let name = match key.style_kind() {
                StyleKind::Symbol => &o.symbol_style,
                StyleKind::Line => &o.line_style,
                StyleKind::Text => &o.text_style,
                StyleKind::Rectangle => continue,
            };
            if is_set(name) {
                *style = styles.resolve(key.style_kind(), name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::settings::{DatalineSettings, DatapointSettings, DiscreteStyle, RowOverride};

    fn settings_with_rule(rule: ConditionalFormat) -> Settings {
        let mut settings = Settings::default();
        settings.datapoint_settings.push(DatapointSettings {
            field_name: "n".into(),
            marker_style: "base".into(),
            conditional_formatting: vec![rule],
            ..DatapointSettings::default()
        });
        settings
    }

    fn rows(values: &[&str]) -> Vec<RenderRow> {
        values
            .iter()
            .enumerate()
            .map(|(pk, v)| RenderRow::new(pk, Row::new().with("n", *v)))
            .collect()
    }

    fn symbol(row: &RenderRow) -> &crate::style::SymbolStyle {
        match row.style(SeriesKey::Points(0)) {
            Some(Style::Symbol(s)) => s,
            other => panic!("expected symbol style, got {:?}", other),
        }
    }

    fn run(rows: &mut [RenderRow], settings: &Settings) {
        attach_base_styles(rows, settings);
        apply_conditional_formatting(rows, settings);
    }

    #[test]
    fn test_discrete_style() {
        let mut rule = ConditionalFormat::new("n", ConditionType::DiscreteStyle);
        rule.discrete_styles = vec![
            DiscreteStyle { key: "X".into(), style: "red".into() },
            DiscreteStyle { key: "Z".into(), style: crate::settings::NULL_CASE.into() },
        ];
        let settings = settings_with_rule(rule);
        let mut rows = rows(&["X", "Y", "Z"]);
        run(&mut rows, &settings);

        assert_eq!(symbol(&rows[0]), &settings.styles.symbol("red"));
        assert_eq!(symbol(&rows[1]).name, "base");
        assert_eq!(symbol(&rows[2]).name, "base");
    }

    #[test]
    fn test_point_size() {
        let mut rule = ConditionalFormat::new("n", ConditionType::PointSize);
        rule.min_size = 10.0;
        rule.max_size = 100.0;
        let settings = settings_with_rule(rule);
        let mut rows = rows(&["0", "50", "100", "NR"]);
        run(&mut rows, &settings);

        let sizes: Vec<f64> = rows.iter().map(|r| symbol(r).size).collect();
        assert_eq!(sizes[0], 10.0);
        assert_eq!(sizes[2], 100.0);
        assert!(sizes[0] <= sizes[1] && sizes[1] <= sizes[2]);
        // non-numeric rows keep the untouched base style
        assert_eq!(symbol(&rows[3]), &settings.styles.symbol("base"));
    }

    #[test]
    fn test_point_size_leaves_registry_untouched() {
        let rule = ConditionalFormat::new("n", ConditionType::PointSize);
        let settings = settings_with_rule(rule);
        let before = settings.styles.symbol("base");
        let mut rows = rows(&["1", "9"]);
        run(&mut rows, &settings);
        assert_eq!(settings.styles.symbol("base"), before);
        assert_ne!(symbol(&rows[0]).size, symbol(&rows[1]).size);
    }

    #[test]
    fn test_point_color() {
        let mut rule = ConditionalFormat::new("n", ConditionType::PointColor);
        rule.min_color = "#000000".into();
        rule.max_color = "#ffffff".into();
        let settings = settings_with_rule(rule);
        let mut rows = rows(&["0", "5", "10"]);
        run(&mut rows, &settings);
        let fills: Vec<&str> = rows.iter().map(|r| symbol(r).fill.as_str()).collect();
        assert_eq!(fills, vec!["#000000", "#808080", "#ffffff"]);
    }

    #[test]
    fn test_bad_color_and_unknown_type_are_noops() {
        let mut rule = ConditionalFormat::new("n", ConditionType::PointColor);
        rule.min_color = "blue-ish".into();
        let mut settings = settings_with_rule(rule);
        settings.datapoint_settings[0]
            .conditional_formatting
            .push(ConditionalFormat::new("n", ConditionType::Unknown));
        let mut rows = rows(&["0", "10"]);
        run(&mut rows, &settings);
        assert_eq!(symbol(&rows[0]), &settings.styles.symbol("base"));
    }

    #[test]
    fn test_line_series_color() {
        let mut settings = Settings::default();
        let mut rule = ConditionalFormat::new("n", ConditionType::PointColor);
        rule.min_color = "#000".into();
        rule.max_color = "#fff".into();
        settings.dataline_settings.push(DatalineSettings {
            low_field_name: "lo".into(),
            high_field_name: "hi".into(),
            conditional_formatting: vec![rule],
            ..DatalineSettings::default()
        });
        let mut rows = rows(&["0", "10"]);
        run(&mut rows, &settings);
        match rows[1].style(SeriesKey::Bars) {
            Some(Style::Line(l)) => assert_eq!(l.stroke, "#ffffff"),
            other => panic!("expected line style, got {:?}", other),
        }
    }

    #[test]
    fn test_override_styles_win() {
        let mut rule = ConditionalFormat::new("n", ConditionType::DiscreteStyle);
        rule.discrete_styles = vec![DiscreteStyle { key: "X".into(), style: "red".into() }];
        let mut settings = settings_with_rule(rule);
        settings.row_overrides.push(RowOverride {
            symbol_style: "blue".into(),
            ..RowOverride::new(0)
        });
        let mut rows = rows(&["X", "X"]);
        run(&mut rows, &settings);
        apply_override_styles(&mut rows, &settings);
        assert_eq!(symbol(&rows[0]).name, "blue");
        assert_eq!(symbol(&rows[1]).name, "red");
    }
}
