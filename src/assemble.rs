//! Row inclusion, description text and merging, and the non-row render items.

use crate::interactivity::ExtensionTable;
use crate::ir::{
    ColumnHeader, RenderRow, ResolvedLabel, ResolvedReferenceLine, ResolvedReferenceRectangle,
    ResolvedSpacer,
};
use crate::settings::{is_set, PlotSettings, Settings};

/// A row is plotted only if at least one configured series has a numeric value for it.
pub fn is_includible(row: &RenderRow, settings: &Settings) -> bool {
    let numeric = |field: &str| is_set(field) && row.field(field).is_numeric();

    if numeric(&settings.barchart.field_name) {
        return true;
    }
    if settings
        .datapoint_settings
        .iter()
        .any(|p| numeric(&p.field_name))
    {
        return true;
    }
    settings
        .dataline()
        .is_some_and(|l| numeric(&l.low_field_name) && numeric(&l.high_field_name))
}

pub fn retain_includible(rows: Vec<RenderRow>, settings: &Settings) -> Vec<RenderRow> {
    rows.into_iter()
        .filter(|row| is_includible(row, settings))
        .collect()
}

/// Fill description text and drill-down links, one entry per description column.
pub fn attach_descriptions(rows: &mut [RenderRow], settings: &Settings, extensions: &ExtensionTable) {
    for row in rows.iter_mut() {
        let (texts, links) = settings
            .description_settings
            .iter()
            .map(|d| {
                let text = if is_set(&d.field_name) {
                    row.field(&d.field_name).to_string()
                } else {
                    String::new()
                };
                (text, extensions.link_for(&d.dpe, &row.row))
            })
            .unzip();
        row.descriptions = texts;
        row.links = links;
    }
}

/// Collapse description text repeated from the row above.
///
/// Comparisons use the unmerged text of the predecessor, so runs of identical rows all merge.
pub fn merge_descriptions(rows: &mut [RenderRow], plot: &PlotSettings) {
    if !plot.merge_descriptions {
        return;
    }
    let columns = rows.first().map_or(0, |r| r.descriptions.len());
    if columns == 0 {
        return;
    }
    let until = plot.merge_until.map_or(columns - 1, |u| u.min(columns - 1));

    let mut previous: Option<Vec<String>> = None;
    for row in rows.iter_mut() {
        let original = row.descriptions.clone();
        if let Some(prev) = &previous {
            if plot.merge_aggressive {
                let mut all = true;
                for c in 0..=until {
                    if original[c] != prev[c] {
                        all = false;
                        break;
                    }
                    row.descriptions[c].clear();
                }
                row.merged = all;
            } else if (0..=until).all(|c| original[c] == prev[c]) {
                for text in &mut row.descriptions[..=until] {
                    text.clear();
                }
                row.merged = true;
            }
        }
        previous = Some(original);
    }
}

pub fn column_headers(settings: &Settings) -> Vec<ColumnHeader> {
    settings
        .description_settings
        .iter()
        .map(|d| ColumnHeader {
            text: if d.header_name.is_empty() {
                d.field_name.clone()
            } else {
                d.header_name.clone()
            },
            style: settings.styles.text(&d.header_style),
        })
        .collect()
}

pub fn reference_lines(settings: &Settings) -> Vec<ResolvedReferenceLine> {
    settings
        .reference_lines
        .iter()
        .filter_map(|r| {
            Some(ResolvedReferenceLine {
                value: r.value?,
                style: settings.styles.line(&r.line_style),
            })
        })
        .collect()
}

pub fn reference_rectangles(settings: &Settings) -> Vec<ResolvedReferenceRectangle> {
    settings
        .reference_rectangles
        .iter()
        .filter_map(|r| {
            Some(ResolvedReferenceRectangle {
                x1: r.x1?,
                x2: r.x2?,
                style: settings.styles.rectangle(&r.rectangle_style),
            })
        })
        .collect()
}

pub fn labels(settings: &Settings) -> Vec<ResolvedLabel> {
    settings
        .labels
        .iter()
        .map(|l| ResolvedLabel {
            text: l.text.clone(),
            x: l.x,
            y: l.y,
            max_width: l.max_width,
            style: settings.styles.text(&l.style),
        })
        .collect()
}

/// Spacers without an index or pointing past the last rendered row are dropped.
pub fn spacers(settings: &Settings, row_count: usize) -> Vec<ResolvedSpacer> {
    settings
        .spacers
        .iter()
        .filter_map(|s| {
            let index = s.index.filter(|i| *i < row_count)?;
            Some(ResolvedSpacer {
                index,
                line: s.show_line.then(|| settings.styles.line(&s.line_style)),
                extra_space: s.extra_space,
            })
        })
        .collect()
}
