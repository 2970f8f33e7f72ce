use tracing::debug;

use crate::assemble;
use crate::data::Dataset;
use crate::filter;
use crate::format;
use crate::interactivity::ExtensionTable;
use crate::ir::{RenderData, RenderRow};
use crate::settings::Settings;
use crate::sort;

/// Main entry point: transform a dataset and settings document into renderable data
pub fn apply_transformations(data: &Dataset, settings: &Settings) -> RenderData {
    apply_transformations_with(data, settings, &ExtensionTable::default())
}

/// Same as [`apply_transformations`], with a caller-supplied interactivity table
pub fn apply_transformations_with(
    data: &Dataset,
    settings: &Settings,
    extensions: &ExtensionTable,
) -> RenderData {
    // 1. Filter, drop unplottable rows, automatic sort
    let rows = ordered_rows(data, settings);

    // 2. Manual overrides, then fix render positions
    let mut rows = sort::apply_overrides(rows, &settings.row_overrides);
    for (i, row) in rows.iter_mut().enumerate() {
        row.index = i;
    }

    // 3. Styles: base, conditional, manual
    format::attach_base_styles(&mut rows, settings);
    format::apply_conditional_formatting(&mut rows, settings);
    format::apply_override_styles(&mut rows, settings);

    // 4. Description text
    assemble::attach_descriptions(&mut rows, settings, extensions);
    assemble::merge_descriptions(&mut rows, &settings.plot_settings);

    debug!(source = data.len(), rendered = rows.len(), "data pivot assembled");

    let legend = if settings.legend.show {
        settings.legend.entries(&settings.styles)
    } else {
        Vec::new()
    };

    RenderData {
        headers: assemble::column_headers(settings),
        legend,
        reference_lines: assemble::reference_lines(settings),
        reference_rectangles: assemble::reference_rectangles(settings),
        labels: assemble::labels(settings),
        spacers: assemble::spacers(settings, rows.len()),
        rows,
    }
}

/// Rows after filtering, inclusion and automatic sorting, before manual overrides.
///
/// This is the ordering a row-override table is rebuilt from.
pub fn ordered_rows(data: &Dataset, settings: &Settings) -> Vec<RenderRow> {
    let rows: Vec<RenderRow> = data
        .rows
        .iter()
        .enumerate()
        .map(|(pk, row)| RenderRow::new(pk, row.clone()))
        .collect();

    let plot = &settings.plot_settings;
    let rows = filter::apply(rows, &settings.filters, plot.filter_logic, &plot.filter_query);
    let rows = assemble::retain_includible(rows, settings);
    sort::sort(rows, &settings.sorts)
}
