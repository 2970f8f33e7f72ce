//! Settings editing as a reducer: every action produces a new settings value.

use anyhow::Result;
use tracing::{debug, info};

use crate::data::Dataset;
use crate::error::PivotError;
use crate::ir::RenderData;
use crate::legend::{LegendFieldPatch, LegendSettings};
use crate::settings::{
    BarchartSettings, DatalineSettings, DatapointSettings, DescriptionSettings, FilterLogic,
    FilterRule, Label, PlotSettings, ReferenceLine, ReferenceRectangle, RowOverride, Settings,
    SortRule, Spacer,
};
use crate::style::{Style, StyleKind};
use crate::transform;

/// Whether the manual override table still matches the automatic filter and sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideTableState {
    #[default]
    Clean,
    /// Filters or sorts changed; override positions were cleared and must be rebuilt explicitly.
    RebuildRequired,
}

#[derive(Debug, Clone)]
pub enum Action {
    AddFilter(FilterRule),
    UpdateFilter(usize, FilterRule),
    RemoveFilter(usize),
    SetFilterLogic(FilterLogic),
    SetFilterQuery(String),
    AddSort(SortRule),
    UpdateSort(usize, SortRule),
    RemoveSort(usize),
    CreateStyle(Style),
    UpdateStyle { index: usize, style: Style },
    DeleteStyle { kind: StyleKind, index: usize },
    /// Insert or replace the override for `pk`.
    SetRowOverride(RowOverride),
    RemoveRowOverride { pk: usize },
    RebuildOverrides,
    SetDatapoints(Vec<DatapointSettings>),
    SetDatalines(Vec<DatalineSettings>),
    SetBarchart(BarchartSettings),
    SetDescriptions(Vec<DescriptionSettings>),
    SetReferenceLines(Vec<ReferenceLine>),
    SetReferenceRectangles(Vec<ReferenceRectangle>),
    SetLabels(Vec<Label>),
    SetSpacers(Vec<Spacer>),
    SetPlotSettings(PlotSettings),
    SetLegend(LegendSettings),
    AddOrUpdateLegendField(LegendFieldPatch),
    MoveLegendField { index: usize, offset: isize },
    DeleteLegendField(usize),
    SyncLegend,
}

impl Action {
    /// Actions that change automatic row selection or ordering.
    fn invalidates_overrides(&self, current: &Settings) -> bool {
        match self {
            Action::AddFilter(_)
            | Action::UpdateFilter(..)
            | Action::RemoveFilter(_)
            | Action::SetFilterLogic(_)
            | Action::SetFilterQuery(_)
            | Action::AddSort(_)
            | Action::UpdateSort(..)
            | Action::RemoveSort(_) => true,
            Action::SetPlotSettings(plot) => {
                plot.filter_logic != current.plot_settings.filter_logic
                    || plot.filter_query != current.plot_settings.filter_query
            }
            _ => false,
        }
    }
}

fn out_of_range(section: &'static str, index: usize) -> PivotError {
    PivotError::OutOfRange { section, index }
}

fn replace<T>(list: &mut [T], index: usize, item: T, section: &'static str) -> Result<(), PivotError> {
    let slot = list.get_mut(index).ok_or_else(|| out_of_range(section, index))?;
    *slot = item;
    Ok(())
}

fn remove<T>(list: &mut Vec<T>, index: usize, section: &'static str) -> Result<T, PivotError> {
    if index >= list.len() {
        return Err(out_of_range(section, index));
    }
    Ok(list.remove(index))
}

/// Regenerate the override table from the current automatic ordering.
///
/// Existing include and style choices are kept by primary key; rows no longer selected lose
/// their override.
pub fn rebuild_overrides(data: &Dataset, settings: &Settings) -> Vec<RowOverride> {
    transform::ordered_rows(data, settings)
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut o = settings
                .override_for(row.pk)
                .cloned()
                .unwrap_or_else(|| RowOverride::new(row.pk));
            o.index = Some(i);
            o
        })
        .collect()
}

/// One visualization instance: its dataset, its settings, and the override table state.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dataset: Dataset,
    settings: Settings,
    override_state: OverrideTableState,
}

impl SettingsStore {
    pub fn new(dataset: Dataset, settings: Settings) -> Self {
        Self {
            dataset,
            settings,
            override_state: OverrideTableState::Clean,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn override_state(&self) -> OverrideTableState {
        self.override_state
    }

    /// Replace the dataset after a new fetch. Settings are untouched.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
    }

    pub fn render(&self) -> RenderData {
        transform::apply_transformations(&self.dataset, &self.settings)
    }

    /// Serialized settings document, ready to persist.
    pub fn persist(&self) -> Result<String> {
        self.settings.to_json_string()
    }

    /// Apply `action`. On error the settings are left unchanged.
    pub fn dispatch(&mut self, action: Action) -> Result<(), PivotError> {
        let invalidates = action.invalidates_overrides(&self.settings);
        let rebuild = matches!(action, Action::RebuildOverrides);

        let mut next = self.settings.clone();
        self.reduce(&mut next, action)?;

        if invalidates {
            for o in &mut next.row_overrides {
                o.index = None;
            }
            if !next.row_overrides.is_empty() {
                info!("automatic ordering changed; row overrides need a rebuild");
            }
            self.override_state = OverrideTableState::RebuildRequired;
        }
        if rebuild {
            self.override_state = OverrideTableState::Clean;
        }
        self.settings = next;
        Ok(())
    }

    fn reduce(&self, next: &mut Settings, action: Action) -> Result<(), PivotError> {
        debug!(?action, "dispatch");
        match action {
            Action::AddFilter(rule) => next.filters.push(rule),
            Action::UpdateFilter(i, rule) => replace(&mut next.filters, i, rule, "filter")?,
            Action::RemoveFilter(i) => {
                remove(&mut next.filters, i, "filter")?;
            }
            Action::SetFilterLogic(logic) => next.plot_settings.filter_logic = logic,
            Action::SetFilterQuery(query) => next.plot_settings.filter_query = query,
            Action::AddSort(rule) => next.sorts.push(rule),
            Action::UpdateSort(i, rule) => replace(&mut next.sorts, i, rule, "sort")?,
            Action::RemoveSort(i) => {
                remove(&mut next.sorts, i, "sort")?;
            }
            Action::CreateStyle(style) => {
                next.styles.insert(style)?;
            }
            Action::UpdateStyle { index, style } => next.styles.update(index, style)?,
            Action::DeleteStyle { kind, index } => {
                next.styles.remove(kind, index)?;
            }
            Action::SetRowOverride(o) => match next.row_overrides.iter_mut().find(|x| x.pk == o.pk) {
                Some(existing) => *existing = o,
                None => next.row_overrides.push(o),
            },
            Action::RemoveRowOverride { pk } => {
                let pos = next
                    .row_overrides
                    .iter()
                    .position(|o| o.pk == pk)
                    .ok_or(PivotError::OverrideNotFound { pk })?;
                next.row_overrides.remove(pos);
            }
            Action::RebuildOverrides => {
                next.row_overrides = rebuild_overrides(&self.dataset, next);
            }
            Action::SetDatapoints(v) => next.datapoint_settings = v,
            Action::SetDatalines(v) => next.dataline_settings = v,
            Action::SetBarchart(v) => next.barchart = v,
            Action::SetDescriptions(v) => next.description_settings = v,
            Action::SetReferenceLines(v) => next.reference_lines = v,
            Action::SetReferenceRectangles(v) => next.reference_rectangles = v,
            Action::SetLabels(v) => next.labels = v,
            Action::SetSpacers(v) => next.spacers = v,
            Action::SetPlotSettings(v) => next.plot_settings = v,
            Action::SetLegend(v) => next.legend = v,
            Action::AddOrUpdateLegendField(patch) => {
                next.legend.add_or_update_field(patch);
            }
            Action::MoveLegendField { index, offset } => {
                next.legend.move_field(index, offset)?;
            }
            Action::DeleteLegendField(index) => {
                next.legend.delete_field(index)?;
            }
            Action::SyncLegend => {
                let snapshot = next.clone();
                next.legend.sync_series(&snapshot);
            }
        }
        Ok(())
    }
}
