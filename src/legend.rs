//! Legend fields and their synchronization with the configured series.

use serde::{Deserialize, Serialize};

use crate::error::PivotError;
use crate::ir::LegendEntry;
use crate::settings::{is_set, Settings, NULL_CASE};
use crate::style::StyleRegistry;

/// Identity key of the barchart legend field.
pub const BARCHART_KEY: &str = "barchart";

fn null_case() -> String {
    NULL_CASE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendField {
    #[serde(default)]
    pub label: String,
    #[serde(default = "null_case")]
    pub line_style: String,
    #[serde(default = "null_case")]
    pub symbol_style: String,
    #[serde(default = "null_case")]
    pub rect_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
    #[serde(default, rename = "keyField", skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
}

/// Partial legend field; `None` leaves the existing value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegendFieldPatch {
    pub label: Option<String>,
    pub line_style: Option<String>,
    pub symbol_style: Option<String>,
    pub rect_style: Option<String>,
    pub symbol_index: Option<usize>,
    pub line_index: Option<usize>,
    pub key_field: Option<String>,
}

impl LegendFieldPatch {
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn symbol(mut self, index: usize, style: &str) -> Self {
        self.symbol_index = Some(index);
        self.symbol_style = Some(style.to_string());
        self
    }

    pub fn line(mut self, index: usize, style: &str) -> Self {
        self.line_index = Some(index);
        self.line_style = Some(style.to_string());
        self
    }

    pub fn keyed(mut self, key: &str) -> Self {
        self.key_field = Some(key.to_string());
        self
    }

    pub fn rect_style(mut self, style: &str) -> Self {
        self.rect_style = Some(style.to_string());
        self
    }

    fn into_field(self) -> LegendField {
        LegendField {
            label: self.label.unwrap_or_default(),
            line_style: self.line_style.unwrap_or_else(null_case),
            symbol_style: self.symbol_style.unwrap_or_else(null_case),
            rect_style: self.rect_style.unwrap_or_else(null_case),
            symbol_index: self.symbol_index,
            line_index: self.line_index,
            key_field: self.key_field,
        }
    }

    fn apply_to(self, field: &mut LegendField) {
        if let Some(v) = self.label {
            field.label = v;
        }
        if let Some(v) = self.line_style {
            field.line_style = v;
        }
        if let Some(v) = self.symbol_style {
            field.symbol_style = v;
        }
        if let Some(v) = self.rect_style {
            field.rect_style = v;
        }
        if self.symbol_index.is_some() {
            field.symbol_index = self.symbol_index;
        }
        if self.line_index.is_some() {
            field.line_index = self.line_index;
        }
        if self.key_field.is_some() {
            field.key_field = self.key_field;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSettings {
    pub show: bool,
    pub number_columns: usize,
    pub left: f64,
    pub top: f64,
    pub style: String,
    pub fields: Vec<LegendField>,
}

impl Default for LegendSettings {
    fn default() -> Self {
        Self {
            show: true,
            number_columns: 1,
            left: 5.0,
            top: 5.0,
            style: "legend".to_string(),
            fields: Vec::new(),
        }
    }
}

impl LegendSettings {
    /// Locate a field by identity, checking `symbol_index`, then `line_index`, then `keyField`.
    pub fn find(&self, patch: &LegendFieldPatch) -> Option<usize> {
        if let Some(idx) = patch.symbol_index {
            return self.fields.iter().position(|f| f.symbol_index == Some(idx));
        }
        if let Some(idx) = patch.line_index {
            return self.fields.iter().position(|f| f.line_index == Some(idx));
        }
        if let Some(key) = &patch.key_field {
            return self
                .fields
                .iter()
                .position(|f| f.key_field.as_deref() == Some(key.as_str()));
        }
        None
    }

    /// Merge `patch` into the matching field, or append a new one. Returns the field position.
    pub fn add_or_update_field(&mut self, patch: LegendFieldPatch) -> usize {
        match self.find(&patch) {
            Some(idx) => {
                patch.apply_to(&mut self.fields[idx]);
                idx
            }
            None => {
                self.fields.push(patch.into_field());
                self.fields.len() - 1
            }
        }
    }

    /// Shift a field by `offset` positions, clamped to the bounds of the list.
    pub fn move_field(&mut self, index: usize, offset: isize) -> Result<usize, PivotError> {
        if index >= self.fields.len() {
            return Err(PivotError::LegendFieldNotFound { index });
        }
        let last = self.fields.len() as isize - 1;
        let target = (index as isize + offset).clamp(0, last) as usize;
        let field = self.fields.remove(index);
        self.fields.insert(target, field);
        Ok(target)
    }

    pub fn delete_field(&mut self, index: usize) -> Result<LegendField, PivotError> {
        if index >= self.fields.len() {
            return Err(PivotError::LegendFieldNotFound { index });
        }
        Ok(self.fields.remove(index))
    }

    /// Add or refresh a field for every configured series. Existing labels are kept.
    pub fn sync_series(&mut self, settings: &Settings) {
        for (i, point) in settings.datapoint_settings.iter().enumerate() {
            if !is_set(&point.field_name) {
                continue;
            }
            let mut patch = LegendFieldPatch::default().symbol(i, &point.marker_style);
            if self.find(&patch).is_none() {
                patch = patch.label(series_label(&point.header_name, &point.field_name));
            }
            self.add_or_update_field(patch);
        }

        if let Some(line) = settings.dataline() {
            if is_set(&line.low_field_name) && is_set(&line.high_field_name) {
                let mut patch = LegendFieldPatch::default().line(0, &line.marker_style);
                if self.find(&patch).is_none() {
                    patch = patch.label(series_label(&line.header_name, &line.low_field_name));
                }
                self.add_or_update_field(patch);
            }
        }

        let bar = &settings.barchart;
        if is_set(&bar.field_name) {
            let mut patch = LegendFieldPatch::default()
                .keyed(BARCHART_KEY)
                .rect_style(&bar.bar_style);
            if self.find(&patch).is_none() {
                patch = patch.label(series_label(&bar.header_name, &bar.field_name));
            }
            self.add_or_update_field(patch);
        }
    }

    /// Fields with their style names resolved against the registry.
    pub fn entries(&self, styles: &StyleRegistry) -> Vec<LegendEntry> {
        self.fields
            .iter()
            .map(|f| LegendEntry {
                label: f.label.clone(),
                symbol: is_set(&f.symbol_style).then(|| styles.symbol(&f.symbol_style)),
                line: is_set(&f.line_style).then(|| styles.line(&f.line_style)),
                rect: is_set(&f.rect_style).then(|| styles.rectangle(&f.rect_style)),
            })
            .collect()
    }
}

fn series_label<'a>(header: &'a str, field: &'a str) -> &'a str {
    if header.is_empty() {
        field
    } else {
        header
    }
}
