use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::data::{FieldValue, Row};
use crate::interactivity::DetailLink;
use crate::style::{LineStyle, RectangleStyle, Style, StyleKind, SymbolStyle, TextStyle};

// =============================================================================
// Rows threaded through the pipeline
// =============================================================================

/// Visual element of a row that carries its own style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    /// One configured datapoint column.
    Points(usize),
    /// The low/high dataline.
    Bars,
    /// The barchart bar.
    BarchartBar,
    /// One description column.
    Text(usize),
}

impl SeriesKey {
    pub fn style_kind(self) -> StyleKind {
        match self {
            SeriesKey::Points(_) => StyleKind::Symbol,
            SeriesKey::Bars => StyleKind::Line,
            SeriesKey::BarchartBar => StyleKind::Rectangle,
            SeriesKey::Text(_) => StyleKind::Text,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Points(i) => write!(f, "points_{}", i),
            SeriesKey::Bars => f.write_str("bars"),
            SeriesKey::BarchartBar => f.write_str("barchartBar"),
            SeriesKey::Text(i) => write!(f, "text_{}", i),
        }
    }
}

impl Serialize for SeriesKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A source row plus the metadata each pipeline stage derives for it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRow {
    /// Position of the row in the dataset as fetched.
    pub pk: usize,
    /// Zero-based render position, assigned once ordering is final.
    pub index: usize,
    pub row: Row,
    pub styles: BTreeMap<SeriesKey, Style>,
    /// Description text per description column, blanked where merged.
    pub descriptions: Vec<String>,
    pub links: Vec<Option<DetailLink>>,
    /// Set when every compared description column matched the previous row.
    pub merged: bool,
}

impl RenderRow {
    pub fn new(pk: usize, row: Row) -> Self {
        Self {
            pk,
            index: 0,
            row,
            styles: BTreeMap::new(),
            descriptions: Vec::new(),
            links: Vec::new(),
            merged: false,
        }
    }

    pub fn field(&self, name: &str) -> &FieldValue {
        self.row.get(name)
    }

    pub fn style(&self, key: SeriesKey) -> Option<&Style> {
        self.styles.get(&key)
    }
}

// =============================================================================
// Render-ready output
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub symbol: Option<SymbolStyle>,
    pub line: Option<LineStyle>,
    pub rect: Option<RectangleStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    pub text: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReferenceLine {
    pub value: f64,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReferenceRectangle {
    pub x1: f64,
    pub x2: f64,
    pub style: RectangleStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub max_width: Option<f64>,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSpacer {
    pub index: usize,
    pub line: Option<LineStyle>,
    pub extra_space: bool,
}

/// Everything a renderer needs for one data pivot.
#[derive(Debug, Clone, Serialize)]
pub struct RenderData {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<RenderRow>,
    pub legend: Vec<LegendEntry>,
    pub reference_lines: Vec<ResolvedReferenceLine>,
    pub reference_rectangles: Vec<ResolvedReferenceRectangle>,
    pub labels: Vec<ResolvedLabel>,
    pub spacers: Vec<ResolvedSpacer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_key_names() {
        assert_eq!(SeriesKey::Points(0).to_string(), "points_0");
        assert_eq!(SeriesKey::Bars.to_string(), "bars");
        assert_eq!(SeriesKey::BarchartBar.to_string(), "barchartBar");
        assert_eq!(SeriesKey::Text(2).to_string(), "text_2");
    }

    #[test]
    fn test_styles_serialize_by_series_name() {
        let mut row = RenderRow::new(0, Row::new());
        row.styles.insert(SeriesKey::Points(1), StyleKind::Symbol.default_style());
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["styles"]["points_1"]["type"], "symbol");
    }
}
