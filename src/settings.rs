//! The persisted settings document.
//!
//! Every section defaults, so a partial or empty JSON object is a usable document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::legend::LegendSettings;
use crate::style::StyleRegistry;

/// Sentinel for "no selection" in every enumerable field or style name.
pub const NULL_CASE: &str = "---";

fn null_case() -> String {
    NULL_CASE.to_string()
}

pub fn is_set(name: &str) -> bool {
    !name.is_empty() && name != NULL_CASE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    Gt,
    Gte,
    Lt,
    Lte,
    Exact,
    Contains,
    NotContains,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Filter rule values come from a form and may be stored as text or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
    Null,
}

impl Default for RuleValue {
    fn default() -> Self {
        RuleValue::Text(String::new())
    }
}

impl RuleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) => Some(*n),
            RuleValue::Text(s) => s.trim().parse::<f64>().ok(),
            RuleValue::Null => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            RuleValue::Number(n) => crate::data::format_number(*n),
            RuleValue::Text(s) => s.clone(),
            RuleValue::Null => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default = "null_case")]
    pub field_name: String,
    #[serde(default)]
    pub quantifier: Quantifier,
    #[serde(default)]
    pub value: RuleValue,
}

impl FilterRule {
    pub fn new(field_name: &str, quantifier: Quantifier, value: RuleValue) -> Self {
        Self {
            field_name: field_name.to_string(),
            quantifier,
            value,
        }
    }

    /// Inert rules (unset field or unknown quantifier) are ignored by the filter engine.
    pub fn is_active(&self) -> bool {
        is_set(&self.field_name) && self.quantifier != Quantifier::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortRule {
    #[serde(default = "null_case")]
    pub field_name: String,
    #[serde(default)]
    pub order: SortOrder,
    /// Ordered tokens used when `order` is custom.
    #[serde(default)]
    pub custom: Vec<String>,
}

impl SortRule {
    pub fn new(field_name: &str, order: SortOrder) -> Self {
        Self {
            field_name: field_name.to_string(),
            order,
            custom: Vec::new(),
        }
    }

    pub fn custom(field_name: &str, tokens: &[&str]) -> Self {
        Self {
            field_name: field_name.to_string(),
            order: SortOrder::Custom,
            custom: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Manual, primary-key-addressed correction applied after filter and sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOverride {
    pub pk: usize,
    #[serde(default = "default_true")]
    pub include: bool,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default = "null_case")]
    pub text_style: String,
    #[serde(default = "null_case")]
    pub line_style: String,
    #[serde(default = "null_case")]
    pub symbol_style: String,
}

fn default_true() -> bool {
    true
}

impl RowOverride {
    pub fn new(pk: usize) -> Self {
        Self {
            pk,
            include: true,
            index: None,
            text_style: null_case(),
            line_style: null_case(),
            symbol_style: null_case(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionType {
    PointSize,
    PointColor,
    DiscreteStyle,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteStyle {
    #[serde(default)]
    pub key: String,
    #[serde(default = "null_case")]
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormat {
    #[serde(default = "null_case")]
    pub field_name: String,
    #[serde(default)]
    pub condition_type: ConditionType,
    #[serde(default = "default_min_size")]
    pub min_size: f64,
    #[serde(default = "default_max_size")]
    pub max_size: f64,
    #[serde(default = "default_min_color")]
    pub min_color: String,
    #[serde(default = "default_max_color")]
    pub max_color: String,
    #[serde(default)]
    pub discrete_styles: Vec<DiscreteStyle>,
}

fn default_min_size() -> f64 {
    50.0
}

fn default_max_size() -> f64 {
    150.0
}

fn default_min_color() -> String {
    "#800000".to_string()
}

fn default_max_color() -> String {
    "#ffffff".to_string()
}

impl ConditionalFormat {
    pub fn new(field_name: &str, condition_type: ConditionType) -> Self {
        Self {
            field_name: field_name.to_string(),
            condition_type,
            min_size: default_min_size(),
            max_size: default_max_size(),
            min_color: default_min_color(),
            max_color: default_max_color(),
            discrete_styles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatapointSettings {
    pub field_name: String,
    pub header_name: String,
    pub marker_style: String,
    pub dpe: String,
    pub conditional_formatting: Vec<ConditionalFormat>,
}

impl Default for DatapointSettings {
    fn default() -> Self {
        Self {
            field_name: null_case(),
            header_name: String::new(),
            marker_style: "base".to_string(),
            dpe: null_case(),
            conditional_formatting: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatalineSettings {
    pub low_field_name: String,
    pub high_field_name: String,
    pub header_name: String,
    pub marker_style: String,
    pub conditional_formatting: Vec<ConditionalFormat>,
}

impl Default for DatalineSettings {
    fn default() -> Self {
        Self {
            low_field_name: null_case(),
            high_field_name: null_case(),
            header_name: String::new(),
            marker_style: "base".to_string(),
            conditional_formatting: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarchartSettings {
    pub field_name: String,
    pub error_low_field_name: String,
    pub error_high_field_name: String,
    pub header_name: String,
    pub bar_style: String,
    pub error_marker_style: String,
    pub error_show_tails: bool,
    pub dpe: String,
    pub conditional_formatting: Vec<ConditionalFormat>,
}

impl Default for BarchartSettings {
    fn default() -> Self {
        Self {
            field_name: null_case(),
            error_low_field_name: null_case(),
            error_high_field_name: null_case(),
            header_name: String::new(),
            bar_style: "base".to_string(),
            error_marker_style: "base".to_string(),
            error_show_tails: false,
            dpe: null_case(),
            conditional_formatting: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionSettings {
    pub field_name: String,
    pub header_name: String,
    pub header_style: String,
    pub text_style: String,
    pub max_width: Option<f64>,
    pub dpe: String,
}

impl Default for DescriptionSettings {
    fn default() -> Self {
        Self {
            field_name: null_case(),
            header_name: String::new(),
            header_style: "header".to_string(),
            text_style: "base".to_string(),
            max_width: None,
            dpe: null_case(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default = "default_reference_line_style")]
    pub line_style: String,
}

fn default_reference_line_style() -> String {
    "reference line".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRectangle {
    #[serde(default)]
    pub x1: Option<f64>,
    #[serde(default)]
    pub x2: Option<f64>,
    #[serde(default = "default_rectangle_style")]
    pub rectangle_style: String,
}

fn default_rectangle_style() -> String {
    "base".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_label_style")]
    pub style: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub max_width: Option<f64>,
}

fn default_label_style() -> String {
    "title".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacer {
    /// Render index of the row the spacer follows; unset spacers are not drawn.
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default = "default_true")]
    pub show_line: bool,
    #[serde(default = "default_spacer_line_style")]
    pub line_style: String,
    #[serde(default)]
    pub extra_space: bool,
}

fn default_spacer_line_style() -> String {
    "reference line".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 25.0,
            bottom: 40.0,
            left: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub title: String,
    pub axis_label: String,
    pub plot_width: f64,
    pub minimum_row_height: f64,
    pub logscale: bool,
    /// Comma-separated axis limits, e.g. `"0,100"`; empty means data-driven.
    pub domain: String,
    pub padding: Padding,
    pub text_background: bool,
    pub text_background_color: String,
    pub draw_borders: bool,
    pub filter_logic: FilterLogic,
    pub filter_query: String,
    pub merge_descriptions: bool,
    pub merge_aggressive: bool,
    /// Last description column (zero-based, inclusive) considered for merging.
    pub merge_until: Option<usize>,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            axis_label: String::new(),
            plot_width: 400.0,
            minimum_row_height: 15.0,
            logscale: false,
            domain: String::new(),
            padding: Padding::default(),
            text_background: true,
            text_background_color: "#eeeeee".to_string(),
            draw_borders: true,
            filter_logic: FilterLogic::And,
            filter_query: String::new(),
            merge_descriptions: false,
            merge_aggressive: false,
            merge_until: None,
        }
    }
}

impl PlotSettings {
    /// Parse the `domain` limits, if both ends are numeric.
    pub fn domain_limits(&self) -> Option<(f64, f64)> {
        let (lo, hi) = self.domain.split_once(',')?;
        let lo = lo.trim().parse::<f64>().ok()?;
        let hi = hi.trim().parse::<f64>().ok()?;
        Some((lo, hi))
    }
}

/// Root settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub styles: StyleRegistry,
    pub filters: Vec<FilterRule>,
    pub sorts: Vec<SortRule>,
    pub row_overrides: Vec<RowOverride>,
    pub datapoint_settings: Vec<DatapointSettings>,
    pub dataline_settings: Vec<DatalineSettings>,
    pub barchart: BarchartSettings,
    pub description_settings: Vec<DescriptionSettings>,
    pub reference_lines: Vec<ReferenceLine>,
    pub reference_rectangles: Vec<ReferenceRectangle>,
    pub labels: Vec<Label>,
    pub spacers: Vec<Spacer>,
    pub legend: LegendSettings,
    pub plot_settings: PlotSettings,
}

impl Settings {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Settings document is not valid")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize settings document")
    }

    /// The drawn dataline; only the first configured entry is rendered.
    pub fn dataline(&self) -> Option<&DatalineSettings> {
        self.dataline_settings.first()
    }

    pub fn override_for(&self, pk: usize) -> Option<&RowOverride> {
        self.row_overrides.iter().find(|o| o.pk == pk)
    }
}
