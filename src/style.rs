//! Named style catalog.
//!
//! Styles are referenced everywhere else by name only. An unresolved name is not an error: it
//! falls back to the hard-coded default of its kind.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StyleError;
use crate::settings::NULL_CASE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Symbol,
    Line,
    Text,
    Rectangle,
}

impl StyleKind {
    pub const ALL: [StyleKind; 4] = [
        StyleKind::Symbol,
        StyleKind::Line,
        StyleKind::Text,
        StyleKind::Rectangle,
    ];

    /// Fallback used whenever a name does not resolve.
    pub fn default_style(self) -> Style {
        match self {
            StyleKind::Symbol => Style::Symbol(SymbolStyle::default()),
            StyleKind::Line => Style::Line(LineStyle::default()),
            StyleKind::Text => Style::Text(TextStyle::default()),
            StyleKind::Rectangle => Style::Rectangle(RectangleStyle::default()),
        }
    }

    fn slot(self) -> usize {
        match self {
            StyleKind::Symbol => 0,
            StyleKind::Line => 1,
            StyleKind::Text => 2,
            StyleKind::Rectangle => 3,
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StyleKind::Symbol => "symbol",
            StyleKind::Line => "line",
            StyleKind::Text => "text",
            StyleKind::Rectangle => "rectangle",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SymbolStyle {
    pub name: String,
    pub symbol: String,
    /// Symbol area in square pixels.
    pub size: f64,
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
            symbol: "circle".to_string(),
            size: 130.0,
            fill: "#000000".to_string(),
            fill_opacity: 0.8,
            stroke: "#000000".to_string(),
            stroke_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LineStyle {
    pub name: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
    pub stroke_dasharray: String,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
            stroke: "#708090".to_string(),
            stroke_width: 2.0,
            stroke_opacity: 0.9,
            stroke_dasharray: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TextStyle {
    pub name: String,
    pub font_size: String,
    pub font_weight: String,
    pub text_anchor: String,
    pub rotate: f64,
    pub fill: String,
    pub fill_opacity: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
            font_size: "12px".to_string(),
            font_weight: "normal".to_string(),
            text_anchor: "start".to_string(),
            rotate: 0.0,
            fill: "#000000".to_string(),
            fill_opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RectangleStyle {
    pub name: String,
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
    /// `solid`, `stripes`, `reverse_stripes`, `vertical`, `horizontal`, `diamonds`, `circles`...
    pub pattern: String,
    pub pattern_fill: String,
}

impl Default for RectangleStyle {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
            fill: "#be3838".to_string(),
            fill_opacity: 0.3,
            stroke: "#be3838".to_string(),
            stroke_width: 2.0,
            pattern: "solid".to_string(),
            pattern_fill: "#ffffff".to_string(),
        }
    }
}

/// A resolved style of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Style {
    Symbol(SymbolStyle),
    Line(LineStyle),
    Text(TextStyle),
    Rectangle(RectangleStyle),
}

impl Style {
    pub fn kind(&self) -> StyleKind {
        match self {
            Style::Symbol(_) => StyleKind::Symbol,
            Style::Line(_) => StyleKind::Line,
            Style::Text(_) => StyleKind::Text,
            Style::Rectangle(_) => StyleKind::Rectangle,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Style::Symbol(s) => &s.name,
            Style::Line(s) => &s.name,
            Style::Text(s) => &s.name,
            Style::Rectangle(s) => &s.name,
        }
    }
}

trait Named {
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(SymbolStyle, LineStyle, TextStyle, RectangleStyle);

fn find<'a, T: Named>(list: &'a [T], name: &str) -> Option<&'a T> {
    if name == NULL_CASE {
        return None;
    }
    list.iter().find(|s| s.name() == name)
}

fn insert_unique<T: Named>(list: &mut Vec<T>, item: T, kind: StyleKind) -> Result<usize, StyleError> {
    if list.iter().any(|s| s.name() == item.name()) {
        return Err(StyleError::DuplicateName {
            kind,
            name: item.name().to_string(),
        });
    }
    list.push(item);
    Ok(list.len() - 1)
}

fn replace_at<T: Named>(
    list: &mut [T],
    index: usize,
    item: T,
    kind: StyleKind,
) -> Result<(), StyleError> {
    if index >= list.len() {
        return Err(StyleError::NotFound { kind, index });
    }
    let collides = list
        .iter()
        .enumerate()
        .any(|(i, s)| i != index && s.name() == item.name());
    if collides {
        return Err(StyleError::DuplicateName {
            kind,
            name: item.name().to_string(),
        });
    }
    list[index] = item;
    Ok(())
}

fn remove_at<T>(list: &mut Vec<T>, index: usize, kind: StyleKind) -> Result<T, StyleError> {
    if index >= list.len() {
        return Err(StyleError::NotFound { kind, index });
    }
    Ok(list.remove(index))
}

/// Snapshot of the names available for one style kind.
///
/// Selectors built from a catalog must be rebuilt once [`StyleRegistry::is_stale`] reports true.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub kind: StyleKind,
    pub revision: u64,
    pub names: Vec<String>,
}

impl Catalog {
    /// Selectable options, led by the "no selection" sentinel.
    pub fn options(&self) -> Vec<&str> {
        std::iter::once(NULL_CASE)
            .chain(self.names.iter().map(String::as_str))
            .collect()
    }
}

/// The `styles` section of a settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleRegistry {
    pub symbols: Vec<SymbolStyle>,
    pub lines: Vec<LineStyle>,
    pub texts: Vec<TextStyle>,
    pub rectangles: Vec<RectangleStyle>,
    #[serde(skip)]
    revisions: [u64; 4],
}

impl Default for StyleRegistry {
    fn default() -> Self {
        default_catalog()
    }
}

impl StyleRegistry {
    pub fn empty() -> Self {
        Self {
            symbols: Vec::new(),
            lines: Vec::new(),
            texts: Vec::new(),
            rectangles: Vec::new(),
            revisions: [0; 4],
        }
    }

    pub fn resolve(&self, kind: StyleKind, name: &str) -> Style {
        match kind {
            StyleKind::Symbol => Style::Symbol(self.symbol(name)),
            StyleKind::Line => Style::Line(self.line(name)),
            StyleKind::Text => Style::Text(self.text(name)),
            StyleKind::Rectangle => Style::Rectangle(self.rectangle(name)),
        }
    }

    pub fn symbol(&self, name: &str) -> SymbolStyle {
        find(&self.symbols, name).cloned().unwrap_or_default()
    }

    pub fn line(&self, name: &str) -> LineStyle {
        find(&self.lines, name).cloned().unwrap_or_default()
    }

    pub fn text(&self, name: &str) -> TextStyle {
        find(&self.texts, name).cloned().unwrap_or_default()
    }

    pub fn rectangle(&self, name: &str) -> RectangleStyle {
        find(&self.rectangles, name).cloned().unwrap_or_default()
    }

    /// Whether `name` resolves to a stored style rather than the fallback.
    pub fn contains(&self, kind: StyleKind, name: &str) -> bool {
        self.position(kind, name).is_some()
    }

    pub fn position(&self, kind: StyleKind, name: &str) -> Option<usize> {
        self.names(kind).iter().position(|n| *n == name)
    }

    pub fn names(&self, kind: StyleKind) -> Vec<&str> {
        match kind {
            StyleKind::Symbol => self.symbols.iter().map(|s| s.name.as_str()).collect(),
            StyleKind::Line => self.lines.iter().map(|s| s.name.as_str()).collect(),
            StyleKind::Text => self.texts.iter().map(|s| s.name.as_str()).collect(),
            StyleKind::Rectangle => self.rectangles.iter().map(|s| s.name.as_str()).collect(),
        }
    }

    /// Add a new style. Names are unique per kind (exact, case-sensitive match).
    pub fn insert(&mut self, style: Style) -> Result<usize, StyleError> {
        let kind = style.kind();
        let index = match style {
            Style::Symbol(s) => insert_unique(&mut self.symbols, s, kind)?,
            Style::Line(s) => insert_unique(&mut self.lines, s, kind)?,
            Style::Text(s) => insert_unique(&mut self.texts, s, kind)?,
            Style::Rectangle(s) => insert_unique(&mut self.rectangles, s, kind)?,
        };
        self.bump(kind);
        Ok(index)
    }

    /// Replace the style stored at `index` of its kind. Renaming is allowed unless the new name
    /// is taken by another style.
    pub fn update(&mut self, index: usize, style: Style) -> Result<(), StyleError> {
        let kind = style.kind();
        match style {
            Style::Symbol(s) => replace_at(&mut self.symbols, index, s, kind)?,
            Style::Line(s) => replace_at(&mut self.lines, index, s, kind)?,
            Style::Text(s) => replace_at(&mut self.texts, index, s, kind)?,
            Style::Rectangle(s) => replace_at(&mut self.rectangles, index, s, kind)?,
        }
        self.bump(kind);
        Ok(())
    }

    /// Delete a style. References to it elsewhere are left dangling and resolve to the default.
    pub fn remove(&mut self, kind: StyleKind, index: usize) -> Result<Style, StyleError> {
        let removed = match kind {
            StyleKind::Symbol => Style::Symbol(remove_at(&mut self.symbols, index, kind)?),
            StyleKind::Line => Style::Line(remove_at(&mut self.lines, index, kind)?),
            StyleKind::Text => Style::Text(remove_at(&mut self.texts, index, kind)?),
            StyleKind::Rectangle => Style::Rectangle(remove_at(&mut self.rectangles, index, kind)?),
        };
        self.bump(kind);
        Ok(removed)
    }

    pub fn revision(&self, kind: StyleKind) -> u64 {
        self.revisions[kind.slot()]
    }

    pub fn catalog(&self, kind: StyleKind) -> Catalog {
        Catalog {
            kind,
            revision: self.revision(kind),
            names: self.names(kind).into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_stale(&self, catalog: &Catalog) -> bool {
        catalog.revision != self.revision(catalog.kind)
    }

    fn bump(&mut self, kind: StyleKind) {
        self.revisions[kind.slot()] += 1;
    }
}

fn symbol(name: &str, shape: &str, size: f64, fill: &str, fill_opacity: f64, stroke: &str) -> SymbolStyle {
    SymbolStyle {
        name: name.to_string(),
        symbol: shape.to_string(),
        size,
        fill: fill.to_string(),
        fill_opacity,
        stroke: stroke.to_string(),
        stroke_width: 2.0,
    }
}

fn line(name: &str, stroke: &str, stroke_width: f64, dasharray: &str) -> LineStyle {
    LineStyle {
        name: name.to_string(),
        stroke: stroke.to_string(),
        stroke_width,
        stroke_opacity: 0.9,
        stroke_dasharray: dasharray.to_string(),
    }
}

fn text(name: &str, font_size: &str, font_weight: &str, anchor: &str, rotate: f64) -> TextStyle {
    TextStyle {
        name: name.to_string(),
        font_size: font_size.to_string(),
        font_weight: font_weight.to_string(),
        text_anchor: anchor.to_string(),
        rotate,
        ..TextStyle::default()
    }
}

/// Styles shipped with a new settings document.
pub fn default_catalog() -> StyleRegistry {
    StyleRegistry {
        symbols: vec![
            SymbolStyle::default(),
            symbol("circle hollow", "circle", 130.0, "#ffffff", 0.0, "#000000"),
            symbol("circle filled", "circle", 130.0, "#000000", 1.0, "#000000"),
            symbol("square", "square", 130.0, "#000000", 0.8, "#000000"),
            symbol("triangle", "triangle-up", 130.0, "#000000", 0.8, "#000000"),
            symbol("diamond", "diamond", 130.0, "#000000", 0.8, "#000000"),
            symbol("cross", "cross", 130.0, "#000000", 0.8, "#000000"),
            symbol("red", "circle", 130.0, "#e32727", 0.8, "#e32727"),
            symbol("blue", "circle", 130.0, "#2d5aa0", 0.8, "#2d5aa0"),
        ],
        lines: vec![
            LineStyle::default(),
            line("reference line", "#000000", 1.0, "none"),
            line("dashed", "#708090", 2.0, "5, 5"),
            line("dotted", "#708090", 2.0, "2, 2"),
            line("emphasized", "#000000", 3.0, "none"),
        ],
        texts: vec![
            TextStyle::default(),
            text("header", "12px", "bold", "start", 0.0),
            text("title", "12px", "bold", "middle", 0.0),
            text("axis label", "12px", "normal", "middle", 0.0),
            text("vertical title", "12px", "bold", "middle", -90.0),
            text("italic", "12px", "normal", "start", 0.0),
        ],
        rectangles: vec![
            RectangleStyle::default(),
            RectangleStyle {
                name: "legend".to_string(),
                fill: "#ffffff".to_string(),
                fill_opacity: 0.0,
                stroke: "#000000".to_string(),
                stroke_width: 1.0,
                ..RectangleStyle::default()
            },
            RectangleStyle {
                name: "shaded".to_string(),
                fill: "#cccccc".to_string(),
                fill_opacity: 0.5,
                stroke: "#cccccc".to_string(),
                stroke_width: 0.0,
                ..RectangleStyle::default()
            },
        ],
        revisions: [0; 4],
    }
}
