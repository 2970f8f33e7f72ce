// Library exports for datapivot

pub mod data;
pub mod error;
pub mod interactivity;
pub mod legend;
pub mod parser;
pub mod settings;
pub mod style;

// Pipeline stages
pub mod assemble;
pub mod filter;
pub mod format;
pub mod ir;
pub mod scale;
pub mod sort;
pub mod transform;

pub mod store;

pub use data::{Dataset, FieldValue, Row};
pub use error::{PivotError, QueryError, StyleError};
pub use ir::RenderData;
pub use settings::{Settings, NULL_CASE};
pub use store::{Action, OverrideTableState, SettingsStore};
pub use transform::apply_transformations;
