//! Drill-down extensions: well-known id columns that make a rendered element clickable.

use serde::{Deserialize, Serialize};

use crate::data::Row;
use crate::settings::is_set;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub key: String,
    /// Candidate id columns, checked in order.
    pub columns: Vec<String>,
    pub label: String,
}

/// Resolved "open detail view for entity X" action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailLink {
    pub key: String,
    pub label: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionTable {
    entries: Vec<Extension>,
}

impl Default for ExtensionTable {
    fn default() -> Self {
        let entry = |key: &str, columns: &[&str], label: &str| Extension {
            key: key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            label: label.to_string(),
        };
        Self {
            entries: vec![
                entry("study", &["study id", "study_id"], "Show study"),
                entry("experiment", &["experiment id", "experiment_id"], "Show experiment"),
                entry("animal_group", &["animal group id", "animal_group_id"], "Show animal group"),
                entry("endpoint", &["endpoint id", "endpoint_id"], "Show endpoint (basic)"),
                entry("endpoint_complete", &["endpoint id", "endpoint_id"], "Show endpoint (complete)"),
                entry("study_population", &["study population id", "sp id"], "Show study population"),
                entry("comparison_set", &["comparison set id"], "Show comparison set"),
                entry("exposure", &["exposure id"], "Show exposure"),
                entry("outcome", &["outcome id"], "Show outcome"),
                entry("result", &["result id"], "Show result"),
                entry("iv_chemical", &["chemical id"], "Show chemical"),
                entry("iv_experiment", &["IVExperiment id"], "Show in vitro experiment"),
                entry("iv_endpoint", &["IVEndpoint id"], "Show in vitro endpoint"),
            ],
        }
    }
}

impl ExtensionTable {
    pub fn new(entries: Vec<Extension>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Extension] {
        &self.entries
    }

    pub fn by_key(&self, key: &str) -> Option<&Extension> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Extensions usable with a dataset exposing `headers`, in table order.
    pub fn available_for(&self, headers: &[String]) -> Vec<&Extension> {
        self.entries
            .iter()
            .filter(|e| e.columns.iter().any(|c| headers.contains(c)))
            .collect()
    }

    /// Build the link for `key` from the first id column the row carries a value for.
    pub fn link_for(&self, key: &str, row: &Row) -> Option<DetailLink> {
        if !is_set(key) {
            return None;
        }
        let ext = self.by_key(key)?;
        let id = ext
            .columns
            .iter()
            .map(|c| row.get(c))
            .find(|v| !v.is_null())?
            .to_string();
        Some(DetailLink {
            key: ext.key.clone(),
            label: ext.label.clone(),
            id,
        })
    }
}
