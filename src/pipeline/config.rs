//! Analysis configuration loaded from YAML.

use crate::error::{FreqError, Result};
use crate::filter::CohortFilter;
use crate::normalize::ZeroTotalPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one responder comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Name of the analysis.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Cohort to compare.
    pub cohort: CohortFilter,
    /// Handling of samples with zero total cells.
    pub zero_total_policy: ZeroTotalPolicy,
    /// Date ages are computed at; today when unset.
    pub reference_date: Option<NaiveDate>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            description: None,
            cohort: CohortFilter::default(),
            zero_total_policy: ZeroTotalPolicy::Abort,
            reference_date: None,
        }
    }
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(FreqError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(FreqError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Melanoma PBMC samples under treatment tr1.
    pub fn example() -> Self {
        Self {
            name: "tr1-melanoma-pbmc".to_string(),
            description: Some(
                "Responders vs non-responders to tr1 among melanoma PBMC samples".to_string(),
            ),
            cohort: CohortFilter::new()
                .treatment("tr1")
                .condition("melanoma")
                .sample_type("PBMC"),
            zero_total_policy: ZeroTotalPolicy::Abort,
            reference_date: None,
        }
    }
}
