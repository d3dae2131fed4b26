//! Runs the frequency transformation and responder comparison end to end.

use crate::compare::compare_responders;
use crate::data::{ComparisonSet, Dataset};
use crate::error::Result;
use crate::filter::CohortFilter;
use crate::normalize::{relative_frequency, FrequencyTable, ZeroTotalPolicy};
use crate::pipeline::AnalysisConfig;
use log::info;
use serde::{Deserialize, Serialize};

/// Output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub frequencies: FrequencyTable,
    pub comparison: ComparisonSet,
}

/// Builder for a responder comparison over a dataset.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    config: AnalysisConfig,
}

impl Analysis {
    /// Create an analysis over all samples with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Set the analysis name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Set the cohort filter.
    pub fn cohort(mut self, filter: CohortFilter) -> Self {
        self.config.cohort = filter;
        self
    }

    /// Set the zero-total policy.
    pub fn zero_total_policy(mut self, policy: ZeroTotalPolicy) -> Self {
        self.config.zero_total_policy = policy;
        self
    }

    /// The configuration this analysis runs with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Transform the dataset and compare its cohort.
    pub fn run(&self, dataset: &Dataset) -> Result<AnalysisReport> {
        info!(
            "Running analysis '{}' on {} samples",
            self.config.name,
            dataset.len()
        );
        let frequencies = relative_frequency(dataset, self.config.zero_total_policy)?;
        let comparison = compare_responders(&frequencies, dataset, &self.config.cohort)?;
        Ok(AnalysisReport {
            name: self.config.name.clone(),
            frequencies,
            comparison,
        })
    }
}
