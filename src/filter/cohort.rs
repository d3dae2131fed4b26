//! Cohort selection by equality predicates on sample attributes.

use crate::data::{Dataset, Population, Response, SampleRecord};
use crate::error::{FreqError, Result};
use crate::normalize::FrequencyTable;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Equality predicates selecting a comparison cohort.
///
/// Unset predicates match every sample. A set predicate never matches a
/// sample whose attribute is null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortFilter {
    pub treatment: Option<String>,
    pub condition: Option<String>,
    pub sample_type: Option<String>,
    pub time_from_treatment_start: Option<i64>,
}

impl CohortFilter {
    /// A filter that matches every sample.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn sample_type(mut self, sample_type: impl Into<String>) -> Self {
        self.sample_type = Some(sample_type.into());
        self
    }

    pub fn time_from_treatment_start(mut self, time: i64) -> Self {
        self.time_from_treatment_start = Some(time);
        self
    }

    /// Fill any predicate unset here from `other`.
    pub fn or(self, other: &CohortFilter) -> Self {
        Self {
            treatment: self.treatment.or_else(|| other.treatment.clone()),
            condition: self.condition.or_else(|| other.condition.clone()),
            sample_type: self.sample_type.or_else(|| other.sample_type.clone()),
            time_from_treatment_start: self
                .time_from_treatment_start
                .or(other.time_from_treatment_start),
        }
    }

    /// Check whether a sample satisfies every set predicate.
    pub fn matches(&self, record: &SampleRecord) -> bool {
        fn eq(want: &Option<String>, have: &Option<String>) -> bool {
            match want {
                Some(w) => have.as_deref() == Some(w.as_str()),
                None => true,
            }
        }

        eq(&self.treatment, &record.treatment)
            && eq(&self.condition, &record.condition)
            && self
                .sample_type
                .as_ref()
                .map_or(true, |s| *s == record.sample_type)
            && self
                .time_from_treatment_start
                .map_or(true, |t| record.time_from_treatment_start == Some(t))
    }

    /// Samples of the dataset matching this filter, in input order.
    pub fn select<'a>(&self, dataset: &'a Dataset) -> Vec<&'a SampleRecord> {
        dataset.records().iter().filter(|r| self.matches(r)).collect()
    }
}

impl fmt::Display for CohortFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(t) = &self.treatment {
            parts.push(format!("treatment = {}", t));
        }
        if let Some(c) = &self.condition {
            parts.push(format!("condition = {}", c));
        }
        if let Some(s) = &self.sample_type {
            parts.push(format!("sample_type = {}", s));
        }
        if let Some(t) = self.time_from_treatment_start {
            parts.push(format!("time_from_treatment_start = {}", t));
        }
        if parts.is_empty() {
            f.write_str("all samples")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// A relative frequency joined with the attributes needed for grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub sample: String,
    pub subject: String,
    pub population: Population,
    pub percentage: f64,
    pub response: Option<Response>,
}

/// Frequency records of the samples selected by a `CohortFilter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cohort {
    pub filter: CohortFilter,
    pub records: Vec<CohortRecord>,
}

impl Cohort {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fail with `EmptyCohort` if no sample matched.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(FreqError::EmptyCohort(self.filter.to_string()));
        }
        Ok(())
    }

    /// Records of one population.
    pub fn population(&self, population: Population) -> impl Iterator<Item = &CohortRecord> + '_ {
        self.records.iter().filter(move |r| r.population == population)
    }

    /// Distinct samples in the cohort.
    pub fn samples(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.sample.as_str()).collect()
    }

    /// Distinct subjects in the cohort.
    pub fn subjects(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.subject.as_str()).collect()
    }
}

/// Restrict a frequency table to the samples matching `filter`.
///
/// An empty selection is returned as an empty `Cohort`, not an error; use
/// `Cohort::ensure_not_empty` to turn it into `FreqError::EmptyCohort`.
///
/// # Errors
/// Returns `InvalidParameter` if the table refers to a sample that is not in
/// the dataset.
pub fn filter_cohort(
    table: &FrequencyTable,
    dataset: &Dataset,
    filter: &CohortFilter,
) -> Result<Cohort> {
    let mut records = Vec::new();
    for freq in &table.records {
        let parent = dataset.get(&freq.sample).ok_or_else(|| {
            FreqError::InvalidParameter(format!(
                "Frequency record refers to unknown sample '{}'",
                freq.sample
            ))
        })?;
        if filter.matches(parent) {
            records.push(CohortRecord {
                sample: freq.sample.clone(),
                subject: parent.subject.clone(),
                population: freq.population,
                percentage: freq.percentage,
                response: parent.response,
            });
        }
    }

    debug!(
        "Cohort [{}]: {} frequency records from {} samples",
        filter,
        records.len(),
        records
            .iter()
            .map(|r| r.sample.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    );

    Ok(Cohort {
        filter: filter.clone(),
        records,
    })
}
