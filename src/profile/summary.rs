//! Cohort summaries: subjects per condition and sample/subject breakdowns.
//!
//! These are the fixed, read-only questions asked of the dataset besides the
//! frequency comparison. Each is a typed query over the loaded records; there
//! is no free-form query surface.

use crate::data::{Dataset, Response, SampleRecord};
use crate::error::{FreqError, Result};
use crate::filter::CohortFilter;
use crate::profile::age::age_in_years;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Label used for a missing grouping key.
pub const MISSING_KEY: &str = "NA";

/// Subjects per condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    /// Condition name, `NA` for subjects with no recorded condition.
    pub condition: String,
    pub n_subjects: usize,
    /// Subjects with at least one sample labelled "y".
    pub n_responders: usize,
    /// Subjects with at least one sample labelled "n".
    pub n_non_responders: usize,
    /// Mean age in whole years over subjects with a date of birth.
    pub mean_age: Option<f64>,
}

/// Attribute to break a cohort down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakdown {
    Project,
    Response,
    Sex,
}

impl Breakdown {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Response => "response",
            Self::Sex => "sex",
        }
    }

    fn key(&self, record: &SampleRecord) -> String {
        let key = match self {
            Self::Project => record.project.clone(),
            Self::Response => record.response.map(|r| r.code().to_string()),
            Self::Sex => record.sex.map(|s| s.code().to_string()),
        };
        key.unwrap_or_else(|| MISSING_KEY.to_string())
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Breakdown {
    type Err = FreqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "project" => Ok(Self::Project),
            "response" => Ok(Self::Response),
            "sex" => Ok(Self::Sex),
            other => Err(FreqError::InvalidParameter(format!(
                "Unknown breakdown '{}' (expected project, response or sex)",
                other
            ))),
        }
    }
}

/// Sample and subject counts for one breakdown key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub key: String,
    pub n_samples: usize,
    pub n_subjects: usize,
}

#[derive(Default)]
struct SubjectFacts<'a> {
    responder: bool,
    non_responder: bool,
    date_of_birth: Option<NaiveDate>,
    conditions: BTreeSet<&'a str>,
}

/// Summarize subjects per condition among the samples matching `filter`.
///
/// Ages are computed as of `reference` with whole calendar years. Rows are
/// sorted by condition name.
///
/// # Errors
/// Returns `InvalidParameter` if `reference` precedes a subject's birth.
pub fn summarize_conditions(
    dataset: &Dataset,
    filter: &CohortFilter,
    reference: NaiveDate,
) -> Result<Vec<ConditionSummary>> {
    let mut subjects: BTreeMap<&str, SubjectFacts> = BTreeMap::new();
    for r in filter.select(dataset) {
        let facts = subjects.entry(r.subject.as_str()).or_default();
        match r.response {
            Some(Response::Responder) => facts.responder = true,
            Some(Response::NonResponder) => facts.non_responder = true,
            None => {}
        }
        if facts.date_of_birth.is_none() {
            facts.date_of_birth = r.date_of_birth;
        }
        facts
            .conditions
            .insert(r.condition.as_deref().unwrap_or(MISSING_KEY));
    }

    let mut by_condition: BTreeMap<&str, Vec<&SubjectFacts>> = BTreeMap::new();
    for facts in subjects.values() {
        for &condition in &facts.conditions {
            by_condition.entry(condition).or_default().push(facts);
        }
    }

    by_condition
        .into_iter()
        .map(|(condition, members)| -> Result<ConditionSummary> {
            let ages = members
                .iter()
                .filter_map(|f| f.date_of_birth)
                .map(|dob| age_in_years(dob, reference).map(f64::from))
                .collect::<Result<Vec<f64>>>()?;
            let mean_age = if ages.is_empty() {
                None
            } else {
                Some(ages.iter().sum::<f64>() / ages.len() as f64)
            };
            Ok(ConditionSummary {
                condition: condition.to_string(),
                n_subjects: members.len(),
                n_responders: members.iter().filter(|f| f.responder).count(),
                n_non_responders: members.iter().filter(|f| f.non_responder).count(),
                mean_age,
            })
        })
        .collect()
}

/// Count distinct samples and subjects per key among the samples matching `filter`.
///
/// Rows are sorted by key; an empty selection yields no rows.
pub fn breakdown(dataset: &Dataset, filter: &CohortFilter, by: Breakdown) -> Vec<BreakdownRow> {
    let mut groups: BTreeMap<String, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    for r in filter.select(dataset) {
        let (samples, subjects) = groups.entry(by.key(r)).or_default();
        samples.insert(r.sample.as_str());
        subjects.insert(r.subject.as_str());
    }

    groups
        .into_iter()
        .map(|(key, (samples, subjects))| BreakdownRow {
            key,
            n_samples: samples.len(),
            n_subjects: subjects.len(),
        })
        .collect()
}

/// One selected sample with its attributes and raw counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSampleRow {
    pub sample: String,
    pub subject: String,
    pub project: Option<String>,
    pub sample_type: String,
    pub condition: Option<String>,
    pub treatment: Option<String>,
    pub response: Option<Response>,
    pub time_from_treatment_start: Option<i64>,
    pub b_cell: u64,
    pub cd8_t_cell: u64,
    pub cd4_t_cell: u64,
    pub nk_cell: u64,
    pub monocyte: u64,
}

impl From<&SampleRecord> for CohortSampleRow {
    fn from(r: &SampleRecord) -> Self {
        Self {
            sample: r.sample.clone(),
            subject: r.subject.clone(),
            project: r.project.clone(),
            sample_type: r.sample_type.clone(),
            condition: r.condition.clone(),
            treatment: r.treatment.clone(),
            response: r.response,
            time_from_treatment_start: r.time_from_treatment_start,
            b_cell: r.counts.b_cell,
            cd8_t_cell: r.counts.cd8_t_cell,
            cd4_t_cell: r.counts.cd4_t_cell,
            nk_cell: r.counts.nk_cell,
            monocyte: r.counts.monocyte,
        }
    }
}

/// List the samples matching `filter` in input order.
pub fn cohort_samples(dataset: &Dataset, filter: &CohortFilter) -> Vec<CohortSampleRow> {
    filter
        .select(dataset)
        .into_iter()
        .map(CohortSampleRow::from)
        .collect()
}

/// Write serializable rows as a tab-separated table with a header.
pub fn write_rows_tsv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
