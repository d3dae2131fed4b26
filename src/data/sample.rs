//! Typed per-sample input records.

use crate::data::Population;
use crate::error::{FreqError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Treatment response label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Response {
    /// Responded to treatment ("y").
    #[serde(rename = "y")]
    Responder,
    /// Did not respond to treatment ("n").
    #[serde(rename = "n")]
    NonResponder,
}

impl Response {
    /// Parse the single-letter code used in the input data.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "y" | "Y" => Some(Self::Responder),
            "n" | "N" => Some(Self::NonResponder),
            _ => None,
        }
    }

    /// Single-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Responder => "y",
            Self::NonResponder => "n",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Biological sex of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

impl Sex {
    /// Parse the single-letter code used in the input data.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "F" | "f" => Some(Self::Female),
            "M" | "m" => Some(Self::Male),
            _ => None,
        }
    }

    /// Single-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Female => "F",
            Self::Male => "M",
        }
    }
}

/// Cell counts for the five measured populations of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub b_cell: u64,
    pub cd8_t_cell: u64,
    pub cd4_t_cell: u64,
    pub nk_cell: u64,
    pub monocyte: u64,
}

impl PopulationCounts {
    /// Count for a single population.
    #[inline]
    pub fn get(&self, population: Population) -> u64 {
        match population {
            Population::BCell => self.b_cell,
            Population::Cd8TCell => self.cd8_t_cell,
            Population::Cd4TCell => self.cd4_t_cell,
            Population::NkCell => self.nk_cell,
            Population::Monocyte => self.monocyte,
        }
    }

    /// Set the count for a single population.
    pub fn set(&mut self, population: Population, value: u64) {
        match population {
            Population::BCell => self.b_cell = value,
            Population::Cd8TCell => self.cd8_t_cell = value,
            Population::Cd4TCell => self.cd4_t_cell = value,
            Population::NkCell => self.nk_cell = value,
            Population::Monocyte => self.monocyte = value,
        }
    }

    /// Sum of all five populations.
    pub fn total(&self) -> u64 {
        Population::ALL.iter().map(|&p| self.get(p)).sum()
    }
}

/// One row of the input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sample identifier (unique within a dataset).
    pub sample: String,
    /// Subject the sample was drawn from.
    pub subject: String,
    /// Project the subject is enrolled in.
    pub project: Option<String>,
    /// Sample type, e.g. "PBMC".
    pub sample_type: String,
    /// Days from treatment start; absent for untreated subjects.
    pub time_from_treatment_start: Option<i64>,
    pub condition: Option<String>,
    pub treatment: Option<String>,
    pub response: Option<Response>,
    pub sex: Option<Sex>,
    pub date_of_birth: Option<NaiveDate>,
    /// Raw population counts.
    pub counts: PopulationCounts,
}

impl SampleRecord {
    /// Create a record with only the required fields set.
    ///
    /// The subject defaults to the sample identifier.
    pub fn new(sample: impl Into<String>, sample_type: impl Into<String>, counts: PopulationCounts) -> Self {
        let sample = sample.into();
        Self {
            subject: sample.clone(),
            sample,
            project: None,
            sample_type: sample_type.into(),
            time_from_treatment_start: None,
            condition: None,
            treatment: None,
            response: None,
            sex: None,
            date_of_birth: None,
            counts,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_time(mut self, time: i64) -> Self {
        self.time_from_treatment_start = Some(time);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    /// Total cell count across the five populations.
    pub fn total_count(&self) -> u64 {
        self.counts.total()
    }

    /// Check the invariants a record must satisfy before it enters a dataset.
    pub fn validate(&self) -> Result<()> {
        if self.sample.trim().is_empty() {
            return Err(FreqError::MalformedRecord {
                sample: self.sample.clone(),
                reason: "empty sample identifier".to_string(),
            });
        }
        if self.subject.trim().is_empty() {
            return Err(FreqError::MalformedRecord {
                sample: self.sample.clone(),
                reason: "empty subject identifier".to_string(),
            });
        }
        if self.sample_type.trim().is_empty() {
            return Err(FreqError::MalformedRecord {
                sample: self.sample.clone(),
                reason: "missing sample_type".to_string(),
            });
        }
        self.counts
            .b_cell
            .checked_add(self.counts.cd8_t_cell)
            .and_then(|s| s.checked_add(self.counts.cd4_t_cell))
            .and_then(|s| s.checked_add(self.counts.nk_cell))
            .and_then(|s| s.checked_add(self.counts.monocyte))
            .ok_or_else(|| FreqError::MalformedRecord {
                sample: self.sample.clone(),
                reason: "total count overflows".to_string(),
            })?;
        Ok(())
    }
}
