//! The loaded dataset: an immutable, validated table of sample records.

use crate::data::{Population, PopulationCounts, Response, SampleRecord, Sex};
use crate::error::{FreqError, Result};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns that must be present in every input file.
const REQUIRED_COLUMNS: [&str; 7] = [
    "sample",
    "sample_type",
    "b_cell",
    "cd8_t_cell",
    "cd4_t_cell",
    "nk_cell",
    "monocyte",
];

/// Columns that may be present; absent columns read as null.
const OPTIONAL_COLUMNS: [&str; 8] = [
    "subject",
    "project",
    "condition",
    "treatment",
    "response",
    "time_from_treatment_start",
    "sex",
    "date_of_birth",
];

/// Raw CSV row before type conversion.
#[derive(Debug, Deserialize)]
struct RawRow {
    sample: Option<String>,
    subject: Option<String>,
    project: Option<String>,
    sample_type: Option<String>,
    time_from_treatment_start: Option<String>,
    condition: Option<String>,
    treatment: Option<String>,
    response: Option<String>,
    sex: Option<String>,
    date_of_birth: Option<String>,
    b_cell: Option<String>,
    cd8_t_cell: Option<String>,
    cd4_t_cell: Option<String>,
    nk_cell: Option<String>,
    monocyte: Option<String>,
}

impl RawRow {
    fn count_field(&self, population: Population) -> &Option<String> {
        match population {
            Population::BCell => &self.b_cell,
            Population::Cd8TCell => &self.cd8_t_cell,
            Population::Cd4TCell => &self.cd4_t_cell,
            Population::NkCell => &self.nk_cell,
            Population::Monocyte => &self.monocyte,
        }
    }

    fn into_record(self, row: usize) -> Result<SampleRecord> {
        let sample = non_null(&self.sample).ok_or_else(|| FreqError::MalformedRecord {
            sample: format!("<row {}>", row),
            reason: "missing sample identifier".to_string(),
        })?;
        let malformed = |reason: String| FreqError::MalformedRecord {
            sample: sample.to_string(),
            reason,
        };

        let mut counts = PopulationCounts::default();
        for population in Population::ALL {
            let raw = non_null(self.count_field(population))
                .ok_or_else(|| malformed(format!("missing {} count", population)))?;
            let value = parse_whole_number(raw)
                .map_err(|reason| malformed(format!("{} count {}", population, reason)))?;
            if value < 0 {
                return Err(malformed(format!("{} count is negative ({})", population, value)));
            }
            counts.set(population, value as u64);
        }

        let sample_type = non_null(&self.sample_type)
            .ok_or_else(|| malformed("missing sample_type".to_string()))?
            .to_string();

        let time_from_treatment_start = non_null(&self.time_from_treatment_start)
            .map(|raw| {
                parse_whole_number(raw)
                    .map_err(|reason| malformed(format!("time_from_treatment_start {}", reason)))
            })
            .transpose()?;

        let response = non_null(&self.response)
            .map(|raw| {
                Response::from_code(raw)
                    .ok_or_else(|| malformed(format!("response '{}' is not 'y' or 'n'", raw)))
            })
            .transpose()?;

        let sex = non_null(&self.sex)
            .map(|raw| {
                Sex::from_code(raw).ok_or_else(|| malformed(format!("sex '{}' is not 'M' or 'F'", raw)))
            })
            .transpose()?;

        let date_of_birth = non_null(&self.date_of_birth)
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| malformed(format!("date_of_birth '{}': {}", raw, e)))
            })
            .transpose()?;

        let record = SampleRecord {
            sample: sample.to_string(),
            subject: non_null(&self.subject).unwrap_or(sample).to_string(),
            project: non_null(&self.project).map(String::from),
            sample_type,
            time_from_treatment_start,
            condition: non_null(&self.condition).map(String::from),
            treatment: non_null(&self.treatment).map(String::from),
            response,
            sex,
            date_of_birth,
            counts,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Treat empty strings and `NA` as null.
fn non_null(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "NA" && *v != "na")
}

/// Parse an integer, accepting integral floats such as `12.0`.
fn parse_whole_number(raw: &str) -> std::result::Result<i64, String> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if !v.is_finite() {
        return Err(format!("'{}' is not finite", raw));
    }
    if v.fract() != 0.0 {
        return Err(format!("'{}' is not a whole number", raw));
    }
    if v.abs() > i64::MAX as f64 {
        return Err(format!("'{}' is out of range", raw));
    }
    Ok(v as i64)
}

/// Subject-level attributes must agree across a subject's samples.
///
/// A null value on either side is not a conflict.
fn check_subject_attributes(first: &SampleRecord, record: &SampleRecord) -> Result<()> {
    fn differs<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
        matches!((a, b), (Some(x), Some(y)) if x != y)
    }

    let field = if differs(&first.project, &record.project) {
        "project"
    } else if differs(&first.sex, &record.sex) {
        "sex"
    } else if differs(&first.date_of_birth, &record.date_of_birth) {
        "date_of_birth"
    } else {
        return Ok(());
    };
    Err(FreqError::MalformedRecord {
        sample: record.sample.clone(),
        reason: format!(
            "{} of subject '{}' conflicts with sample '{}'",
            field, record.subject, first.sample
        ),
    })
}

/// The in-memory dataset every analysis step reads from.
///
/// Loaded once and passed by reference; never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SampleRecord>,
    /// sample id -> position in `records`.
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset from already-typed records.
    ///
    /// Fails on duplicate sample identifiers, records violating their
    /// invariants, and samples of one subject that disagree on the subject's
    /// project, sex or date of birth.
    pub fn from_records(records: Vec<SampleRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        let mut first_of_subject: HashMap<&str, &SampleRecord> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            let checked = record.validate().and_then(|()| {
                if index.insert(record.sample.clone(), i).is_some() {
                    return Err(FreqError::MalformedRecord {
                        sample: record.sample.clone(),
                        reason: "duplicate sample identifier".to_string(),
                    });
                }
                match first_of_subject.get(record.subject.as_str()) {
                    Some(first) => check_subject_attributes(first, record),
                    None => {
                        first_of_subject.insert(record.subject.as_str(), record);
                        Ok(())
                    }
                }
            });
            if let Err(e) = checked {
                warn!("Rejecting sample '{}': {}", record.sample, e);
                return Err(e);
            }
        }
        Ok(Self { records, index })
    }

    /// Load a dataset from a comma-separated file with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!("Loaded {} samples from {:?}", dataset.len(), path);
        Ok(dataset)
    }

    /// Load a dataset from any CSV source.
    ///
    /// Unknown columns are rejected, as are rows with missing, negative,
    /// fractional or non-finite counts.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in headers.iter() {
            if !REQUIRED_COLUMNS.contains(&column) && !OPTIONAL_COLUMNS.contains(&column) {
                return Err(FreqError::UnknownColumn(column.to_string()));
            }
        }
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(FreqError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();
        for (row, result) in rdr.deserialize::<RawRow>().enumerate() {
            let raw = result?;
            match raw.into_record(row + 1) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Rejecting input row {}: {}", row + 1, e);
                    return Err(e);
                }
            }
        }

        if records.is_empty() {
            return Err(FreqError::EmptyData("No samples in dataset".to_string()));
        }

        Self::from_records(records)
    }

    /// All records in input order.
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by sample identifier.
    pub fn get(&self, sample: &str) -> Option<&SampleRecord> {
        self.index.get(sample).map(|&i| &self.records[i])
    }

    /// Distinct subject identifiers, sorted.
    pub fn subjects(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.subject.as_str()).collect()
    }
}
