//! Relative-frequency transformation of per-sample cell counts.
//!
//! Converts the wide table (one row per sample, one column per population)
//! into long-form records carrying each population's share of the sample's
//! total cell count, in percent.

use crate::data::{Dataset, Population};
use crate::error::{FreqError, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// What to do with a sample whose total cell count is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroTotalPolicy {
    /// Fail the whole transformation with `DivisionByZero`.
    #[default]
    Abort,
    /// Leave the sample out and record it in `FrequencyTable::skipped`.
    Skip,
}

/// One population's share of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRecord {
    pub sample: String,
    pub total_count: u64,
    pub population: Population,
    pub count: u64,
    /// 100 × count / total_count.
    pub percentage: f64,
}

/// Long-form relative frequencies, five records per transformed sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub records: Vec<FrequencyRecord>,
    /// Samples left out under `ZeroTotalPolicy::Skip`.
    pub skipped: Vec<String>,
}

impl FrequencyTable {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records of one population.
    pub fn population(&self, population: Population) -> impl Iterator<Item = &FrequencyRecord> + '_ {
        self.records.iter().filter(move |r| r.population == population)
    }

    /// Keep only the records of one population.
    pub fn for_population(&self, population: Population) -> FrequencyTable {
        FrequencyTable {
            records: self.population(population).cloned().collect(),
            skipped: self.skipped.clone(),
        }
    }

    /// Iterate over the records of one sample.
    pub fn sample<'a>(&'a self, sample: &'a str) -> impl Iterator<Item = &'a FrequencyRecord> + 'a {
        self.records.iter().filter(move |r| r.sample == sample)
    }

    /// Look up the record for a (sample, population) pair.
    pub fn get(&self, sample: &str, population: Population) -> Option<&FrequencyRecord> {
        self.records
            .iter()
            .find(|r| r.sample == sample && r.population == population)
    }

    /// Write the table as a delimited file.
    ///
    /// Columns: sample, total_count, population, count, percentage.
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_delimited(File::create(path)?, b',')
    }

    /// Write the table to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_delimited(File::create(path)?, b'\t')
    }
}

/// Compute relative frequencies for every sample in the dataset.
///
/// For sample j and population p: percentage = 100 × count(j, p) / Σₚ count(j, p).
///
/// # Errors
/// With `ZeroTotalPolicy::Abort`, the first sample whose counts sum to zero
/// fails the batch with `FreqError::DivisionByZero`. With `Skip` such samples
/// are logged and listed in `skipped` instead.
pub fn relative_frequency(dataset: &Dataset, policy: ZeroTotalPolicy) -> Result<FrequencyTable> {
    let mut records = Vec::with_capacity(dataset.len() * Population::ALL.len());
    let mut skipped = Vec::new();

    for sample in dataset.records() {
        let total_count = sample.total_count();
        if total_count == 0 {
            match policy {
                ZeroTotalPolicy::Abort => {
                    return Err(FreqError::DivisionByZero {
                        sample: sample.sample.clone(),
                    })
                }
                ZeroTotalPolicy::Skip => {
                    warn!(
                        "Skipping sample '{}': total cell count is zero",
                        sample.sample
                    );
                    skipped.push(sample.sample.clone());
                    continue;
                }
            }
        }

        let total = total_count as f64;
        for population in Population::ALL {
            let count = sample.counts.get(population);
            records.push(FrequencyRecord {
                sample: sample.sample.clone(),
                total_count,
                population,
                count,
                percentage: 100.0 * count as f64 / total,
            });
        }
    }

    Ok(FrequencyTable { records, skipped })
}
