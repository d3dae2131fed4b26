//! Result types for responder / non-responder comparisons.

use crate::data::Population;
use crate::error::{FreqError, Result};
use crate::filter::CohortFilter;
use crate::test::TTestVariant;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Sample and subject counts behind one population's comparison.
///
/// Group a holds responders ("y"), group b non-responders ("n"). The totals
/// cover the whole cohort, including samples without a response label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSizes {
    pub n_total: usize,
    pub n_group_a: usize,
    pub n_group_b: usize,
    pub n_subjects_total: usize,
    pub n_subjects_a: usize,
    pub n_subjects_b: usize,
}

/// Statistics for one population that could be tested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub population: Population,
    /// Levene W statistic.
    pub variance_test_statistic: f64,
    pub variance_test_p_value: f64,
    /// `variance_test_p_value >= EQUAL_VARIANCE_ALPHA`.
    pub equal_variance: bool,
    pub test_variant: TTestVariant,
    /// t statistic for mean(a) − mean(b).
    pub statistic: f64,
    pub df: f64,
    /// Two-sided t-test p-value.
    pub p_value: f64,
    /// Mean percentage in each group.
    pub mean_a: f64,
    pub mean_b: f64,
    #[serde(flatten)]
    pub sizes: GroupSizes,
}

/// Why a population was not tested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotComputedReason {
    /// One of the two groups has no observations.
    InsufficientGroupSize,
    /// A test statistic is undefined for these values (e.g. zero spread).
    DegenerateStatistic(String),
}

impl NotComputedReason {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsufficientGroupSize => "insufficient_group_size",
            Self::DegenerateStatistic(_) => "degenerate_statistic",
        }
    }
}

/// Outcome of comparing one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PopulationComparison {
    Tested(ComparisonResult),
    NotComputed {
        population: Population,
        reason: NotComputedReason,
        #[serde(flatten)]
        sizes: GroupSizes,
    },
}

impl PopulationComparison {
    pub fn population(&self) -> Population {
        match self {
            Self::Tested(r) => r.population,
            Self::NotComputed { population, .. } => *population,
        }
    }

    pub fn sizes(&self) -> &GroupSizes {
        match self {
            Self::Tested(r) => &r.sizes,
            Self::NotComputed { sizes, .. } => sizes,
        }
    }

    /// Check whether a p-value was computed.
    pub fn is_tested(&self) -> bool {
        matches!(self, Self::Tested(_))
    }

    /// The computed statistics, or the reason there are none as an error.
    pub fn result(&self) -> Result<&ComparisonResult> {
        match self {
            Self::Tested(r) => Ok(r),
            Self::NotComputed {
                population,
                reason: NotComputedReason::InsufficientGroupSize,
                sizes,
            } => Err(FreqError::InsufficientGroupSize {
                population: population.to_string(),
                n_a: sizes.n_group_a,
                n_b: sizes.n_group_b,
            }),
            Self::NotComputed {
                population,
                reason: NotComputedReason::DegenerateStatistic(msg),
                ..
            } => Err(FreqError::Numerical(format!("{}: {}", population, msg))),
        }
    }
}

/// Comparisons for every population of one cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSet {
    /// Filter that selected the cohort.
    pub filter: CohortFilter,
    /// True when the filter matched no samples; `comparisons` is then empty.
    pub empty_cohort: bool,
    /// One entry per population, in `Population::ALL` order.
    pub comparisons: Vec<PopulationComparison>,
}

impl ComparisonSet {
    /// Number of populations reported.
    pub fn len(&self) -> usize {
        self.comparisons.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    /// Get the comparison for a population.
    pub fn get(&self, population: Population) -> Option<&PopulationComparison> {
        self.comparisons.iter().find(|c| c.population() == population)
    }

    /// Populations that were tested.
    pub fn tested(&self) -> Vec<&ComparisonResult> {
        self.comparisons
            .iter()
            .filter_map(|c| match c {
                PopulationComparison::Tested(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Populations that could not be tested.
    pub fn not_computed(&self) -> Vec<&PopulationComparison> {
        self.comparisons.iter().filter(|c| !c.is_tested()).collect()
    }

    /// Tested results sorted by p-value (ascending).
    pub fn sorted_by_pvalue(&self) -> Vec<&ComparisonResult> {
        let mut sorted = self.tested();
        sorted.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
        sorted
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(FreqError::from)
    }

    /// Write one row per population as tab-separated text.
    ///
    /// Untested populations have status `not_computed` and empty statistic cells.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(
            writer,
            "population\tstatus\treason\tvariance_test_statistic\tvariance_test_p_value\tequal_variance\ttest_variant\tstatistic\tdf\tp_value\tmean_a\tmean_b\tn_total\tn_group_a\tn_group_b\tn_subjects_total\tn_subjects_a\tn_subjects_b"
        )?;

        for c in &self.comparisons {
            let s = c.sizes();
            match c {
                PopulationComparison::Tested(r) => writeln!(
                    writer,
                    "{}\ttested\t\t{:.6}\t{:.6e}\t{}\t{}\t{:.6}\t{:.4}\t{:.6e}\t{:.6}\t{:.6}\t{}\t{}\t{}\t{}\t{}\t{}",
                    r.population,
                    r.variance_test_statistic,
                    r.variance_test_p_value,
                    r.equal_variance,
                    r.test_variant,
                    r.statistic,
                    r.df,
                    r.p_value,
                    r.mean_a,
                    r.mean_b,
                    s.n_total,
                    s.n_group_a,
                    s.n_group_b,
                    s.n_subjects_total,
                    s.n_subjects_a,
                    s.n_subjects_b
                )?,
                PopulationComparison::NotComputed {
                    population, reason, ..
                } => writeln!(
                    writer,
                    "{}\tnot_computed\t{}\t\t\t\t\t\t\t\t\t\t{}\t{}\t{}\t{}\t{}\t{}",
                    population,
                    reason.name(),
                    s.n_total,
                    s.n_group_a,
                    s.n_group_b,
                    s.n_subjects_total,
                    s.n_subjects_a,
                    s.n_subjects_b
                )?,
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Write results to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_tsv(BufWriter::new(file))
    }
}
