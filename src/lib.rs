//! Immune-cell relative frequency analysis.
//!
//! Loads per-sample immune-cell counts, converts them to relative frequencies,
//! and compares responders with non-responders within a treatment cohort.
//!
//! # Overview
//!
//! - **data**: Core data structures (Dataset, SampleRecord, comparison results)
//! - **normalize**: Relative-frequency transformation
//! - **filter**: Cohort selection by treatment, condition, sample type and timepoint
//! - **test**: Hypothesis testing (Levene, Student and Welch t-tests)
//! - **compare**: Responder vs non-responder comparison per population
//! - **profile**: Cohort summaries (subjects per condition, breakdowns, sample listings, ages)
//! - **pipeline**: Configuration and end-to-end execution
//!
//! # Example
//!
//! ```no_run
//! use cell_freq::prelude::*;
//!
//! let dataset = Dataset::from_csv("cell-count.csv").unwrap();
//!
//! let report = Analysis::new()
//!     .cohort(
//!         CohortFilter::new()
//!             .treatment("tr1")
//!             .condition("melanoma")
//!             .sample_type("PBMC"),
//!     )
//!     .run(&dataset)
//!     .unwrap();
//!
//! for result in report.comparison.tested() {
//!     println!("{}: p = {:.4}", result.population, result.p_value);
//! }
//! ```

pub mod compare;
pub mod data;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::compare::{
        compare_cohort, compare_groups, compare_responders, split_by_response, ResponseGroups,
        EQUAL_VARIANCE_ALPHA,
    };
    pub use crate::data::{
        ComparisonResult, ComparisonSet, Dataset, GroupSizes, NotComputedReason, Population,
        PopulationComparison, PopulationCounts, Response, SampleRecord, Sex,
    };
    pub use crate::error::{FreqError, Result};
    pub use crate::filter::{filter_cohort, Cohort, CohortFilter, CohortRecord};
    pub use crate::normalize::{relative_frequency, FrequencyRecord, FrequencyTable, ZeroTotalPolicy};
    pub use crate::pipeline::{Analysis, AnalysisConfig, AnalysisReport};
    pub use crate::profile::{
        age_in_years, breakdown, cohort_samples, summarize_conditions, write_rows_tsv, Breakdown,
        BreakdownRow, CohortSampleRow, ConditionSummary,
    };
    pub use crate::test::{
        test_levene, test_student, test_t, test_welch, LeveneResult, TTestResult, TTestVariant,
    };
}
