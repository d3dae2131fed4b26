//! Descriptive summaries of the loaded dataset.

pub mod age;
mod summary;

pub use age::age_in_years;
pub use summary::{
    breakdown, cohort_samples, summarize_conditions, write_rows_tsv, Breakdown, BreakdownRow,
    CohortSampleRow, ConditionSummary, MISSING_KEY,
};
