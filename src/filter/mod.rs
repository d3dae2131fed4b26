//! Cohort selection.

pub mod cohort;

pub use cohort::{filter_cohort, Cohort, CohortFilter, CohortRecord};
