//! Cohort comparisons between treatment-response groups.

pub mod responders;

pub use responders::{
    compare_cohort, compare_groups, compare_responders, split_by_response, ResponseGroups,
    EQUAL_VARIANCE_ALPHA,
};
