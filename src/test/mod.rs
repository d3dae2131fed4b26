//! Hypothesis tests used by the responder comparison.

pub mod levene;
pub mod ttest;

pub use levene::{test_levene, LeveneResult};
pub use ttest::{test_student, test_t, test_welch, TTestResult, TTestVariant};
