//! Normalization of raw cell counts.

pub mod frequency;

pub use frequency::{relative_frequency, FrequencyRecord, FrequencyTable, ZeroTotalPolicy};
