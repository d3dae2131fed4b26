//! Data structures for cell-count analysis.

mod dataset;
mod population;
mod result;
mod sample;

pub use dataset::Dataset;
pub use population::Population;
pub use result::{
    ComparisonResult, ComparisonSet, GroupSizes, NotComputedReason, PopulationComparison,
};
pub use sample::{PopulationCounts, Response, SampleRecord, Sex};
