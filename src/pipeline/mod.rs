//! Analysis configuration and end-to-end execution.

mod config;
mod runner;

pub use config::AnalysisConfig;
pub use runner::{Analysis, AnalysisReport};
