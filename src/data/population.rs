//! The fixed set of immune-cell populations measured per sample.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FreqError;

/// An immune-cell population with a count column in the input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    BCell,
    Cd8TCell,
    Cd4TCell,
    NkCell,
    Monocyte,
}

impl Population {
    /// All populations in output order.
    pub const ALL: [Population; 5] = [
        Population::BCell,
        Population::Cd8TCell,
        Population::Cd4TCell,
        Population::NkCell,
        Population::Monocyte,
    ];

    /// Column name used in input and output tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BCell => "b_cell",
            Self::Cd8TCell => "cd8_t_cell",
            Self::Cd4TCell => "cd4_t_cell",
            Self::NkCell => "nk_cell",
            Self::Monocyte => "monocyte",
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Population {
    type Err = FreqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Population::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s.trim())
            .ok_or_else(|| FreqError::InvalidParameter(format!("Unknown population '{}'", s)))
    }
}
