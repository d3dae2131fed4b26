//! Calendar-aware subject ages.

use crate::error::{FreqError, Result};
use chrono::NaiveDate;

/// Whole calendar years elapsed between `birth` and `reference`.
///
/// A birthday not yet reached in the reference year does not count, so a
/// subject born 1955-05-01 is 69 on 2025-04-30 and 70 on 2025-05-01. A
/// 29 February birthday is reached on 1 March in common years.
///
/// # Errors
/// Returns `InvalidParameter` if `reference` precedes `birth`.
pub fn age_in_years(birth: NaiveDate, reference: NaiveDate) -> Result<u32> {
    reference.years_since(birth).ok_or_else(|| {
        FreqError::InvalidParameter(format!(
            "Reference date {} precedes date of birth {}",
            reference, birth
        ))
    })
}
