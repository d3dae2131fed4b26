//! Levene's test for equality of variances (median-centred).
//!
//! Each observation is replaced by its absolute deviation from the group
//! median, and a one-way ANOVA F-statistic is computed on those deviations.
//! This is the Brown–Forsythe variant, robust to non-normal data.

use crate::error::{FreqError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Result of a Levene test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeveneResult {
    /// W statistic (F-distributed under H0).
    pub statistic: f64,
    /// Upper-tail p-value.
    pub p_value: f64,
    /// Numerator degrees of freedom (k − 1).
    pub df_between: f64,
    /// Denominator degrees of freedom (N − k).
    pub df_within: f64,
}

/// Median of a non-empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Run Levene's test across two or more groups.
///
/// # Errors
/// Returns `InvalidParameter` with fewer than two groups, an empty group, or
/// no residual degrees of freedom; `Numerical` when every group is constant
/// (the statistic is 0/0).
pub fn test_levene(groups: &[&[f64]]) -> Result<LeveneResult> {
    let k = groups.len();
    if k < 2 {
        return Err(FreqError::InvalidParameter(
            "Levene's test needs at least two groups".to_string(),
        ));
    }
    if groups.iter().any(|g| g.is_empty()) {
        return Err(FreqError::InvalidParameter(
            "Levene's test needs a non-empty sample in every group".to_string(),
        ));
    }
    if groups.iter().flat_map(|g| g.iter()).any(|v| !v.is_finite()) {
        return Err(FreqError::Numerical(
            "Levene's test received a non-finite value".to_string(),
        ));
    }

    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return Err(FreqError::InvalidParameter(format!(
            "Levene's test needs more than {} observations, got {}",
            k, n_total
        )));
    }

    // Absolute deviations from each group's median
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let m = median(g);
            g.iter().map(|x| (x - m).abs()).collect()
        })
        .collect();

    let group_means: Vec<f64> = deviations.iter().map(|d| mean(d)).collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / n_total as f64;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.iter().map(|z| (z - m).powi(2)).sum::<f64>())
        .sum();

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;

    if within == 0.0 {
        if between == 0.0 {
            return Err(FreqError::Numerical(
                "Levene's statistic is undefined: deviations are constant in every group".to_string(),
            ));
        }
        return Ok(LeveneResult {
            statistic: f64::INFINITY,
            p_value: 0.0,
            df_between,
            df_within,
        });
    }

    let statistic = (df_within / df_between) * (between / within);
    let f_dist = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| FreqError::Numerical(format!("F distribution: {}", e)))?;
    let p_value = f_dist.sf(statistic);

    Ok(LeveneResult {
        statistic,
        p_value,
        df_between,
        df_within,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[7.0]), 7.0);
    }

    #[test]
    fn test_symmetric_groups_have_zero_statistic() {
        // Deviations from the medians are {1.5, 0.5, 0.5, 1.5} in both groups.
        let a = [10.0, 12.0, 11.0, 13.0];
        let b = [20.0, 22.0, 21.0, 19.0];
        let res = test_levene(&[&a[..], &b[..]]).unwrap();
        assert_relative_eq!(res.statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(res.p_value, 1.0, epsilon = 1e-9);
        assert_eq!(res.df_between, 1.0);
        assert_eq!(res.df_within, 6.0);
    }

    #[test]
    fn test_hand_computed_statistic() {
        // a: median 2, deviations {1, 0, 1}, mean 2/3
        // b: median 20, deviations {10, 0, 10}, mean 20/3
        // grand mean 11/3; between = 3(3)^2 + 3(3)^2 = 54
        // within = (1/9 + 4/9 + 1/9) + (100/9 + 400/9 + 100/9) = 606/9
        // W = (4 / 1) * 54 / (606 / 9) = 1944 / 606
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        let res = test_levene(&[&a[..], &b[..]]).unwrap();
        assert_relative_eq!(res.statistic, 1944.0 / 606.0, max_relative = 1e-9);
        // F(1, 4) upper tail, equal to the two-sided t tail of sqrt(W) on 4 df
        assert_relative_eq!(res.p_value, 0.14776692576189329, max_relative = 1e-9);
    }

    #[test]
    fn test_three_group_reference() {
        // c: median 6, deviations {2, 0, 2}; between = 584/9, within = 70
        // W = (6 / 2) * (584/9) / 70 = 292/105 on F(2, 6)
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        let c = [4.0, 6.0, 8.0];
        let res = test_levene(&[&a[..], &b[..], &c[..]]).unwrap();
        assert_eq!(res.df_between, 2.0);
        assert_eq!(res.df_within, 6.0);
        assert_relative_eq!(res.statistic, 292.0 / 105.0, max_relative = 1e-9);
        assert_relative_eq!(res.p_value, 0.13975443157704810, max_relative = 1e-9);
    }

    #[test]
    fn test_very_different_spread() {
        let a = [10.0, 10.1, 9.9, 10.05, 9.95, 10.02];
        let b = [0.0, 25.0, 5.0, 30.0, -5.0, 18.0];
        let res = test_levene(&[&a[..], &b[..]]).unwrap();
        assert!(res.p_value < 0.05, "p = {}", res.p_value);
    }

    #[test]
    fn test_constant_groups_undefined() {
        let a = [5.0, 5.0];
        let b = [7.0, 7.0];
        assert!(matches!(
            test_levene(&[&a[..], &b[..]]),
            Err(FreqError::Numerical(_))
        ));
    }

    #[test]
    fn test_too_few_observations() {
        let empty: [f64; 0] = [];
        assert!(test_levene(&[&[1.0][..], &[2.0][..]]).is_err());
        assert!(test_levene(&[&[1.0, 2.0][..], &empty[..]]).is_err());
        assert!(test_levene(&[&[1.0, 2.0][..]]).is_err());
    }
}
