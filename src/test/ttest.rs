//! Two-sample t-tests for a difference in means.

use crate::error::{FreqError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

/// Which t-test variant was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TTestVariant {
    /// Student's t-test with pooled variance.
    Standard,
    /// Welch's t-test with Welch–Satterthwaite degrees of freedom.
    Welch,
}

impl TTestVariant {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Welch => "welch",
        }
    }
}

impl fmt::Display for TTestVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub variant: TTestVariant,
    /// t statistic for mean(a) − mean(b).
    pub statistic: f64,
    /// Degrees of freedom (fractional for Welch).
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Sample mean and unbiased variance.
fn mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = if values.len() > 1 {
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    (mean, var)
}

fn two_sided_p(statistic: f64, df: f64) -> Result<f64> {
    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| FreqError::Numerical(format!("Student's t distribution: {}", e)))?;
    Ok((2.0 * t_dist.sf(statistic.abs())).min(1.0))
}

fn check_inputs(a: &[f64], b: &[f64]) -> Result<()> {
    if a.is_empty() || b.is_empty() {
        return Err(FreqError::InvalidParameter(
            "t-test needs a non-empty sample in both groups".to_string(),
        ));
    }
    if a.iter().chain(b).any(|v| !v.is_finite()) {
        return Err(FreqError::Numerical(
            "t-test received a non-finite value".to_string(),
        ));
    }
    Ok(())
}

/// Student's two-sample t-test assuming equal variances.
///
/// t = (x̄ₐ − x̄ᵦ) / √(s²ₚ (1/nₐ + 1/nᵦ)), with pooled variance
/// s²ₚ = ((nₐ − 1)s²ₐ + (nᵦ − 1)s²ᵦ) / (nₐ + nᵦ − 2) and nₐ + nᵦ − 2 df.
pub fn test_student(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    check_inputs(a, b)?;
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let df = na + nb - 2.0;
    if df <= 0.0 {
        return Err(FreqError::InvalidParameter(
            "Student's t-test needs at least three observations".to_string(),
        ));
    }

    let (mean_a, var_a) = mean_var(a);
    let (mean_b, var_b) = mean_var(b);
    let pooled = ((na - 1.0) * var_a + (nb - 1.0) * var_b) / df;
    let std_error = (pooled * (1.0 / na + 1.0 / nb)).sqrt();
    if std_error == 0.0 {
        return Err(FreqError::Numerical(
            "Student's t-test has zero standard error".to_string(),
        ));
    }

    let statistic = (mean_a - mean_b) / std_error;
    Ok(TTestResult {
        variant: TTestVariant::Standard,
        statistic,
        df,
        p_value: two_sided_p(statistic, df)?,
    })
}

/// Welch's two-sample t-test for unequal variances.
///
/// t = (x̄ₐ − x̄ᵦ) / √(s²ₐ/nₐ + s²ᵦ/nᵦ), with Welch–Satterthwaite
/// df = (s²ₐ/nₐ + s²ᵦ/nᵦ)² / ((s²ₐ/nₐ)²/(nₐ − 1) + (s²ᵦ/nᵦ)²/(nᵦ − 1)).
pub fn test_welch(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    check_inputs(a, b)?;
    if a.len() < 2 || b.len() < 2 {
        return Err(FreqError::InvalidParameter(
            "Welch's t-test needs at least two observations per group".to_string(),
        ));
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (mean_a, var_a) = mean_var(a);
    let (mean_b, var_b) = mean_var(b);

    let se_a = var_a / na;
    let se_b = var_b / nb;
    let se2 = se_a + se_b;
    if se2 == 0.0 {
        return Err(FreqError::Numerical(
            "Welch's t-test has zero standard error".to_string(),
        ));
    }

    let df = se2.powi(2) / (se_a.powi(2) / (na - 1.0) + se_b.powi(2) / (nb - 1.0));
    let statistic = (mean_a - mean_b) / se2.sqrt();
    Ok(TTestResult {
        variant: TTestVariant::Welch,
        statistic,
        df,
        p_value: two_sided_p(statistic, df)?,
    })
}

/// Run the requested variant.
pub fn test_t(a: &[f64], b: &[f64], variant: TTestVariant) -> Result<TTestResult> {
    match variant {
        TTestVariant::Standard => test_student(a, b),
        TTestVariant::Welch => test_welch(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_student_separated_means() {
        // Both groups: mean offset 9, variance 5/3; se = sqrt(5/6)
        let a = [10.0, 12.0, 11.0, 13.0];
        let b = [20.0, 22.0, 21.0, 19.0];
        let res = test_student(&a, &b).unwrap();
        assert_eq!(res.variant, TTestVariant::Standard);
        assert_eq!(res.df, 6.0);
        assert_relative_eq!(res.statistic, -9.0 / (5.0f64 / 6.0).sqrt(), max_relative = 1e-9);
        assert!(res.p_value < 0.001, "p = {}", res.p_value);
    }

    #[test]
    fn test_student_identical_means() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        let res = test_student(&a, &b).unwrap();
        assert_relative_eq!(res.statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(res.p_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_student_known_p_value() {
        // Means 1 and 0, both variances 0.45, n = 6: se = sqrt(0.15), t ≈ 2.582 on 10 df
        let a = [0.25, 1.0, 1.75, 0.25, 1.0, 1.75];
        let b = [-0.75, 0.0, 0.75, -0.75, 0.0, 0.75];
        let res = test_student(&a, &b).unwrap();
        assert_eq!(res.df, 10.0);
        assert_relative_eq!(res.statistic, 1.0 / 0.15f64.sqrt(), max_relative = 1e-9);
        assert_relative_eq!(res.p_value, 0.027322920202958622, max_relative = 1e-9);
    }

    #[test]
    fn test_student_reference_p_value() {
        // Pooled variance 50.5, t = -18 / sqrt(101/3) on 4 df
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        let res = test_student(&a, &b).unwrap();
        assert_eq!(res.df, 4.0);
        assert_relative_eq!(res.statistic, -3.1022189439557008, max_relative = 1e-9);
        assert_relative_eq!(res.p_value, 0.036143278053270485, max_relative = 1e-9);
    }

    #[test]
    fn test_welch_reference_p_value() {
        // Same t as the pooled test, df = 2 * 10201 / 10001
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        let res = test_welch(&a, &b).unwrap();
        assert_relative_eq!(res.statistic, -3.1022189439557008, max_relative = 1e-9);
        assert_relative_eq!(res.df, 20402.0 / 10001.0, max_relative = 1e-12);
        assert_relative_eq!(res.p_value, 0.087874601586774888, max_relative = 1e-6);
    }

    #[test]
    fn test_welch_reference_p_value_equal_variance() {
        // Equal variances: df = 4, t = -3 / sqrt(2/3)
        let res = test_welch(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(res.df, 4.0, max_relative = 1e-12);
        assert_relative_eq!(res.p_value, 0.021311641128756726, max_relative = 1e-9);
    }

    #[test]
    fn test_welch_df_equal_variance_equal_n() {
        // Equal variances and sizes give df = 2(n − 1).
        let a = [10.0, 12.0, 11.0, 13.0];
        let b = [20.0, 22.0, 21.0, 19.0];
        let res = test_welch(&a, &b).unwrap();
        assert_eq!(res.variant, TTestVariant::Welch);
        assert_relative_eq!(res.df, 6.0, max_relative = 1e-9);
        let student = test_student(&a, &b).unwrap();
        assert_relative_eq!(res.statistic, student.statistic, max_relative = 1e-9);
        assert_relative_eq!(res.p_value, student.p_value, max_relative = 1e-9);
    }

    #[test]
    fn test_welch_unequal_variance_df() {
        // var_a = 1, var_b = 100, n = 5 each: se_a = 0.2, se_b = 20
        // df = 20.2² / (0.04/4 + 400/4) = 408.04 / 100.01
        let a = [-1.0, -0.5, 0.0, 0.5, 1.0].map(|x: f64| x * (1.0f64 / 0.625).sqrt());
        let b = [-10.0, -5.0, 0.0, 5.0, 10.0].map(|x: f64| x * (100.0f64 / 62.5).sqrt());
        let res = test_welch(&a, &b).unwrap();
        assert_relative_eq!(res.df, 408.04 / 100.01, max_relative = 1e-9);
    }

    #[test]
    fn test_zero_variance_rejected() {
        assert!(matches!(
            test_student(&[1.0, 1.0], &[1.0, 1.0]),
            Err(FreqError::Numerical(_))
        ));
        assert!(matches!(
            test_welch(&[1.0, 1.0], &[2.0, 2.0]),
            Err(FreqError::Numerical(_))
        ));
    }

    #[test]
    fn test_too_few_observations() {
        assert!(test_student(&[1.0], &[2.0]).is_err());
        assert!(test_welch(&[1.0], &[2.0, 3.0]).is_err());
        assert!(test_student(&[], &[2.0, 3.0]).is_err());
    }

    #[test]
    fn test_dispatch() {
        let a = [1.0, 2.0, 4.0];
        let b = [2.0, 5.0, 9.0, 11.0];
        assert_eq!(test_t(&a, &b, TTestVariant::Welch).unwrap().variant, TTestVariant::Welch);
        assert_eq!(
            test_t(&a, &b, TTestVariant::Standard).unwrap().variant,
            TTestVariant::Standard
        );
    }
}
