//! Responder versus non-responder comparison of relative frequencies.
//!
//! For each population the cohort's percentages are split by response label,
//! Levene's test decides whether variances can be pooled, and the matching
//! t-test variant produces the two-sided p-value.

use crate::data::{
    ComparisonResult, ComparisonSet, Dataset, GroupSizes, NotComputedReason, Population,
    PopulationComparison, Response,
};
use crate::error::Result;
use crate::filter::{filter_cohort, Cohort, CohortFilter};
use crate::normalize::FrequencyTable;
use crate::test::{test_levene, test_t, TTestVariant};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Levene p-value at or above which variances are treated as equal.
///
/// Fixed policy; not configurable.
pub const EQUAL_VARIANCE_ALPHA: f64 = 0.05;

/// Percentages of one population split by response label.
#[derive(Debug, Clone, Default)]
pub struct ResponseGroups {
    /// Responders ("y").
    pub group_a: Vec<f64>,
    /// Non-responders ("n").
    pub group_b: Vec<f64>,
    pub sizes: GroupSizes,
}

/// Split one population of a cohort into responder and non-responder groups.
pub fn split_by_response(cohort: &Cohort, population: Population) -> ResponseGroups {
    let mut group_a = Vec::new();
    let mut group_b = Vec::new();
    let mut subjects = BTreeSet::new();
    let mut subjects_a = BTreeSet::new();
    let mut subjects_b = BTreeSet::new();
    let mut n_total = 0;

    for r in cohort.population(population) {
        n_total += 1;
        subjects.insert(r.subject.as_str());
        match r.response {
            Some(Response::Responder) => {
                group_a.push(r.percentage);
                subjects_a.insert(r.subject.as_str());
            }
            Some(Response::NonResponder) => {
                group_b.push(r.percentage);
                subjects_b.insert(r.subject.as_str());
            }
            None => {}
        }
    }

    let sizes = GroupSizes {
        n_total,
        n_group_a: group_a.len(),
        n_group_b: group_b.len(),
        n_subjects_total: subjects.len(),
        n_subjects_a: subjects_a.len(),
        n_subjects_b: subjects_b.len(),
    };

    ResponseGroups {
        group_a,
        group_b,
        sizes,
    }
}

/// Test one population's groups for a difference in means.
///
/// Never fails: an empty group or an undefined statistic yields
/// `PopulationComparison::NotComputed` with the reason.
pub fn compare_groups(population: Population, groups: &ResponseGroups) -> PopulationComparison {
    let not_computed = |reason: NotComputedReason| PopulationComparison::NotComputed {
        population,
        reason,
        sizes: groups.sizes,
    };

    if groups.group_a.is_empty() || groups.group_b.is_empty() {
        debug!(
            "{}: not tested ({} responder, {} non-responder observations)",
            population,
            groups.group_a.len(),
            groups.group_b.len()
        );
        return not_computed(NotComputedReason::InsufficientGroupSize);
    }

    let levene = match test_levene(&[groups.group_a.as_slice(), groups.group_b.as_slice()]) {
        Ok(l) => l,
        Err(e) => {
            debug!("{}: variance test undefined: {}", population, e);
            return not_computed(NotComputedReason::DegenerateStatistic(e.to_string()));
        }
    };

    let equal_variance = levene.p_value >= EQUAL_VARIANCE_ALPHA;
    let variant = if equal_variance {
        TTestVariant::Standard
    } else {
        TTestVariant::Welch
    };

    let ttest = match test_t(&groups.group_a, &groups.group_b, variant) {
        Ok(t) => t,
        Err(e) => {
            debug!("{}: {} t-test undefined: {}", population, variant, e);
            return not_computed(NotComputedReason::DegenerateStatistic(e.to_string()));
        }
    };

    debug!(
        "{}: Levene p = {:.4} -> {} t-test, p = {:.4}",
        population, levene.p_value, variant, ttest.p_value
    );

    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;

    PopulationComparison::Tested(ComparisonResult {
        population,
        variance_test_statistic: levene.statistic,
        variance_test_p_value: levene.p_value,
        equal_variance,
        test_variant: ttest.variant,
        statistic: ttest.statistic,
        df: ttest.df,
        p_value: ttest.p_value,
        mean_a: mean(&groups.group_a),
        mean_b: mean(&groups.group_b),
        sizes: groups.sizes,
    })
}

/// Compare responders with non-responders for every population of a cohort.
///
/// An empty cohort is reported through `ComparisonSet::empty_cohort` with no
/// comparisons. Otherwise every population appears exactly once, in
/// `Population::ALL` order, either tested or marked not computed.
pub fn compare_cohort(cohort: &Cohort) -> ComparisonSet {
    if cohort.is_empty() {
        info!("No samples match cohort [{}]", cohort.filter);
        return ComparisonSet {
            filter: cohort.filter.clone(),
            empty_cohort: true,
            comparisons: Vec::new(),
        };
    }

    let comparisons: Vec<PopulationComparison> = Population::ALL
        .par_iter()
        .map(|&population| compare_groups(population, &split_by_response(cohort, population)))
        .collect();

    ComparisonSet {
        filter: cohort.filter.clone(),
        empty_cohort: false,
        comparisons,
    }
}

/// Select a cohort from the frequency table and compare responders with non-responders.
pub fn compare_responders(
    table: &FrequencyTable,
    dataset: &Dataset,
    filter: &CohortFilter,
) -> Result<ComparisonSet> {
    let cohort = filter_cohort(table, dataset, filter)?;
    info!(
        "Cohort [{}]: {} samples from {} subjects",
        cohort.filter,
        cohort.samples().len(),
        cohort.subjects().len()
    );
    Ok(compare_cohort(&cohort))
}
