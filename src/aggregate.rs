//! Aggregation: fold question results into category summaries and a single
//! composite verdict.
//!
//! One generic fold covers both rubric families. The weighting variant is a
//! property of the rubric, not a separate code path: unweighted rubrics
//! composite as the mean of category means, weighted rubrics as
//! Σ(mean/K × weight) on a 0–100 scale.

use serde::Serialize;
use thiserror::Error;

use crate::orchestrator::QuestionResult;
use crate::rubric::{Rubric, Severity, Verdict};

// =============================================================================
// Derived summaries
// =============================================================================

/// Per-category summary, recomputed on demand from question results.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub mean_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_contribution: Option<f64>,
    pub question_count: usize,
    /// How many of this category's results were produced by the recovery
    /// policy rather than a genuine scorer response. Non-zero means the mean
    /// includes forced zeros.
    pub fallback_count: usize,
    pub severity: Severity,
}

/// Aggregated view of one scoring run.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub categories: Vec<CategorySummary>,
    pub composite_score: f64,
    pub verdict: Verdict,
}

/// Whether the result set is expected to cover the whole rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every rubric question must have exactly one result.
    Complete,
    /// An ordered prefix from an aborted run; uncovered categories are
    /// skipped.
    Partial,
}

/// Rubric/orchestrator mismatch. Fatal: this indicates a bug upstream, not a
/// degraded evaluation.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("expected {expected} results for rubric '{rubric}', got {actual}")]
    ResultCountMismatch {
        rubric: String,
        expected: usize,
        actual: usize,
    },

    #[error("category '{0}' has no results")]
    EmptyCategory(String),

    #[error("result references unknown category '{0}'")]
    UnknownCategory(String),
}

// =============================================================================
// Aggregation
// =============================================================================

/// Fold question results into category summaries and the composite verdict.
///
/// Grouping preserves the rubric's declared category order. All results
/// participate in the means, fallbacks included - an unverifiable answer
/// counts as zero rather than disappearing, and `fallback_count` surfaces the
/// reduced coverage.
pub fn aggregate(
    rubric: &Rubric,
    results: &[QuestionResult],
    coverage: Coverage,
) -> Result<Aggregate, AggregationError> {
    if coverage == Coverage::Complete && results.len() != rubric.question_count() {
        return Err(AggregationError::ResultCountMismatch {
            rubric: rubric.name().to_string(),
            expected: rubric.question_count(),
            actual: results.len(),
        });
    }

    if let Some(stray) = results.iter().find(|r| {
        !rubric
            .categories()
            .iter()
            .any(|c| c.name == r.category)
    }) {
        return Err(AggregationError::UnknownCategory(stray.category.clone()));
    }

    let scale = rubric.scale();
    let mut categories = Vec::with_capacity(rubric.categories().len());

    for category in rubric.categories() {
        let scores: Vec<u8> = results
            .iter()
            .filter(|r| r.category == category.name)
            .map(|r| r.score)
            .collect();

        if scores.is_empty() {
            match coverage {
                Coverage::Complete => {
                    return Err(AggregationError::EmptyCategory(category.name.clone()))
                }
                Coverage::Partial => continue,
            }
        }

        let mean_score =
            scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;

        let weighted_contribution = category
            .weight
            .map(|w| (mean_score / scale.max as f64) * w);

        let fallback_count = results
            .iter()
            .filter(|r| r.category == category.name && r.is_fallback())
            .count();

        categories.push(CategorySummary {
            category: category.name.clone(),
            mean_score,
            weight: category.weight,
            weighted_contribution,
            question_count: scores.len(),
            fallback_count,
            severity: scale.severity(mean_score),
        });
    }

    let composite_score = if categories.is_empty() {
        0.0
    } else if rubric.is_weighted() {
        categories
            .iter()
            .filter_map(|c| c.weighted_contribution)
            .sum()
    } else {
        categories.iter().map(|c| c.mean_score).sum::<f64>() / categories.len() as f64
    };

    let verdict = rubric.bands().classify(composite_score);

    Ok(Aggregate {
        categories,
        composite_score,
        verdict,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ScoreStatus;
    use crate::prompts::{CLUSTER_PROMPT, STARTUP_PROMPT};
    use crate::rubric::{Category, ScoreScale, VerdictBands};

    fn result(category: &str, score: u8, status: ScoreStatus) -> QuestionResult {
        QuestionResult {
            category: category.to_string(),
            question: format!("q-{category}-{score}"),
            score,
            comment: "test".to_string(),
            status,
        }
    }

    fn ok(category: &str, score: u8) -> QuestionResult {
        result(category, score, ScoreStatus::Ok)
    }

    fn unweighted_rubric(shape: &[(&str, usize)]) -> Rubric {
        let categories = shape
            .iter()
            .map(|(name, n)| {
                Category::new(*name, (0..*n).map(|i| format!("q{i}")).collect())
            })
            .collect();
        Rubric::new(
            "test",
            "Test",
            ScoreScale::STARTUP,
            VerdictBands::STARTUP,
            ["a", "b", "c", "d"],
            STARTUP_PROMPT,
            categories,
        )
        .unwrap()
    }

    fn weighted_rubric(shape: &[(&str, f64, usize)]) -> Rubric {
        let categories = shape
            .iter()
            .map(|(name, w, n)| {
                Category::weighted(*name, *w, (0..*n).map(|i| format!("q{i}")).collect())
            })
            .collect();
        Rubric::new(
            "test-weighted",
            "Test",
            ScoreScale::CLUSTER,
            VerdictBands::CLUSTER,
            ["a", "b", "c", "d"],
            CLUSTER_PROMPT,
            categories,
        )
        .unwrap()
    }

    #[test]
    fn unweighted_composite_is_mean_of_category_means() {
        // Category question counts are imbalanced on purpose: each category
        // still contributes equally.
        let rubric = unweighted_rubric(&[("A", 1), ("B", 3)]);
        let results = vec![ok("A", 3), ok("B", 1), ok("B", 1), ok("B", 1)];

        let agg = aggregate(&rubric, &results, Coverage::Complete).unwrap();
        assert_eq!(agg.categories.len(), 2);
        assert!((agg.categories[0].mean_score - 3.0).abs() < 1e-9);
        assert!((agg.categories[1].mean_score - 1.0).abs() < 1e-9);
        assert!((agg.composite_score - 2.0).abs() < 1e-9);
        assert_eq!(agg.verdict, Verdict::Good);
    }

    #[test]
    fn weighted_composite_sums_scaled_contributions() {
        let rubric = weighted_rubric(&[("A", 20.0, 1), ("B", 80.0, 1)]);
        let results = vec![ok("A", 3), ok("B", 2)];

        let agg = aggregate(&rubric, &results, Coverage::Complete).unwrap();
        // (3/4)*20 + (2/4)*80 = 15 + 40 = 55
        assert!((agg.composite_score - 55.0).abs() < 1e-9);
        assert!((agg.categories[0].weighted_contribution.unwrap() - 15.0).abs() < 1e-9);
        assert!((agg.categories[1].weighted_contribution.unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(agg.verdict, Verdict::NeedsImprovement);
    }

    #[test]
    fn fallback_zeros_participate_in_means() {
        let rubric = unweighted_rubric(&[("A", 2)]);
        let results = vec![ok("A", 2), result("A", 0, ScoreStatus::Fallback)];

        let agg = aggregate(&rubric, &results, Coverage::Complete).unwrap();
        assert!((agg.categories[0].mean_score - 1.0).abs() < 1e-9);
        assert_eq!(agg.categories[0].fallback_count, 1);
        assert_eq!(agg.categories[0].question_count, 2);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rubric = unweighted_rubric(&[("A", 2), ("B", 1)]);
        let results = vec![ok("A", 3), ok("A", 2), ok("B", 1)];

        let first = aggregate(&rubric, &results, Coverage::Complete).unwrap();
        let second = aggregate(&rubric, &results, Coverage::Complete).unwrap();

        assert_eq!(first.composite_score, second.composite_score);
        assert_eq!(first.verdict, second.verdict);
        for (a, b) in first.categories.iter().zip(&second.categories) {
            assert_eq!(a.category, b.category);
            assert_eq!(a.mean_score, b.mean_score);
        }
    }

    #[test]
    fn grouping_preserves_rubric_order() {
        let rubric = unweighted_rubric(&[("Z", 1), ("A", 1), ("M", 1)]);
        let results = vec![ok("Z", 1), ok("A", 2), ok("M", 3)];

        let agg = aggregate(&rubric, &results, Coverage::Complete).unwrap();
        let names: Vec<&str> = agg.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, ["Z", "A", "M"]);
    }

    #[test]
    fn complete_coverage_rejects_count_mismatch() {
        let rubric = unweighted_rubric(&[("A", 2)]);
        let err = aggregate(&rubric, &[ok("A", 2)], Coverage::Complete).unwrap_err();
        assert!(matches!(err, AggregationError::ResultCountMismatch { .. }));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let rubric = unweighted_rubric(&[("A", 1)]);
        let err = aggregate(&rubric, &[ok("X", 2)], Coverage::Complete).unwrap_err();
        assert!(matches!(err, AggregationError::UnknownCategory(_)));
    }

    #[test]
    fn partial_coverage_skips_unreached_categories() {
        let rubric = unweighted_rubric(&[("A", 1), ("B", 1)]);
        let agg = aggregate(&rubric, &[ok("A", 3)], Coverage::Partial).unwrap();
        assert_eq!(agg.categories.len(), 1);
        assert_eq!(agg.categories[0].category, "A");
        assert!((agg.composite_score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn verdict_band_examples() {
        let rubric = unweighted_rubric(&[("A", 1)]);

        let agg = aggregate(&rubric, &[ok("A", 3)], Coverage::Complete).unwrap();
        assert_eq!(agg.verdict, Verdict::Excellent);

        let agg = aggregate(&rubric, &[ok("A", 1)], Coverage::Complete).unwrap();
        assert_eq!(agg.verdict, Verdict::Weak);
    }
}
