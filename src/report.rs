//! Plain-text and markdown rendering of evaluation results.
//!
//! Pure presentation: every number and severity code comes from the
//! aggregated result - this module performs no aggregation and owns no cut
//! points of its own.

use std::fmt::Write as _;

use crate::pipeline::EvaluationResult;
use crate::rubric::Severity;

fn severity_symbol(severity: Severity) -> &'static str {
    match severity {
        Severity::Strong => "🟢",
        Severity::Moderate => "🟡",
        Severity::Weak => "🔴",
    }
}

fn composite_display(result: &EvaluationResult) -> String {
    if result.weighted {
        format!("{:.1}/100", result.composite_score)
    } else {
        format!("{:.2}/{}.0", result.composite_score, result.scale_max)
    }
}

/// Console summary in the style of the original evaluation tool.
pub fn render_summary_text(result: &EvaluationResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n📈 SAMMENDRAG PER KATEGORI:");
    let _ = writeln!(out, "{}", "=".repeat(60));

    for category in &result.categories {
        let symbol = severity_symbol(category.severity);
        match (category.weight, category.weighted_contribution) {
            (Some(weight), Some(contribution)) => {
                let _ = writeln!(
                    out,
                    "{symbol} {}: {:.1}/{} (Vekt: {weight}%, Bidrag: {contribution:.1})",
                    category.category, category.mean_score, result.scale_max
                );
            }
            _ => {
                let _ = writeln!(
                    out,
                    "{symbol} {}: {:.2}/{}.0",
                    category.category, category.mean_score, result.scale_max
                );
            }
        }
        if category.fallback_count > 0 {
            let _ = writeln!(
                out,
                "   ⚠️  {} av {} spørsmål falt tilbake til score 0",
                category.fallback_count, category.question_count
            );
        }
    }

    let label = if result.weighted {
        "TOTAL VEKTET SCORE"
    } else {
        "TOTAL GJENNOMSNITTSSCORE"
    };
    let _ = writeln!(out, "\n🎯 {label}: {}", composite_display(result));
    let _ = writeln!(out, "{}", result.narrative);

    if !result.completed {
        let _ = writeln!(
            out,
            "\n🛑 Evalueringen ble avbrutt; resultatet dekker {} spørsmål.",
            result.results.len()
        );
    }

    out
}

/// Markdown report with category summary and the detailed result table.
pub fn render_report_markdown(result: &EvaluationResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}", result.rubric_title);
    let _ = writeln!(out);
    let _ = writeln!(out, "- Evaluert søknad: **{}**", md_escape(&result.document_name));
    let _ = writeln!(out, "- Total score: **{}**", composite_display(result));
    let _ = writeln!(out, "- Vurdering: {}", result.narrative);
    if !result.completed {
        let _ = writeln!(
            out,
            "- ⚠️ Avbrutt evaluering: dekker {} spørsmål",
            result.results.len()
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Sammendrag per kategori");
    let _ = writeln!(out);
    if result.weighted {
        let _ = writeln!(out, "| Kategori | Vekt (%) | Gj.snitt | Vektet bidrag | |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for c in &result.categories {
            let _ = writeln!(
                out,
                "| {} | {}% | {:.1}/{} | {:.1} | {} |",
                md_escape(&c.category),
                c.weight.unwrap_or(0.0),
                c.mean_score,
                result.scale_max,
                c.weighted_contribution.unwrap_or(0.0),
                severity_symbol(c.severity),
            );
        }
    } else {
        let _ = writeln!(out, "| Kategori | Gj.snitt | |");
        let _ = writeln!(out, "|---|---|---|");
        for c in &result.categories {
            let _ = writeln!(
                out,
                "| {} | {:.2}/{}.0 | {} |",
                md_escape(&c.category),
                c.mean_score,
                result.scale_max,
                severity_symbol(c.severity),
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Detaljerte resultater");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Kategori | Spørsmål | Score | Kommentar |");
    let _ = writeln!(out, "|---|---|---|---|");
    for r in &result.results {
        let _ = writeln!(
            out,
            "| {} | {} | {}/{} | {} |",
            md_escape(&r.category),
            md_escape(&r.question),
            r.score,
            result.scale_max,
            md_escape(&r.comment),
        );
    }

    out
}

fn md_escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CategorySummary;
    use crate::orchestrator::{QuestionResult, ScoreStatus};
    use crate::rubric::Verdict;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample(weighted: bool) -> EvaluationResult {
        EvaluationResult {
            run_id: Uuid::new_v4(),
            document_name: "soknad.txt".to_string(),
            rubric_name: if weighted { "nic" } else { "oppstart2" }.to_string(),
            rubric_title: "Testevaluering".to_string(),
            scale_max: if weighted { 4 } else { 3 },
            weighted,
            results: vec![
                QuestionResult {
                    category: "Kategori A".to_string(),
                    question: "Spørsmål | med strek".to_string(),
                    score: 2,
                    comment: "Greit nok".to_string(),
                    status: ScoreStatus::Ok,
                },
                QuestionResult {
                    category: "Kategori A".to_string(),
                    question: "Spørsmål to".to_string(),
                    score: 0,
                    comment: "Feil ved evaluering (transport_error): nede".to_string(),
                    status: ScoreStatus::Fallback,
                },
            ],
            categories: vec![CategorySummary {
                category: "Kategori A".to_string(),
                mean_score: 1.0,
                weight: weighted.then_some(30.0),
                weighted_contribution: weighted.then_some(7.5),
                question_count: 2,
                fallback_count: 1,
                severity: crate::rubric::Severity::Weak,
            }],
            composite_score: if weighted { 7.5 } else { 1.0 },
            verdict: Verdict::Weak,
            narrative: "Søknaden har betydelige svakheter som bør adresseres.".to_string(),
            completed: true,
            started_at: Utc::now(),
            elapsed_ms: 1234,
        }
    }

    #[test]
    fn text_summary_lists_categories_and_composite() {
        let out = render_summary_text(&sample(false));
        assert!(out.contains("Kategori A"));
        assert!(out.contains("TOTAL GJENNOMSNITTSSCORE: 1.00/3.0"));
        assert!(out.contains("falt tilbake"));
        assert!(out.contains("betydelige svakheter"));
    }

    #[test]
    fn weighted_summary_shows_weight_and_contribution() {
        let out = render_summary_text(&sample(true));
        assert!(out.contains("Vekt: 30%"));
        assert!(out.contains("Bidrag: 7.5"));
        assert!(out.contains("TOTAL VEKTET SCORE: 7.5/100"));
    }

    #[test]
    fn markdown_escapes_table_breaking_characters() {
        let out = render_report_markdown(&sample(false));
        assert!(out.contains("Spørsmål \\| med strek"));
        assert!(out.contains("## Detaljerte resultater"));
        assert!(out.contains("| Kategori | Spørsmål | Score | Kommentar |"));
    }
}
