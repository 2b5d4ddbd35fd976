//! Top-level evaluation pipeline: one document against one rubric.
//!
//! Wires rubric lookup, scorer construction, orchestration and aggregation
//! into a single call, and stamps the result with run metadata. Fatal
//! precondition failures (unknown rubric, missing credential) surface before
//! any scoring starts; per-question failures are already absorbed by the
//! orchestrator.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::aggregate::{aggregate, AggregationError, CategorySummary, Coverage};
use crate::gateway::{Attribution, ChatGateway};
use crate::orchestrator::{
    score_rubric, QuestionResult, RunHooks, RunOptions, RunStatus,
};
use crate::rubric::{ConfigurationError, Rubric, Verdict};
use crate::scorer::ScorerClient;

/// Model used when the request does not override it.
pub const DEFAULT_MODEL: &str = "gpt-4o";

// =============================================================================
// Request / result
// =============================================================================

/// Everything needed to evaluate one document.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    /// Extracted application text. The pipeline treats it as opaque.
    pub document_text: String,
    /// Display name used for labeling only, never parsed.
    pub document_name: String,
    /// Built-in rubric name (see [`crate::rubric::RUBRIC_NAMES`]).
    pub rubric: String,
    /// Model override; defaults to [`DEFAULT_MODEL`].
    pub model: Option<String>,
    /// Recovery and retry configuration for the run.
    pub options: RunOptions,
}

impl EvaluationRequest {
    pub fn new(
        document_text: impl Into<String>,
        document_name: impl Into<String>,
        rubric: impl Into<String>,
    ) -> Self {
        Self {
            document_text: document_text.into(),
            document_name: document_name.into(),
            rubric: rubric.into(),
            model: None,
            options: RunOptions::default(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub run_id: Uuid,
    pub document_name: String,
    pub rubric_name: String,
    pub rubric_title: String,
    pub scale_max: u8,
    pub weighted: bool,
    /// One entry per scored question, in rubric order.
    pub results: Vec<QuestionResult>,
    /// One entry per covered category, in rubric order.
    pub categories: Vec<CategorySummary>,
    pub composite_score: f64,
    pub verdict: Verdict,
    /// Human-readable interpretation of the verdict.
    pub narrative: String,
    /// False only when the operator aborted mid-run; the tables then cover
    /// the questions answered before the abort.
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl EvaluationResult {
    pub fn fallback_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_fallback()).count()
    }
}

/// Fatal pipeline errors. Per-question scorer errors never reach this level.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

// =============================================================================
// Pipeline
// =============================================================================

/// Evaluate one document against one named rubric.
///
/// The gateway is injected so the caller owns credential validation and
/// lifecycle - the surrounding application builds it once per run, tests
/// substitute a mock endpoint.
pub async fn evaluate(
    gateway: Arc<dyn ChatGateway>,
    request: EvaluationRequest,
    hooks: RunHooks<'_>,
) -> Result<EvaluationResult, EvaluationError> {
    let rubric = Rubric::by_name(&request.rubric)?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let start = Instant::now();

    let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

    info!(
        run_id = %run_id,
        rubric = rubric.name(),
        model,
        document = %request.document_name,
        chars = request.document_text.len(),
        "evaluation started"
    );

    let scorer = ScorerClient::new(gateway, model, rubric.prompt(), rubric.scale())
        .with_attribution(Attribution::new("pipeline::evaluate").with_run(run_id));

    let outcome = score_rubric(
        &scorer,
        &rubric,
        &request.document_text,
        &request.options,
        hooks,
    )
    .await;

    let completed = outcome.status == RunStatus::Completed;
    let coverage = if completed {
        Coverage::Complete
    } else {
        Coverage::Partial
    };

    let agg = aggregate(&rubric, &outcome.results, coverage)?;

    info!(
        run_id = %run_id,
        composite = agg.composite_score,
        verdict = ?agg.verdict,
        fallbacks = outcome.fallback_count(),
        completed,
        "evaluation finished"
    );

    Ok(EvaluationResult {
        run_id,
        document_name: request.document_name,
        rubric_name: rubric.name().to_string(),
        rubric_title: rubric.title().to_string(),
        scale_max: rubric.scale().max,
        weighted: rubric.is_weighted(),
        results: outcome.results,
        categories: agg.categories,
        composite_score: agg.composite_score,
        verdict: agg.verdict,
        narrative: rubric.narrative(agg.verdict).to_string(),
        completed,
        started_at,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}
