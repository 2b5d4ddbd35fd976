//! Evaluation orchestrator: drives every (category, question) pair in rubric
//! order through a [`QuestionScorer`] and produces a gap-free result sequence
//! despite individual failures.
//!
//! Per-question errors never escape this module. A question whose scoring
//! fails - after the retry policy is exhausted - degrades to a Fallback
//! result with score 0; the run continues unless an attended operator decides
//! otherwise at the checkpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::rubric::{QuestionRef, Rubric};
use crate::scorer::{QuestionScorer, ScoreError, ScoreQuery};

/// Upper bound on the error message quoted in a fallback comment.
const MAX_FALLBACK_COMMENT_LEN: usize = 100;

// =============================================================================
// Results
// =============================================================================

/// How a question result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    /// Genuine scorer response.
    Ok,
    /// Produced by the recovery policy after a scoring failure.
    Fallback,
}

/// One scored question. Created once, immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub category: String,
    pub question: String,
    pub score: u8,
    pub comment: String,
    pub status: ScoreStatus,
}

impl QuestionResult {
    pub fn is_fallback(&self) -> bool {
        self.status == ScoreStatus::Fallback
    }
}

/// How a scoring run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every question in the rubric was processed.
    Completed,
    /// The operator aborted at a failure checkpoint; results are the ordered
    /// prefix gathered so far.
    AbortedByOperator,
}

/// Output of [`score_rubric`].
#[derive(Debug)]
pub struct ScoringOutcome {
    pub results: Vec<QuestionResult>,
    pub status: RunStatus,
}

impl ScoringOutcome {
    pub fn fallback_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_fallback()).count()
    }
}

// =============================================================================
// Run configuration
// =============================================================================

/// What happens after a question degrades to a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Keep going without asking anyone (service mode).
    #[default]
    AutoContinue,
    /// Consult the operator checkpoint before continuing (console mode).
    PauseForOperator,
}

/// Retry policy for retryable scorer errors (throttling, transport).
///
/// Retrying lives here rather than in the scorer client: the scorer makes
/// exactly one call per invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub recovery: RecoveryMode,
    pub retry: RetryPolicy,
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let multiplier = 2u64.pow(attempt.min(5));
    base * multiplier as u32
}

// =============================================================================
// Hooks
// =============================================================================

/// Details handed to the operator when a question has degraded to a fallback.
#[derive(Debug, Clone)]
pub struct FailureNotice<'a> {
    pub category: &'a str,
    pub question: &'a str,
    /// 1-based position within the run.
    pub position: usize,
    pub total: usize,
    pub error_kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointDecision {
    Continue,
    Abort,
}

/// Human-in-the-loop checkpoint consulted in `PauseForOperator` mode.
#[async_trait]
pub trait OperatorCheckpoint: Send + Sync {
    async fn on_failure(&self, notice: FailureNotice<'_>) -> CheckpointDecision;
}

/// Progress event for one scored question.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    /// 1-based position within the run.
    pub position: usize,
    pub total: usize,
    pub result: &'a QuestionResult,
}

/// Observer for progress reporting. Side effects only; never affects the run.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    async fn on_category_start(&self, _category: &str, _weight: Option<f64>) {}
    async fn on_question_scored(&self, _event: ProgressEvent<'_>) {}
}

/// Optional hooks wired by the front end. Defaults to fully unattended.
#[derive(Default, Clone, Copy)]
pub struct RunHooks<'a> {
    pub observer: Option<&'a dyn ProgressObserver>,
    pub checkpoint: Option<&'a dyn OperatorCheckpoint>,
}

// =============================================================================
// Orchestration
// =============================================================================

/// Drive the whole rubric through the scorer.
///
/// Guarantees: for a `Completed` run the output has exactly one result per
/// rubric question, in rubric order. An aborted run returns the ordered
/// prefix gathered so far, fallback included - completed work is never
/// discarded.
pub async fn score_rubric(
    scorer: &dyn QuestionScorer,
    rubric: &Rubric,
    document_text: &str,
    options: &RunOptions,
    hooks: RunHooks<'_>,
) -> ScoringOutcome {
    let total = rubric.question_count();
    let mut results: Vec<QuestionResult> = Vec::with_capacity(total);
    let mut current_category: Option<String> = None;

    info!(rubric = rubric.name(), total, "starting evaluation run");

    for (idx, pair) in rubric.questions().enumerate() {
        let position = idx + 1;

        if current_category.as_deref() != Some(pair.category) {
            current_category = Some(pair.category.to_string());
            if let Some(observer) = hooks.observer {
                observer.on_category_start(pair.category, pair.weight).await;
            }
        }

        let scored = score_with_retry(scorer, &pair, document_text, &options.retry).await;

        let (result, failure) = match scored {
            Ok(answer) => (
                QuestionResult {
                    category: pair.category.to_string(),
                    question: pair.question.to_string(),
                    score: answer.score,
                    comment: answer.comment,
                    status: ScoreStatus::Ok,
                },
                None,
            ),
            Err(err) => {
                warn!(
                    category = pair.category,
                    position,
                    kind = err.kind(),
                    error = %err,
                    "question degraded to fallback"
                );
                (fallback_result(&pair, &err), Some(err))
            }
        };

        if let Some(observer) = hooks.observer {
            observer
                .on_question_scored(ProgressEvent {
                    position,
                    total,
                    result: &result,
                })
                .await;
        }

        results.push(result);

        if let Some(err) = failure {
            if options.recovery == RecoveryMode::PauseForOperator {
                if let Some(checkpoint) = hooks.checkpoint {
                    let notice = FailureNotice {
                        category: pair.category,
                        question: pair.question,
                        position,
                        total,
                        error_kind: err.kind(),
                        message: err.to_string(),
                    };
                    if checkpoint.on_failure(notice).await == CheckpointDecision::Abort {
                        info!(position, total, "run aborted by operator");
                        return ScoringOutcome {
                            results,
                            status: RunStatus::AbortedByOperator,
                        };
                    }
                }
            }
        }
    }

    info!(total, fallbacks = results.iter().filter(|r| r.is_fallback()).count(), "evaluation run finished");

    ScoringOutcome {
        results,
        status: RunStatus::Completed,
    }
}

/// One question through the scorer, honoring the retry policy for retryable
/// error kinds. Provider throttling hints take precedence over the
/// exponential backoff.
async fn score_with_retry(
    scorer: &dyn QuestionScorer,
    pair: &QuestionRef<'_>,
    document_text: &str,
    retry: &RetryPolicy,
) -> Result<crate::scorer::ScoredAnswer, ScoreError> {
    let query = ScoreQuery {
        category: pair.category,
        question: pair.question,
        document_text,
    };

    let mut attempt = 0u32;
    loop {
        match scorer.score(query).await {
            Ok(answer) => return Ok(answer),
            Err(err) if err.is_retryable() && attempt < retry.max_retries => {
                let delay = err
                    .retry_after()
                    .unwrap_or_else(|| backoff_delay(retry.base_delay, attempt));
                warn!(
                    kind = err.kind(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying question after retryable error"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn fallback_result(pair: &QuestionRef<'_>, err: &ScoreError) -> QuestionResult {
    QuestionResult {
        category: pair.category.to_string(),
        question: pair.question.to_string(),
        score: 0,
        comment: format!(
            "Feil ved evaluering ({}): {}",
            err.kind(),
            truncated(&err.to_string(), MAX_FALLBACK_COMMENT_LEN)
        ),
        status: ScoreStatus::Fallback,
    }
}

fn truncated(message: &str, max_len: usize) -> String {
    if message.len() <= max_len {
        return message.to_string();
    }
    let mut end = max_len;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
        // Exponent is capped, not unbounded.
        assert_eq!(backoff_delay(base, 50), backoff_delay(base, 5));
    }

    #[test]
    fn truncation_is_bounded_and_utf8_safe() {
        assert_eq!(truncated("kort", 100), "kort");

        let long = "x".repeat(250);
        let out = truncated(&long, 100);
        assert_eq!(out.len(), 103);
        assert!(out.ends_with("..."));

        // Multi-byte boundary must not be split.
        let no = "æøå".repeat(60);
        let out = truncated(&no, 100);
        assert!(out.ends_with("..."));
        assert!(out.is_char_boundary(out.len() - 3));
    }
}
