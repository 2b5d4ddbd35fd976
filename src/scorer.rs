//! Scorer client: one question plus the document text in, one validated
//! (score, comment) pair out.
//!
//! Implements the contract between the provider's free-text response and the
//! typed results the orchestrator accumulates. Stateless; safe to invoke
//! concurrently; never retries on its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::gateway::{Attribution, ChatGateway, ChatRequest, ProviderError};
use crate::prompts::ScorePrompt;
use crate::rubric::ScoreScale;

/// Longest response excerpt quoted in a parse error.
const ERROR_SNIPPET_LEN: usize = 160;

// =============================================================================
// Errors
// =============================================================================

/// Error from a single scoring attempt.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The provider call itself failed (auth, throttling, transport, payload).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered, but not in the required two-field format, or
    /// with a score outside the rubric's scale.
    #[error("malformed scorer response: {0}")]
    ResponseFormat(String),
}

impl ScoreError {
    /// Short error kind used in fallback comments and usage records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.kind(),
            Self::ResponseFormat(_) => "response_format",
        }
    }

    /// Whether retrying the same question can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::ResponseFormat(_) => false,
        }
    }

    /// Provider throttling hint, when present.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Provider(e) => e.retry_after(),
            Self::ResponseFormat(_) => None,
        }
    }
}

// =============================================================================
// Scoring contract
// =============================================================================

/// One question to score against one document.
#[derive(Debug, Clone, Copy)]
pub struct ScoreQuery<'a> {
    pub category: &'a str,
    pub question: &'a str,
    pub document_text: &'a str,
}

/// A validated answer from the scorer.
#[derive(Debug, Clone)]
pub struct ScoredAnswer {
    pub score: u8,
    pub comment: String,
}

/// Seam between the orchestrator and the external judgment service. Tests
/// substitute a stub; production wires [`ScorerClient`].
#[async_trait]
pub trait QuestionScorer: Send + Sync {
    async fn score(&self, query: ScoreQuery<'_>) -> Result<ScoredAnswer, ScoreError>;
}

// =============================================================================
// Scorer client
// =============================================================================

/// Production scorer: renders the rubric's prompt, makes one gateway call,
/// parses and validates the response.
pub struct ScorerClient {
    gateway: Arc<dyn ChatGateway>,
    model: String,
    prompt: ScorePrompt,
    scale: ScoreScale,
    attribution: Attribution,
}

impl ScorerClient {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        model: impl Into<String>,
        prompt: ScorePrompt,
        scale: ScoreScale,
    ) -> Self {
        Self {
            gateway,
            model: model.into(),
            prompt,
            scale,
            attribution: Attribution::new("scorer::question"),
        }
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl QuestionScorer for ScorerClient {
    async fn score(&self, query: ScoreQuery<'_>) -> Result<ScoredAnswer, ScoreError> {
        let instance = self.prompt.render(
            query.category,
            query.question,
            query.document_text,
            self.scale.max,
            self.scale.guide,
        );

        let request = ChatRequest::new(&self.model, instance.to_messages(), self.attribution)
            .temperature(self.prompt.temperature)
            .max_tokens(self.prompt.max_tokens);

        let response = self.gateway.chat(request).await?;

        debug!(
            template = %instance.template_slug,
            output_tokens = response.output_tokens,
            latency_ms = response.latency.as_millis() as u64,
            "scorer response received"
        );

        parse_score_response(
            &response.content,
            self.prompt.score_marker,
            self.prompt.comment_marker,
            self.scale.max,
        )
    }
}

// =============================================================================
// Response parsing
// =============================================================================

/// Parse a scorer response in the fixed two-field format.
///
/// The first line starting with the score marker and the first line starting
/// with the comment marker are used; anything else in the response is
/// ignored. The score must be an integer within `[0, scale_max]`.
pub fn parse_score_response(
    raw: &str,
    score_marker: &str,
    comment_marker: &str,
    scale_max: u8,
) -> Result<ScoredAnswer, ScoreError> {
    let score_field = first_marked_line(raw, score_marker).ok_or_else(|| {
        ScoreError::ResponseFormat(format!(
            "missing '{score_marker}' line in response: {}",
            snippet(raw)
        ))
    })?;

    let comment = first_marked_line(raw, comment_marker).ok_or_else(|| {
        ScoreError::ResponseFormat(format!(
            "missing '{comment_marker}' line in response: {}",
            snippet(raw)
        ))
    })?;

    let score: i64 = score_field.parse().map_err(|_| {
        ScoreError::ResponseFormat(format!("score is not an integer: '{score_field}'"))
    })?;

    if !(0..=scale_max as i64).contains(&score) {
        return Err(ScoreError::ResponseFormat(format!(
            "score {score} outside scale 0-{scale_max}"
        )));
    }

    Ok(ScoredAnswer {
        score: score as u8,
        comment: comment.to_string(),
    })
}

/// First line starting with `marker`, with the marker stripped and the rest
/// trimmed. Colons inside the field are preserved.
fn first_marked_line<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    raw.lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix(marker))
        .map(str::trim)
}

fn snippet(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() <= ERROR_SNIPPET_LEN {
        trimmed.to_string()
    } else {
        let mut end = ERROR_SNIPPET_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<ScoredAnswer, ScoreError> {
        parse_score_response(raw, "Score:", "Kommentar:", 3)
    }

    #[test]
    fn parses_wellformed_response() {
        let answer = parse("Score: 2\nKommentar: Godt beskrevet, men mangler tall.").unwrap();
        assert_eq!(answer.score, 2);
        assert_eq!(answer.comment, "Godt beskrevet, men mangler tall.");
    }

    #[test]
    fn ignores_surrounding_prose() {
        let raw = "Her er min vurdering:\n\nScore: 3\nKommentar: Utmerket.\nHåper det hjelper!";
        let answer = parse(raw).unwrap();
        assert_eq!(answer.score, 3);
        assert_eq!(answer.comment, "Utmerket.");
    }

    #[test]
    fn preserves_colons_inside_comment() {
        let answer = parse("Score: 1\nKommentar: Mangler: budsjett, team og marked.").unwrap();
        assert_eq!(answer.comment, "Mangler: budsjett, team og marked.");
    }

    #[test]
    fn missing_score_line_is_format_error() {
        let err = parse("Kommentar: fin søknad").unwrap_err();
        assert!(matches!(err, ScoreError::ResponseFormat(_)));
        assert_eq!(err.kind(), "response_format");
    }

    #[test]
    fn missing_comment_line_is_format_error() {
        let err = parse("Score: 2").unwrap_err();
        assert!(matches!(err, ScoreError::ResponseFormat(_)));
    }

    #[test]
    fn non_numeric_score_is_format_error() {
        let err = parse("Score: to av tre\nKommentar: ok").unwrap_err();
        assert!(matches!(err, ScoreError::ResponseFormat(_)));
    }

    #[test]
    fn out_of_range_score_is_format_error() {
        let err = parse("Score: 9\nKommentar: ok").unwrap_err();
        let ScoreError::ResponseFormat(msg) = err else {
            panic!("expected ResponseFormat");
        };
        assert!(msg.contains("outside scale"));

        // 4 is valid on the cluster scale but not on 0-3.
        assert!(parse("Score: 4\nKommentar: ok").is_err());
        assert!(parse_score_response("Score: 4\nKommentar: ok", "Score:", "Kommentar:", 4).is_ok());
    }

    #[test]
    fn negative_score_is_format_error() {
        let err = parse("Score: -1\nKommentar: ok").unwrap_err();
        assert!(matches!(err, ScoreError::ResponseFormat(_)));
    }

    #[test]
    fn format_error_is_not_retryable() {
        let err = parse("nonsense").unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.retry_after().is_none());
    }
}
