#![forbid(unsafe_code)]

//! # rubrikk
//!
//! LLM-assisted rubric scoring for grant and cluster applications.
//!
//! A rubric - ordered categories of questions on a fixed integer scale - is
//! driven question-by-question through an external scoring model. Each
//! response is parsed against a fixed two-field contract and validated
//! against the scale; failures degrade to zero-scored fallback rows instead
//! of aborting the run. The per-question scores fold into category means, a
//! composite score (mean-of-means, or weighted contributions for the cluster
//! rubric) and a qualitative verdict.

pub mod aggregate;
pub mod gateway;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod rubric;
pub mod scorer;

pub use aggregate::{aggregate, Aggregate, AggregationError, CategorySummary, Coverage};
pub use gateway::{
    Attribution, ChatGateway, ChatRequest, ChatResponse, Message, NoopUsageSink, OpenAiAdapter,
    ProviderError, ScoringGateway, StderrUsageSink,
};
pub use orchestrator::{
    score_rubric, CheckpointDecision, FailureNotice, OperatorCheckpoint, ProgressEvent,
    ProgressObserver, QuestionResult, RecoveryMode, RetryPolicy, RunHooks, RunOptions, RunStatus,
    ScoreStatus, ScoringOutcome,
};
pub use pipeline::{evaluate, EvaluationError, EvaluationRequest, EvaluationResult, DEFAULT_MODEL};
pub use rubric::{
    Category, ConfigurationError, Rubric, ScoreScale, Severity, Verdict, VerdictBands,
    RUBRIC_NAMES,
};
pub use scorer::{
    parse_score_response, QuestionScorer, ScoreError, ScoreQuery, ScoredAnswer, ScorerClient,
};
