//! Usage tracking via the UsageSink trait.
//!
//! The gateway logs every scorer call through a UsageSink, which decouples it
//! from any particular destination: the CLI uses StderrUsageSink or
//! NoopUsageSink, tests use NoopUsageSink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Status of a scorer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

/// Record of one call to the scoring provider.
#[derive(Debug, Clone)]
pub struct ScorerCallRecord {
    /// Model used.
    pub model: String,
    /// Which code path made this call.
    pub caller: &'static str,
    /// Evaluation run this call belongs to (if known).
    pub run_id: Option<Uuid>,
    /// Input tokens consumed.
    pub input_tokens: u32,
    /// Output tokens generated.
    pub output_tokens: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Call status.
    pub status: CallStatus,
    /// Error kind if status is Error.
    pub error_code: Option<String>,
    /// When the call was made.
    pub timestamp: DateTime<Utc>,
}

impl ScorerCallRecord {
    pub fn new(model: impl Into<String>, caller: &'static str) -> Self {
        Self {
            model: model.into(),
            caller,
            run_id: None,
            input_tokens: 0,
            output_tokens: 0,
            latency_ms: 0,
            status: CallStatus::Success,
            error_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn run(mut self, run_id: Option<Uuid>) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn tokens(mut self, input: u32, output: u32) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    pub fn latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn error(mut self, code: impl Into<String>) -> Self {
        self.status = CallStatus::Error;
        self.error_code = Some(code.into());
        self
    }
}

/// Trait for recording scorer call usage.
///
/// Recording is fire-and-forget: sink failures are logged, never propagated.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, record: ScorerCallRecord);
}

/// No-op usage sink that discards all records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageSink;

#[async_trait]
impl UsageSink for NoopUsageSink {
    async fn record(&self, _record: ScorerCallRecord) {
        // Discard
    }
}

/// Usage sink that writes one JSON line per call to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrUsageSink;

#[async_trait]
impl UsageSink for StderrUsageSink {
    async fn record(&self, record: ScorerCallRecord) {
        eprintln!(
            r#"{{"model":"{}","caller":"{}","tokens":{},"latency_ms":{},"status":"{}","error":{}}}"#,
            record.model,
            record.caller,
            record.input_tokens + record.output_tokens,
            record.latency_ms,
            record.status.as_str(),
            record
                .error_code
                .as_deref()
                .map(|c| format!("\"{c}\""))
                .unwrap_or_else(|| "null".to_string()),
        );
    }
}
