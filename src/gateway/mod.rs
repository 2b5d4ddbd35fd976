//! Gateway for the external scoring provider (OpenAI chat completions).
//!
//! One logical request/response exchange per call. The gateway performs no
//! retries of its own - retry policy belongs to the evaluation orchestrator -
//! but it does record every call through a [`UsageSink`].

pub mod error;
pub mod openai;
pub mod types;
pub mod usage;

use std::sync::Arc;

use usage::{ScorerCallRecord, UsageSink as UsageSinkTrait};

pub use error::{ErrorContext, ProviderError};
pub use openai::OpenAiAdapter;
pub use types::*;
pub use usage::{CallStatus, NoopUsageSink, StderrUsageSink, UsageSink};

/// Trait for chat completion transports. Object-safe so callers can hold
/// `Arc<dyn ChatGateway>` and tests can substitute a stub.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Gateway wrapper that records per-call usage around an inner transport.
pub struct ScoringGateway<G, U: UsageSinkTrait> {
    inner: G,
    usage_sink: Arc<U>,
}

impl<U: UsageSinkTrait> ScoringGateway<OpenAiAdapter, U> {
    /// Build on the environment-configured OpenAI adapter. Fails fast when
    /// `OPENAI_API_KEY` is absent.
    pub fn from_env(usage_sink: Arc<U>) -> Result<Self, ProviderError> {
        Ok(Self {
            inner: OpenAiAdapter::from_env()?,
            usage_sink,
        })
    }
}

impl<G: ChatGateway, U: UsageSinkTrait> ScoringGateway<G, U> {
    pub fn new(inner: G, usage_sink: Arc<U>) -> Self {
        Self { inner, usage_sink }
    }
}

#[async_trait::async_trait]
impl<G: ChatGateway, U: UsageSinkTrait> ChatGateway for ScoringGateway<G, U> {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let record = ScorerCallRecord::new(req.model.clone(), req.attribution.caller)
            .run(req.attribution.run_id);

        match self.inner.chat(req).await {
            Ok(resp) => {
                let record = record
                    .tokens(resp.input_tokens, resp.output_tokens)
                    .latency(resp.latency.as_millis() as u64);
                self.usage_sink.record(record).await;
                Ok(resp)
            }
            Err(err) => {
                let record = record.error(err.kind());
                self.usage_sink.record(record).await;
                Err(err)
            }
        }
    }
}
