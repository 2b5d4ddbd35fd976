use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use rubrikk::gateway::{ChatGateway, OpenAiAdapter};
use rubrikk::orchestrator::{RetryPolicy, RunHooks, RunOptions};
use rubrikk::{
    evaluate, EvaluationError, EvaluationRequest, Rubric, ScoreStatus, Verdict,
};

fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": { "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 100, "completion_tokens": 20 }
    })
}

async fn gateway_for(server: &MockServer) -> Arc<dyn ChatGateway> {
    Arc::new(OpenAiAdapter::with_config("sk-test", server.uri(), Duration::from_secs(5)).unwrap())
}

fn no_retry() -> RunOptions {
    RunOptions {
        retry: RetryPolicy {
            max_retries: 0,
            base_delay: Duration::ZERO,
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn full_run_produces_complete_result_table() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("Score: 3\nKommentar: Svært godt beskrevet.")),
        )
        .mount(&server)
        .await;

    let request = EvaluationRequest::new("En lang og god søknadstekst.", "soknad.txt", "oppstart1");
    let result = evaluate(gateway_for(&server).await, request, RunHooks::default())
        .await
        .unwrap();

    let rubric = Rubric::by_name("oppstart1").unwrap();
    assert!(result.completed);
    assert_eq!(result.results.len(), rubric.question_count());
    assert_eq!(result.categories.len(), rubric.categories().len());
    assert_eq!(result.fallback_count(), 0);
    assert!((result.composite_score - 3.0).abs() < 1e-9);
    assert_eq!(result.verdict, Verdict::Excellent);
    assert!(result.narrative.contains("Utmerket"));
    assert_eq!(result.scale_max, 3);
    assert!(!result.weighted);

    // One provider call per rubric question.
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), rubric.question_count());
}

#[tokio::test]
async fn weighted_rubric_composites_on_percent_scale() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("Score: 4\nKommentar: Meget god beskrivelse.")),
        )
        .mount(&server)
        .await;

    let request = EvaluationRequest::new("Klyngesøknad.", "klynge.txt", "nic");
    let result = evaluate(gateway_for(&server).await, request, RunHooks::default())
        .await
        .unwrap();

    assert!(result.weighted);
    assert_eq!(result.scale_max, 4);
    // Every question at the scale maximum: contributions sum to the full
    // weight mass.
    assert!((result.composite_score - 100.0).abs() < 1e-9);
    assert_eq!(result.verdict, Verdict::Excellent);
    for category in &result.categories {
        assert!(category.weight.is_some());
        assert!(category.weighted_contribution.is_some());
    }
}

/// Fails exactly one call (the nth), succeeds otherwise.
struct FailNth {
    n: usize,
    calls: Arc<AtomicUsize>,
    success: ResponseTemplate,
}

impl Respond for FailNth {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.n {
            ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "upstream exploded" }
            }))
        } else {
            self.success.clone()
        }
    }
}

#[tokio::test]
async fn single_failure_yields_full_table_with_one_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(FailNth {
            n: 3,
            calls: Arc::new(AtomicUsize::new(0)),
            success: ResponseTemplate::new(200)
                .set_body_json(chat_body("Score: 2\nKommentar: Helt greit.")),
        })
        .mount(&server)
        .await;

    let request = EvaluationRequest::new("Søknad.", "soknad.txt", "oppstart1").options(no_retry());
    let result = evaluate(gateway_for(&server).await, request, RunHooks::default())
        .await
        .unwrap();

    let rubric = Rubric::by_name("oppstart1").unwrap();
    assert!(result.completed);
    assert_eq!(result.results.len(), rubric.question_count());
    assert_eq!(result.fallback_count(), 1);

    let fallback = result
        .results
        .iter()
        .find(|r| r.status == ScoreStatus::Fallback)
        .unwrap();
    assert_eq!(fallback.score, 0);
    assert!(fallback.comment.contains("transport_error"));

    // The forced zero drags the composite below the clean 2.0 average.
    assert!(result.composite_score < 2.0);

    // The affected category reports its reduced coverage.
    let affected = result
        .categories
        .iter()
        .find(|c| c.category == fallback.category)
        .unwrap();
    assert_eq!(affected.fallback_count, 1);
}

#[tokio::test]
async fn unknown_rubric_fails_before_any_network_call() {
    let server = MockServer::start().await;

    let request = EvaluationRequest::new("tekst", "x.txt", "finnes-ikke");
    let err = evaluate(gateway_for(&server).await, request, RunHooks::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EvaluationError::Config(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn result_serializes_to_json_for_downstream_formatters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_body("Score: 2\nKommentar: Ok.")),
        )
        .mount(&server)
        .await;

    let request = EvaluationRequest::new("tekst", "soknad.txt", "oppstart1");
    let result = evaluate(gateway_for(&server).await, request, RunHooks::default())
        .await
        .unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["rubric_name"], "oppstart1");
    assert_eq!(value["verdict"], "good");
    assert_eq!(value["completed"], true);
    assert!(value["results"].as_array().unwrap().len() > 0);
    assert_eq!(value["results"][0]["status"], "ok");
    assert_eq!(value["categories"][0]["mean_score"], 2.0);
}
