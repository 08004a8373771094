use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use consensus_harness::labeler::{
    extract_components, ChatLabeler, HttpLabeler, LabelerConfig, LabelerError, Provider,
};
use consensus_harness::StatementKind;

fn labeler(provider: Provider, server: &MockServer) -> HttpLabeler {
    HttpLabeler::with_config(LabelerConfig::new(provider), "sk-test", server.uri()).unwrap()
}

#[tokio::test]
async fn openai_chat_parses_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4.1-2025-04-14"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "{\"A\": [\"commission\"]}" } }]
        })))
        .mount(&server)
        .await;

    let resp = labeler(Provider::OpenAi, &server)
        .chat("system", "The commission shall act.")
        .await
        .unwrap();
    assert_eq!(resp, "{\"A\": [\"commission\"]}");
}

#[tokio::test]
async fn anthropic_messages_parses_text_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "{\"D\": [\"shall\"]}" }]
        })))
        .mount(&server)
        .await;

    let resp = labeler(Provider::Claude, &server)
        .chat("system", "user")
        .await
        .unwrap();
    assert_eq!(resp, "{\"D\": [\"shall\"]}");
}

#[tokio::test]
async fn gemini_generate_parses_candidate_part() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"I\": [\"act\"]}" }] } }]
        })))
        .mount(&server)
        .await;

    let resp = labeler(Provider::Gemini, &server)
        .chat("system", "user")
        .await
        .unwrap();
    assert_eq!(resp, "{\"I\": [\"act\"]}");
}

#[tokio::test]
async fn provider_error_payload_surfaces_as_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "rate limit exceeded" }
        })))
        .mount(&server)
        .await;

    let err = labeler(Provider::OpenAi, &server)
        .chat("system", "user")
        .await
        .unwrap_err();
    match err {
        LabelerError::Provider { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.contains("rate limit"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_completion_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "" } }]
        })))
        .mount(&server)
        .await;

    let err = labeler(Provider::OpenAi, &server)
        .chat("system", "user")
        .await
        .unwrap_err();
    assert!(matches!(err, LabelerError::EmptyResponse));
}

/// Responds with garbage first, then valid JSON wrapped in a fence.
struct FlakyLabeler;

impl Respond for FlakyLabeler {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let call = CALLS.fetch_add(1, Ordering::SeqCst);
        let content = if call == 0 {
            "Sorry, here is prose without any JSON."
        } else {
            "```json\n{\"A\": [\"commission\"], \"D\": [\"shall\"]}\n```"
        };
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": content } }]
        }))
    }
}

#[tokio::test]
async fn extraction_retries_unparseable_output_and_collects_runs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(FlakyLabeler)
        .mount(&server)
        .await;

    let labeler = labeler(Provider::OpenAi, &server);
    let runs = extract_components(
        &labeler,
        StatementKind::Regulative,
        "system",
        None,
        "The commission shall act.",
        2,
    )
    .await
    .unwrap();

    assert_eq!(runs.len(), 2);
    for run in &runs {
        assert_eq!(run["A"], vec!["commission"]);
        assert_eq!(run["D"], vec!["shall"]);
    }
}

const LO_PROMPT: &str = "Combine coordinated conditions with [AND].";

/// Answers the refinement call (recognized by its system text) with a
/// combined-condition mapping, and the first pass with split conditions.
struct LogicAwareLabeler;

impl Respond for LogicAwareLabeler {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let system = body["messages"][0]["content"].as_str().unwrap_or_default();
        let content = if system == LO_PROMPT {
            let user = body["messages"][1]["content"].as_str().unwrap_or_default();
            assert!(user.starts_with("Input: "));
            assert!(user.contains("if approved"));
            r#"{"A": ["commission"], "Cac": ["if approved [AND] if funded"]}"#
        } else {
            r#"{"A": ["commission"], "Cac": ["if approved", "if funded"]}"#
        };
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": content } }]
        }))
    }
}

#[tokio::test]
async fn logic_pass_replaces_the_first_extraction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(LogicAwareLabeler)
        .mount(&server)
        .await;

    let labeler = labeler(Provider::OpenAi, &server);
    let runs = extract_components(
        &labeler,
        StatementKind::Regulative,
        "system",
        Some(LO_PROMPT),
        "The commission shall act if approved and if funded.",
        1,
    )
    .await
    .unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["Cac"], vec!["if approved [AND] if funded"]);
}

/// First pass is always valid JSON; the refinement call never is.
struct BrokenLogicLabeler;

impl Respond for BrokenLogicLabeler {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let system = body["messages"][0]["content"].as_str().unwrap_or_default();
        let content = if system == LO_PROMPT {
            "prose, not a mapping"
        } else {
            r#"{"A": ["commission"]}"#
        };
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": content } }]
        }))
    }
}

#[tokio::test]
async fn unparseable_logic_pass_spends_the_attempt_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(BrokenLogicLabeler)
        .mount(&server)
        .await;

    let labeler = labeler(Provider::OpenAi, &server);
    let err = extract_components(
        &labeler,
        StatementKind::Regulative,
        "system",
        Some(LO_PROMPT),
        "input",
        1,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        LabelerError::TooManyParseFailures { attempts: 10, runs: 1 }
    ));
}

#[tokio::test]
async fn extraction_gives_up_after_the_attempt_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "never valid json" } }]
        })))
        .mount(&server)
        .await;

    let labeler = labeler(Provider::OpenAi, &server);
    let err = extract_components(&labeler, StatementKind::Regulative, "system", None, "input", 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LabelerError::TooManyParseFailures { attempts: 10, runs: 1 }
    ));
}
