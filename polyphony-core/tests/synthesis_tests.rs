//! Synthesis engine tests

mod support;

use std::sync::Arc;
use std::time::Duration;

use polyphony_core::{Message, SynthesisError, UsageLimits};
use support::{Harness, MockProvider, Script};

fn seed_reply(harness: &Harness, model: &str, content: &str) {
    harness.store.ensure(model);
    harness.store.append(model, Message::user("hi"));
    harness.store.append(model, Message::assistant(content));
}

#[tokio::test(flavor = "multi_thread")]
async fn two_qualifying_models_produce_a_result() {
    let provider =
        MockProvider::new().script("synthesizer", Script::Chunks(vec!["merged ", "answer"]));
    let harness = Harness::with_defaults(provider);
    seed_reply(&harness, "chatgpt", "first view");
    seed_reply(&harness, "claude", "second view");

    harness
        .synthesis
        .synthesize(&["chatgpt".to_string(), "claude".to_string()])
        .await
        .unwrap();

    let result = harness.synthesis.result().unwrap();
    assert_eq!(result.content, "merged answer");
    assert_eq!(result.source_model_names.len(), 2);
    assert!(result.source_model_names.contains(&"ChatGPT".to_string()));
    assert!(result.source_model_names.contains(&"Claude".to_string()));
    assert_eq!(harness.usage.cached().synthesis_count, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn one_qualifying_model_is_not_enough() {
    let provider = MockProvider::new().script("synthesizer", Script::Chunks(vec!["merged"]));
    let harness = Harness::with_defaults(provider);
    seed_reply(&harness, "chatgpt", "first view");
    seed_reply(&harness, "claude", "second view");

    // Produce a result, then try again with only one qualifying model.
    harness
        .synthesis
        .synthesize(&["chatgpt".to_string(), "claude".to_string()])
        .await
        .unwrap();
    let before = harness.synthesis.result().unwrap();

    let result = harness
        .synthesis
        .synthesize(&["chatgpt".to_string()])
        .await;

    assert!(matches!(
        result,
        Err(SynthesisError::InsufficientResponses { available: 1 })
    ));
    // The previous result survives a failed attempt.
    assert_eq!(harness.synthesis.result().unwrap(), before);
    assert_eq!(harness.usage.cached().synthesis_count, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_placeholder_replies_do_not_qualify() {
    let provider = MockProvider::new().script("synthesizer", Script::Chunks(vec!["merged"]));
    let harness = Harness::with_defaults(provider);
    seed_reply(&harness, "chatgpt", "real reply");
    // A still-streaming pane: placeholder with no content yet.
    harness.store.ensure("claude");
    harness.store.append("claude", Message::user("hi"));
    harness
        .store
        .append("claude", Message::assistant_placeholder());

    let result = harness
        .synthesis
        .synthesize(&["chatgpt".to_string(), "claude".to_string()])
        .await;

    assert!(matches!(
        result,
        Err(SynthesisError::InsufficientResponses { available: 1 })
    ));
    assert_eq!(harness.provider.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn quota_exceeded_blocks_the_request() {
    let provider = MockProvider::new().script("synthesizer", Script::Chunks(vec!["merged"]));
    let harness = Harness::new(
        provider,
        UsageLimits {
            llm_prompt_limit: 50,
            synthesize_limit: 1,
        },
    );
    seed_reply(&harness, "chatgpt", "first view");
    seed_reply(&harness, "claude", "second view");

    let targets = vec!["chatgpt".to_string(), "claude".to_string()];
    harness.synthesis.synthesize(&targets).await.unwrap();

    let result = harness.synthesis.synthesize(&targets).await;

    assert!(matches!(result, Err(SynthesisError::QuotaExceeded { .. })));
    assert_eq!(harness.provider.call_count(), 1);
    assert_eq!(harness.usage.cached().synthesis_count, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_synthesis_is_rejected_as_busy() {
    let provider = MockProvider::new().script(
        "synthesizer",
        Script::SlowChunks(vec!["slow ", "merge"], Duration::from_millis(50)),
    );
    let harness = Arc::new(Harness::with_defaults(provider));
    seed_reply(&harness, "chatgpt", "first view");
    seed_reply(&harness, "claude", "second view");

    let targets = vec!["chatgpt".to_string(), "claude".to_string()];
    let first = {
        let harness = harness.clone();
        let targets = targets.clone();
        tokio::spawn(async move { harness.synthesis.synthesize(&targets).await })
    };

    // Let the first request reach its in-flight state.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = harness.synthesis.synthesize(&targets).await;

    assert!(matches!(second, Err(SynthesisError::Busy)));
    first.await.unwrap().unwrap();
    // Only the first request counted against the quota.
    assert_eq!(harness.usage.cached().synthesis_count, 1);
    assert_eq!(harness.synthesis.result().unwrap().content, "slow merge");
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_failure_mutates_nothing() {
    let provider = MockProvider::new().script("synthesizer", Script::Fail);
    let harness = Harness::with_defaults(provider);
    seed_reply(&harness, "chatgpt", "first view");
    seed_reply(&harness, "claude", "second view");

    let result = harness
        .synthesis
        .synthesize(&["chatgpt".to_string(), "claude".to_string()])
        .await;

    assert!(matches!(result, Err(SynthesisError::Provider(_))));
    assert!(harness.synthesis.result().is_none());
    assert_eq!(harness.usage.cached().synthesis_count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn dismiss_clears_the_result() {
    let provider = MockProvider::new().script("synthesizer", Script::Chunks(vec!["merged"]));
    let harness = Harness::with_defaults(provider);
    seed_reply(&harness, "chatgpt", "first view");
    seed_reply(&harness, "claude", "second view");

    harness
        .synthesis
        .synthesize(&["chatgpt".to_string(), "claude".to_string()])
        .await
        .unwrap();
    assert!(harness.synthesis.result().is_some());

    harness.synthesis.dismiss();
    assert!(harness.synthesis.result().is_none());
}
