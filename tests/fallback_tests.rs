use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tripcast::{
    AdvisorError, ChatMessage, DefaultPromptComposer, FallbackOrchestrator, PromptComposer,
    Provider, Result,
};

/// Scripted provider that records the order in which it was called.
#[derive(Debug)]
struct MockProvider {
    name: &'static str,
    behavior: Behavior,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

#[derive(Debug, Clone)]
enum Behavior {
    Answer(&'static str),
    Fail(&'static str),
    Hang,
}

#[async_trait]
impl Provider for MockProvider {
    fn identity(&self) -> &str {
        self.name
    }

    fn composer(&self) -> &dyn PromptComposer {
        &DefaultPromptComposer
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(self.name);
        match self.behavior {
            Behavior::Answer(text) => Ok(text.to_string()),
            Behavior::Fail(reason) => Err(AdvisorError::Api {
                provider: self.name.to_string(),
                status: 503,
                message: reason.to_string(),
            }),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

fn orchestrator(
    script: &[(&'static str, Behavior)],
) -> (FallbackOrchestrator, Arc<Mutex<Vec<&'static str>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let providers = script
        .iter()
        .map(|(name, behavior)| {
            Arc::new(MockProvider {
                name: *name,
                behavior: behavior.clone(),
                calls: Arc::clone(&calls),
            }) as Arc<dyn Provider>
        })
        .collect();
    (FallbackOrchestrator::new(providers), calls)
}

async fn ask(provider: Arc<dyn Provider>) -> Result<String> {
    provider.complete(&[ChatMessage::user("hello")]).await
}

#[tokio::test]
async fn test_second_provider_answers_after_first_fails() {
    let (chain, calls) = orchestrator(&[
        ("primary", Behavior::Fail("unavailable")),
        ("secondary", Behavior::Answer("from secondary")),
        ("tertiary", Behavior::Answer("from tertiary")),
    ]);

    let attempt = chain.run(ask).await.unwrap();

    assert_eq!(attempt.value, "from secondary");
    assert_eq!(attempt.provider, "secondary");
    assert_eq!(attempt.failures.len(), 1);
    assert_eq!(attempt.failures[0].provider_name, "primary");
    assert!(attempt.failures[0].reason.contains("unavailable"));
    assert_eq!(*calls.lock().unwrap(), vec!["primary", "secondary"]);
}

#[tokio::test]
async fn test_exhaustion_reports_every_failure_in_order() {
    let (chain, calls) = orchestrator(&[
        ("one", Behavior::Fail("auth")),
        ("two", Behavior::Fail("quota")),
    ]);

    let err = chain.run(ask).await.unwrap_err();

    let reasons: Vec<String> = err
        .provider_failures()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(reasons.len(), 2);
    assert!(reasons[0].starts_with("one: "));
    assert!(reasons[1].starts_with("two: "));
    assert!(err.to_string().starts_with("All AI providers failed. Errors:"));
    assert_eq!(*calls.lock().unwrap(), vec!["one", "two"]);
}

#[tokio::test]
async fn test_hung_provider_times_out_and_chain_continues() {
    let (chain, calls) = orchestrator(&[
        ("stuck", Behavior::Hang),
        ("backup", Behavior::Answer("made it")),
    ]);
    let chain = chain.with_attempt_timeout(Some(Duration::from_millis(50)));

    let attempt = chain.run(ask).await.unwrap();

    assert_eq!(attempt.value, "made it");
    assert_eq!(attempt.failures.len(), 1);
    assert!(attempt.failures[0].reason.starts_with("Timeout error"));
    assert_eq!(*calls.lock().unwrap(), vec!["stuck", "backup"]);
}

#[tokio::test]
async fn test_operation_errors_advance_like_transport_errors() {
    let (chain, _calls) = orchestrator(&[
        ("picky", Behavior::Answer("not json")),
        ("tidy", Behavior::Answer("{\"ok\":true}")),
    ]);
    let invocations = AtomicUsize::new(0);

    let attempt = chain
        .run(|provider| {
            invocations.fetch_add(1, Ordering::SeqCst);
            async move {
                let text = ask(provider).await?;
                let value: serde_json::Value = serde_json::from_str(&text)?;
                Ok::<_, AdvisorError>(value)
            }
        })
        .await
        .unwrap();

    assert_eq!(attempt.value["ok"], true);
    assert_eq!(attempt.provider, "tidy");
    assert_eq!(invocations.load(Ordering::SeqCst), 2);
    assert!(attempt.failures[0].reason.starts_with("Serialization error"));
}
