//! End-to-end coordinator behavior against scripted providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use paper_analyzer::agent::prompt::{
    JUDGE_SYSTEM_PROMPT, KEY_FINDINGS_SYSTEM_PROMPT, RECOMMENDATION_SYSTEM_PROMPT,
    RELATED_WORK_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use paper_analyzer::agent::{
    AgentConfig, AnalysisEvent, AnalysisObserver, AnalysisStatus, ChatRequest, ChatResponse,
    Coordinator, DispatchMode, Document, DocumentState, Facet, FacetOutcome, FragmentStream,
    LlmProvider, PromptSet, Role, TokenUsage,
};
use paper_analyzer::error::{AgentError, FailureKind};

const VERDICT: &str = r#"{"faithfulness_score": 5, "faithfulness_reasoning": "faithful",
"clarity_score": 4, "clarity_reasoning": "clear"}"#;

/// Echoes `[system] user`, answers judge calls with a fixed verdict, and
/// fails any call whose system prompt is in `fail_on` or whose user
/// message contains `FAIL`.
struct EchoProvider {
    calls: AtomicUsize,
    fail_on: Vec<&'static str>,
    systems: Mutex<Vec<String>>,
}

impl EchoProvider {
    fn new() -> Self {
        Self::failing_on(Vec::new())
    }

    fn failing_on(fail_on: Vec<&'static str>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
            systems: Mutex::new(Vec::new()),
        }
    }

    fn reply(&self, request: &ChatRequest) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = |role: Role| {
            request
                .messages
                .iter()
                .find(|m| m.role == role)
                .map(|m| m.content.clone())
                .unwrap_or_default()
        };
        let system = content(Role::System);
        self.systems
            .lock()
            .unwrap_or_else(|_| unreachable!())
            .push(system.clone());

        if self.fail_on.contains(&system.as_str()) || content(Role::User).contains("FAIL") {
            return Err(AgentError::ApiRequest {
                message: "503 Service Unavailable".to_string(),
                status: Some(503),
            });
        }
        if request.json_mode {
            return Ok(VERDICT.to_string());
        }
        Ok(format!("[{system}] {}", content(Role::User)))
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn systems(&self) -> Vec<String> {
        self.systems
            .lock()
            .unwrap_or_else(|_| unreachable!())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        Ok(ChatResponse {
            content: self.reply(request)?,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream, AgentError> {
        let text = self.reply(request)?;
        // Uneven fragments, including an empty one.
        let mut fragments: Vec<Result<String, AgentError>> = Vec::new();
        let mut rest = text.as_str();
        let mut width = 1;
        while !rest.is_empty() {
            let mut cut = width.min(rest.len());
            while !rest.is_char_boundary(cut) {
                cut += 1;
            }
            let (head, tail) = rest.split_at(cut);
            fragments.push(Ok(head.to_string()));
            fragments.push(Ok(String::new()));
            rest = tail;
            width = width % 7 + 1;
        }
        Ok(Box::pin(futures_util::stream::iter(fragments)))
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<AnalysisEvent>>,
}

impl AnalysisObserver for Recorder {
    fn on_event(&self, event: &AnalysisEvent) {
        self.events
            .lock()
            .unwrap_or_else(|_| unreachable!())
            .push(event.clone());
    }
}

impl Recorder {
    fn states(&self) -> Vec<DocumentState> {
        self.events
            .lock()
            .unwrap_or_else(|_| unreachable!())
            .iter()
            .filter_map(|e| match e {
                AnalysisEvent::StateChanged { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }
}

fn config() -> paper_analyzer::agent::config::AgentConfigBuilder {
    AgentConfig::builder()
        .api_key("test-key")
        .request_delay(Duration::ZERO)
        .document_delay(Duration::ZERO)
}

fn coordinator(provider: &Arc<EchoProvider>, config: AgentConfig) -> Coordinator {
    Coordinator::builder(Arc::clone(provider) as Arc<dyn LlmProvider>, config)
        .prompts(PromptSet::defaults())
        .build()
        .unwrap_or_else(|e| unreachable!("{e}"))
}

fn document() -> Document {
    Document::new("T", "L", "A mock abstract about X.")
}

fn expected_summary() -> String {
    format!("[{SUMMARY_SYSTEM_PROMPT}] A mock abstract about X.")
}

#[tokio::test]
async fn test_echo_scenario() {
    let provider = Arc::new(EchoProvider::new());
    let coordinator = coordinator(&provider, config().build().unwrap_or_else(|_| unreachable!()));

    let result = coordinator.analyze_document(&document()).await;

    assert_eq!(result.status, AnalysisStatus::Complete);
    assert_eq!(result.title, "T");
    assert_eq!(result.link, "L");
    assert_eq!(result.original_abstract, "A mock abstract about X.");
    assert_eq!(result.text(Facet::Summary), Some(expected_summary().as_str()));

    let summary = expected_summary();
    assert_eq!(
        result.text(Facet::KeyFindings),
        Some(format!("[{KEY_FINDINGS_SYSTEM_PROMPT}] {summary}").as_str())
    );
    assert_eq!(
        result.text(Facet::Recommendation),
        Some(format!("[{RECOMMENDATION_SYSTEM_PROMPT}] {summary}").as_str())
    );

    let verdict = result.verdict().unwrap_or_else(|| unreachable!());
    assert_eq!(verdict.faithfulness_score, 5);
    assert_eq!(verdict.clarity_score, 4);

    assert_eq!(provider.call_count(), 9);
    assert_eq!(result.usage.total_tokens, 9 * 15);
}

#[tokio::test]
async fn test_success_has_nine_non_empty_fields() {
    let provider = Arc::new(EchoProvider::new());
    let coordinator = coordinator(&provider, config().build().unwrap_or_else(|_| unreachable!()));

    let result = coordinator.analyze_document(&document()).await;
    assert_eq!(result.facets.len(), 9);
    for facet in Facet::ALL {
        let text = result.text(facet).unwrap_or_default();
        assert!(!text.trim().is_empty(), "{facet} is empty");
    }

    let json = serde_json::to_value(&result).unwrap_or_else(|_| unreachable!());
    for facet in Facet::ALL {
        assert_eq!(json[facet.key()]["status"], "completed");
    }
    assert_eq!(json["evaluation"]["verdict"]["clarity_score"], 4);
}

#[tokio::test]
async fn test_summary_runs_before_every_other_facet() {
    let provider = Arc::new(EchoProvider::new());
    let recorder = Arc::new(Recorder::default());
    let coordinator = Coordinator::builder(
        Arc::clone(&provider) as Arc<dyn LlmProvider>,
        config()
            .max_concurrency(8)
            .build()
            .unwrap_or_else(|_| unreachable!()),
    )
    .prompts(PromptSet::defaults())
    .observer(Arc::clone(&recorder) as Arc<dyn AnalysisObserver>)
    .build()
    .unwrap_or_else(|e| unreachable!("{e}"));

    coordinator.analyze_document(&document()).await;

    let systems = provider.systems();
    assert_eq!(systems[0], SUMMARY_SYSTEM_PROMPT);
    assert_eq!(
        systems.iter().filter(|s| *s == SUMMARY_SYSTEM_PROMPT).count(),
        1
    );

    let events = recorder.events.lock().unwrap_or_else(|_| unreachable!());
    let summary_done = events
        .iter()
        .position(|e| matches!(e, AnalysisEvent::FacetCompleted { facet: Facet::Summary, .. }))
        .unwrap_or(usize::MAX);
    let first_dependent = events
        .iter()
        .position(|e| {
            matches!(e, AnalysisEvent::FacetStarted { facet } if *facet != Facet::Summary)
        })
        .unwrap_or(0);
    assert!(summary_done < first_dependent);
    drop(events);

    assert_eq!(
        recorder.states(),
        vec![
            DocumentState::PendingSummary,
            DocumentState::SummaryReady,
            DocumentState::FacetsRunning,
            DocumentState::Complete,
        ]
    );
}

#[tokio::test]
async fn test_summary_failure_attempts_nothing_else() {
    let provider = Arc::new(EchoProvider::failing_on(vec![SUMMARY_SYSTEM_PROMPT]));
    let recorder = Arc::new(Recorder::default());
    let coordinator = Coordinator::builder(
        Arc::clone(&provider) as Arc<dyn LlmProvider>,
        config().build().unwrap_or_else(|_| unreachable!()),
    )
    .prompts(PromptSet::defaults())
    .observer(Arc::clone(&recorder) as Arc<dyn AnalysisObserver>)
    .build()
    .unwrap_or_else(|e| unreachable!("{e}"));

    let result = coordinator.analyze_document(&document()).await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.error.as_deref().unwrap_or_default().contains("503"));
    assert_eq!(result.facets.len(), 1);
    assert!(matches!(
        result.outcome(Facet::Summary),
        Some(FacetOutcome::Failed {
            kind: FailureKind::Provider,
            ..
        })
    ));
    assert_eq!(
        recorder.states(),
        vec![DocumentState::PendingSummary, DocumentState::Failed]
    );
}

#[tokio::test]
async fn test_related_work_failure_is_isolated() {
    let provider = Arc::new(EchoProvider::failing_on(vec![RELATED_WORK_SYSTEM_PROMPT]));
    let coordinator = coordinator(&provider, config().build().unwrap_or_else(|_| unreachable!()));

    let result = coordinator.analyze_document(&document()).await;

    assert_eq!(result.status, AnalysisStatus::PartiallyFailed);
    assert_eq!(result.failed_facets(), vec![Facet::RelatedWork]);
    assert!(matches!(
        result.outcome(Facet::RelatedWork),
        Some(FacetOutcome::Failed {
            kind: FailureKind::Provider,
            ..
        })
    ));

    let summary = expected_summary();
    assert_eq!(result.text(Facet::Summary), Some(summary.as_str()));
    for facet in Facet::DEPENDENT {
        if facet == Facet::RelatedWork {
            continue;
        }
        assert!(result.text(facet).is_some(), "{facet} missing");
    }
    assert_eq!(
        result.text(Facet::KeyFindings),
        Some(format!("[{KEY_FINDINGS_SYSTEM_PROMPT}] {summary}").as_str())
    );
}

#[tokio::test]
async fn test_judge_disabled_is_not_scheduled() {
    let provider = Arc::new(EchoProvider::new());
    let coordinator = coordinator(
        &provider,
        config().judge(false).build().unwrap_or_else(|_| unreachable!()),
    );

    let result = coordinator.analyze_document(&document()).await;

    assert_eq!(result.status, AnalysisStatus::Complete);
    assert_eq!(result.facets.len(), 8);
    assert!(result.outcome(Facet::Judge).is_none());
    assert!(!provider.systems().iter().any(|s| s == JUDGE_SYSTEM_PROMPT));

    let json = serde_json::to_value(&result).unwrap_or_else(|_| unreachable!());
    assert!(json.get("evaluation").is_none());
}

#[tokio::test]
async fn test_stream_and_batch_produce_identical_results() {
    let batch_provider = Arc::new(EchoProvider::new());
    let batch = coordinator(
        &batch_provider,
        config().stream(false).build().unwrap_or_else(|_| unreachable!()),
    )
    .analyze_document(&document())
    .await;

    let stream_provider = Arc::new(EchoProvider::new());
    let streamed = coordinator(
        &stream_provider,
        config().stream(true).build().unwrap_or_else(|_| unreachable!()),
    )
    .analyze_document(&document())
    .await;

    assert_eq!(streamed.status, AnalysisStatus::Complete);
    assert_eq!(batch.facets, streamed.facets);
}

#[tokio::test]
async fn test_batch_preserves_order_and_survives_failures() {
    let provider = Arc::new(EchoProvider::new());
    let coordinator = coordinator(&provider, config().build().unwrap_or_else(|_| unreachable!()));
    let documents = vec![
        Document::new("first", "", "Abstract one."),
        Document::new("second", "", "FAIL this one."),
        Document::new("third", "", "Abstract three."),
    ];

    let results = coordinator.analyze_batch(&documents).await;

    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert_eq!(results[0].status, AnalysisStatus::Complete);
    assert_eq!(results[1].status, AnalysisStatus::Failed);
    assert_eq!(results[2].status, AnalysisStatus::Complete);
    assert!(
        results[2]
            .text(Facet::Summary)
            .unwrap_or_default()
            .ends_with("Abstract three.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_delays_do_not_change_output() {
    let fast_provider = Arc::new(EchoProvider::new());
    let fast = coordinator(&fast_provider, config().build().unwrap_or_else(|_| unreachable!()));

    let slow_provider = Arc::new(EchoProvider::new());
    let slow = coordinator(
        &slow_provider,
        config()
            .request_delay(Duration::from_secs(2))
            .document_delay(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| unreachable!()),
    );

    let documents = vec![document(), Document::new("T2", "L2", "Second abstract.")];
    let start = tokio::time::Instant::now();
    let slow_results = slow.analyze_batch(&documents).await;
    let slow_elapsed = start.elapsed();
    let fast_results = fast.analyze_batch(&documents).await;

    // 18 calls spaced 2 s apart plus one 5 s document gap.
    assert!(slow_elapsed >= Duration::from_secs(18 * 2 + 5));
    for (a, b) in fast_results.iter().zip(&slow_results) {
        assert_eq!(a.status, b.status);
        assert_eq!(a.facets, b.facets);
    }
}

#[tokio::test]
async fn test_mailbox_dispatch_matches_direct() {
    let direct_provider = Arc::new(EchoProvider::failing_on(vec![RELATED_WORK_SYSTEM_PROMPT]));
    let direct = coordinator(
        &direct_provider,
        config().build().unwrap_or_else(|_| unreachable!()),
    )
    .analyze_document(&document())
    .await;

    let mailbox_provider = Arc::new(EchoProvider::failing_on(vec![RELATED_WORK_SYSTEM_PROMPT]));
    let mailbox = coordinator(
        &mailbox_provider,
        config()
            .dispatch(DispatchMode::Mailbox)
            .build()
            .unwrap_or_else(|_| unreachable!()),
    )
    .analyze_document(&document())
    .await;

    assert_eq!(direct.status, mailbox.status);
    assert_eq!(direct.facets, mailbox.facets);
}

#[tokio::test]
async fn test_standalone_judge() {
    let provider = Arc::new(EchoProvider::new());
    let coordinator = coordinator(&provider, config().build().unwrap_or_else(|_| unreachable!()));

    let verdict = coordinator
        .judge("original text", "summary text")
        .await
        .unwrap_or_else(|e| unreachable!("{e}"));
    assert_eq!(verdict.faithfulness_reasoning, "faithful");
    assert_eq!(provider.systems(), vec![JUDGE_SYSTEM_PROMPT.to_string()]);
}

#[tokio::test]
async fn test_cancelled_coordinator_fails_documents() {
    let provider = Arc::new(EchoProvider::new());
    let coordinator = coordinator(&provider, config().build().unwrap_or_else(|_| unreachable!()));
    coordinator.cancellation_token().cancel();

    let results = coordinator.analyze_batch(&[document(), document()]).await;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert!(matches!(
            result.outcome(Facet::Summary),
            Some(FacetOutcome::Failed {
                kind: FailureKind::Cancelled,
                ..
            })
        ));
    }
    assert_eq!(provider.call_count(), 0);
}
