//! End-to-end tests for the message pipeline: conversation store, context
//! reduction, completion orchestration, and tool resolution wired together
//! exactly as the Slack bridge drives them.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use samovar_agent::{CompletionOrchestrator, ContextReducer, MessagePipeline};
use samovar_core::error::{ClassifierError, ProviderError, ToolError};
use samovar_core::intent::{Intent, IntentClassifier};
use samovar_core::message::{ConversationId, Message, Role};
use samovar_core::provider::{
    ChatRequest, ChatResponse, Choice, ChoiceMessage, CompletionProvider, FinishReason,
    FunctionCall,
};
use samovar_core::tool::{Tool, ToolContext, ToolRegistry};
use samovar_memory::{ConversationStore, InMemoryBackend};

// ── Mock provider ────────────────────────────────────────────────────────

/// Returns scripted responses in order (repeating the last) and records
/// every request.
struct ScriptedProvider {
    responses: Mutex<Vec<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else {
            Ok(responses[0].clone())
        }
    }
}

fn stop(content: &str) -> ChatResponse {
    ChatResponse {
        choices: vec![Choice {
            finish_reason: FinishReason::Stop,
            message: ChoiceMessage {
                content: Some(content.into()),
                function_call: None,
            },
        }],
        model: None,
        usage: None,
    }
}

fn tool_call(name: &str, arguments: &str) -> ChatResponse {
    ChatResponse {
        choices: vec![Choice {
            finish_reason: FinishReason::ToolCall,
            message: ChoiceMessage {
                content: None,
                function_call: Some(FunctionCall {
                    name: name.into(),
                    arguments: arguments.into(),
                }),
            },
        }],
        model: None,
        usage: None,
    }
}

// ── Mock tool ────────────────────────────────────────────────────────────

struct SunnySearch;

#[async_trait]
impl Tool for SunnySearch {
    fn name(&self) -> &str {
        "search"
    }
    fn description(&self) -> &str {
        "Search using search engine"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        })
    }
    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
        _ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        assert_eq!(
            arguments.get("query").and_then(|v| v.as_str()),
            Some("weather")
        );
        Ok("sunny".into())
    }
}

// ── Mock classifier ──────────────────────────────────────────────────────

struct CasualClassifier;

#[async_trait]
impl IntentClassifier for CasualClassifier {
    async fn classify(&self, _text: &str) -> Result<Intent, ClassifierError> {
        Ok(Intent::Casual)
    }
}

struct OutageClassifier;

#[async_trait]
impl IntentClassifier for OutageClassifier {
    async fn classify(&self, _text: &str) -> Result<Intent, ClassifierError> {
        Err(ClassifierError::Unavailable("503".into()))
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

fn pipeline(
    provider: Arc<ScriptedProvider>,
    registry: ToolRegistry,
    reducer: ContextReducer,
    budget: u64,
) -> (MessagePipeline, Arc<ConversationStore>) {
    let store = Arc::new(ConversationStore::new(
        Arc::new(InMemoryBackend::new()),
        budget,
    ));
    let orchestrator =
        CompletionOrchestrator::new(provider, Arc::new(registry), "test-model", 5);
    (
        MessagePipeline::new(store.clone(), reducer, orchestrator),
        store,
    )
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn hello_round_trip_persists_both_sides() {
    let provider = ScriptedProvider::new(vec![stop("Hi there")]);
    let (pipeline, store) = pipeline(
        provider.clone(),
        ToolRegistry::new(),
        ContextReducer::disabled(),
        1000,
    );

    let id = ConversationId::from("C1_171.001");
    let reply = pipeline
        .handle(&id, "Hello", None, &ToolContext::default())
        .await
        .unwrap();

    assert_eq!(reply, "Hi there");

    let history = store.read(&id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "Hello");
    assert!(history[0].token_count > 0);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Hi there");
    assert!(history[1].token_count > 0);
}

#[tokio::test]
async fn tool_call_round_trip() {
    let provider = ScriptedProvider::new(vec![
        tool_call("search", r#"{"query":"weather"}"#),
        stop("It's sunny"),
    ]);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SunnySearch));
    let (pipeline, store) = pipeline(
        provider.clone(),
        registry,
        ContextReducer::disabled(),
        1000,
    );

    let id = ConversationId::from("C1_171.002");
    let reply = pipeline
        .handle(&id, "what's the weather?", None, &ToolContext::default())
        .await
        .unwrap();

    assert_eq!(reply, "It's sunny");

    // The second provider call must include the tool-role message.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let tool_msg = requests[1]
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool result message fed back to provider");
    assert_eq!(tool_msg.name.as_deref(), Some("search"));
    assert_eq!(tool_msg.content, "sunny");

    // Only user + assistant are persisted; the transient tool exchange is
    // not part of the stored history.
    let history = store.read(&id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "It's sunny");
}

#[tokio::test]
async fn system_prompt_is_injected_but_never_persisted() {
    let provider = ScriptedProvider::new(vec![stop("Hello Grace")]);
    let (pipeline, store) = pipeline(
        provider.clone(),
        ToolRegistry::new(),
        ContextReducer::disabled(),
        1000,
    );

    let id = ConversationId::from("C1_171.003");
    pipeline
        .handle(
            &id,
            "Hello",
            Some("User profile:\nName: Grace | Title: Admiral | Company: Navy".into()),
            &ToolContext::default(),
        )
        .await
        .unwrap();

    let request = &provider.requests()[0];
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.contains("Grace"));

    let history = store.read(&id).await.unwrap();
    assert!(history.iter().all(|m| m.role != Role::System));
}

#[tokio::test]
async fn casual_small_talk_collapses_history_and_suppresses_tools() {
    let provider = ScriptedProvider::new(vec![stop("haha nice")]);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SunnySearch));
    let (pipeline, store) = pipeline(
        provider.clone(),
        registry,
        ContextReducer::new(Arc::new(CasualClassifier)),
        100_000,
    );

    let id = ConversationId::from("C1_171.004");
    // Build up five prior turns so the sixth crosses the threshold.
    for i in 0..5 {
        store
            .write(&id, Message::user(format!("chit chat {i}")))
            .await
            .unwrap();
    }

    pipeline
        .handle(&id, "lol same", Some("profile".into()), &ToolContext::default())
        .await
        .unwrap();

    let request = &provider.requests()[0];
    // system + [first] + last 3 of the 6-message history
    assert_eq!(request.messages.len(), 5);
    assert_eq!(request.messages[0].role, Role::System);
    assert_eq!(request.messages[1].content, "chit chat 0");
    assert_eq!(request.messages[4].content, "lol same");
    // Tools exist in the registry but must not be offered for small talk.
    assert!(request.functions.is_none());
}

#[tokio::test]
async fn classifier_outage_degrades_to_unreduced_history() {
    let provider = ScriptedProvider::new(vec![stop("still works")]);
    let (pipeline, store) = pipeline(
        provider.clone(),
        ToolRegistry::new(),
        ContextReducer::new(Arc::new(OutageClassifier)),
        100_000,
    );

    let id = ConversationId::from("C1_171.005");
    for i in 0..5 {
        store
            .write(&id, Message::user(format!("message {i}")))
            .await
            .unwrap();
    }

    let reply = pipeline
        .handle(&id, "one more", None, &ToolContext::default())
        .await
        .unwrap();

    assert_eq!(reply, "still works");
    // All six messages went through untouched.
    assert_eq!(provider.requests()[0].messages.len(), 6);
}

#[tokio::test]
async fn eviction_bounds_what_the_provider_sees() {
    let provider = ScriptedProvider::new(vec![stop("ok")]);
    // Budget of 10 tokens; each 16-char message costs 4.
    let (pipeline, store) = pipeline(
        provider.clone(),
        ToolRegistry::new(),
        ContextReducer::disabled(),
        10,
    );

    let id = ConversationId::from("C1_171.006");
    for _ in 0..4 {
        store
            .write(&id, Message::user("aaaaaaaaaaaaaaaa"))
            .await
            .unwrap();
    }

    pipeline
        .handle(&id, "bbbbbbbbbbbbbbbb", None, &ToolContext::default())
        .await
        .unwrap();

    // The provider saw only what fit the budget.
    let seen = &provider.requests()[0].messages;
    assert!(seen.len() <= 2);
    assert_eq!(seen.last().unwrap().content, "bbbbbbbbbbbbbbbb");
}
