//! Mock implementations for testing
//!
//! These mocks enable runtime tests without a server or a real page.

use crate::backend::{BackendError, ChatBackend, Endpoint};
use crate::reply::BotReply;
use crate::view::{HtmlDocument, Patch, Renderer};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued replies
#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<BotReply, BackendError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<(Endpoint, String)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: BotReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: BackendError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<(Endpoint, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<BotReply, BackendError> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint, message.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("No mock reply queued")))
    }
}

// ============================================================================
// Recording Renderer
// ============================================================================

/// Renderer that keeps every patch and an HTML document built from them
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub patches: Vec<Patch>,
    pub document: HtmlDocument,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Patch) -> bool) -> usize {
        self.patches.iter().filter(|p| pred(p)).count()
    }
}

impl Renderer for RecordingRenderer {
    fn apply(&mut self, patch: &Patch) {
        self.patches.push(patch.clone());
        self.document.apply(patch);
    }
}

// ============================================================================
// Runtime Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendErrorKind;
    use crate::consent::{ConsentStore, MemoryConsentStore};
    use crate::reply::ResultRecord;
    use crate::runtime::WidgetRuntime;
    use crate::view::Node;
    use crate::widget::{
        ConsentGate, Event, FreeFlowMode, Speaker, TransitionError, WidgetContext,
    };
    use std::sync::Arc;
    use tokio::sync::mpsc;

    type TestRuntime =
        WidgetRuntime<Arc<MockBackend>, Arc<MemoryConsentStore>, RecordingRenderer>;

    fn runtime_with(
        context: WidgetContext,
        consent_given: bool,
    ) -> (TestRuntime, Arc<MockBackend>, Arc<MemoryConsentStore>) {
        let backend = Arc::new(MockBackend::new());
        let consent = Arc::new(MemoryConsentStore::new(consent_given));
        let runtime = WidgetRuntime::new(
            context,
            Arc::clone(&backend),
            Arc::clone(&consent),
            RecordingRenderer::new(),
        );
        (runtime, backend, consent)
    }

    /// Loaded with consent and opened
    fn opened(context: WidgetContext) -> (TestRuntime, Arc<MockBackend>) {
        let (mut runtime, backend, _) = runtime_with(context, true);
        runtime.load().unwrap();
        runtime.dispatch(Event::ToggleClicked).unwrap();
        (runtime, backend)
    }

    fn bot_texts(runtime: &TestRuntime) -> Vec<String> {
        runtime
            .view()
            .transcript
            .iter()
            .filter_map(|n| match n {
                Node::Message {
                    speaker: Speaker::Bot,
                    text,
                    ..
                } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_consent_gate_flow() {
        let (mut runtime, _, consent) = runtime_with(WidgetContext::default(), false);
        runtime.load().unwrap();

        assert!(runtime.view().consent_banner_visible);
        assert!(!runtime.view().toggle_visible);
        assert_eq!(
            runtime.dispatch(Event::ToggleClicked).unwrap_err(),
            TransitionError::ConsentRequired
        );

        runtime.dispatch(Event::ConsentAccepted).unwrap();
        assert!(consent.load().unwrap());
        assert!(!runtime.view().consent_banner_visible);
        assert!(runtime.view().toggle_visible);
        assert!(!runtime.renderer().document.consent_banner_visible);
    }

    #[tokio::test]
    async fn test_stored_consent_shows_toggle() {
        let (mut runtime, _, _) = runtime_with(WidgetContext::default(), true);
        runtime.load().unwrap();
        assert_eq!(runtime.state().consent, ConsentGate::Given);
        assert!(runtime.view().toggle_visible);
        assert!(!runtime.view().consent_banner_visible);
    }

    #[tokio::test]
    async fn test_open_greets_once() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        assert_eq!(runtime.view().transcript.len(), 1);
        assert_eq!(runtime.view().options, ["Guided Questions", "Free Flow"]);
        assert!(!runtime.view().input_enabled);

        runtime.dispatch(Event::CloseClicked).unwrap();
        assert!(runtime.view().toggle_visible);
        runtime.dispatch(Event::ToggleClicked).unwrap();
        assert_eq!(runtime.view().transcript.len(), 1);
        assert_eq!(
            runtime.renderer().count(|p| matches!(p, Patch::ShowOptions(_))),
            1
        );
        assert!(backend.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_selection_rendered_before_request() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(
            BotReply {
                lines: vec!["Line A".to_string(), "Line B".to_string()],
                ..BotReply::default()
            }
            .with_options(["Yes", "No"]),
        );

        runtime.dispatch(Event::option("Guided Questions")).unwrap();

        // Request task has not run yet; the user message is already on screen
        assert!(backend.recorded_requests().is_empty());
        assert!(matches!(
            runtime.view().transcript.last(),
            Some(Node::Message { speaker: Speaker::User, text, .. }) if text == "Guided Questions"
        ));
        assert!(runtime.view().typing_visible);
        assert!(runtime.view().options.is_empty());

        assert!(runtime.step().await);
        assert_eq!(
            backend.recorded_requests(),
            vec![(Endpoint::Choice, "Guided Questions".to_string())]
        );

        let view = runtime.view();
        assert!(!view.typing_visible);
        assert_eq!(view.options, ["Yes", "No"]);
        assert!(!view.input_enabled);
        let doc = &runtime.renderer().document;
        assert_eq!(doc.nodes.len(), 4);
        assert!(doc.nodes[2].contains("m-0"));
        assert!(!doc.nodes[3].contains("m-0"));
    }

    #[tokio::test]
    async fn test_guided_answers_go_to_chat_endpoint() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(
            BotReply {
                lines: vec![
                    "Let's get started".to_string(),
                    "Who are you shopping for?".to_string(),
                ],
                ..BotReply::default()
            }
            .with_options(["Mothers", "Your Baby", "Start Over"]),
        );
        backend.queue_reply(
            BotReply::text("What is your budget?").with_options(["$0 - $50", "Start Over"]),
        );

        runtime.dispatch(Event::option("Guided Questions")).unwrap();
        runtime.step().await;
        runtime.dispatch(Event::option("Mothers")).unwrap();
        runtime.step().await;

        assert_eq!(
            backend.recorded_requests(),
            vec![
                (Endpoint::Choice, "Guided Questions".to_string()),
                (Endpoint::Chat, "Mothers".to_string()),
            ]
        );
        assert_eq!(bot_texts(&runtime).last().unwrap(), "What is your budget?");
        assert_eq!(runtime.view().options, ["$0 - $50", "Start Over"]);
        assert!(!bot_texts(&runtime)
            .iter()
            .any(|t| t == "Sorry, something went wrong."));
    }

    #[tokio::test]
    async fn test_free_flow_local_unlock() {
        let context = WidgetContext::default().with_free_flow(FreeFlowMode::LocalUnlock);
        let (mut runtime, backend) = opened(context);

        runtime.dispatch(Event::option("Free Flow")).unwrap();
        assert_eq!(runtime.drain(), 0);
        tokio::task::yield_now().await;

        assert!(backend.recorded_requests().is_empty());
        assert!(runtime.view().input_enabled);
        assert!(runtime.renderer().document.input_focused);
    }

    #[tokio::test]
    async fn test_free_flow_dispatch() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(BotReply::text(
            "Go Ahead, type what you want and I will try my best to help you!",
        ));

        runtime.dispatch(Event::option("Free Flow")).unwrap();
        runtime.step().await;

        assert_eq!(
            backend.recorded_requests(),
            vec![(Endpoint::Choice, "Free Flow".to_string())]
        );
        assert!(runtime.view().input_enabled);
        assert!(runtime.renderer().document.input_focused);
    }

    #[tokio::test]
    async fn test_result_cards() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(BotReply::text("ok"));
        runtime.dispatch(Event::option("Free Flow")).unwrap();
        runtime.step().await;

        backend.queue_reply(BotReply::default().with_results(vec![ResultRecord {
            name: "Shoe".to_string(),
            image: "x.jpg".to_string(),
            current_price: 1999.0,
            url: "/p/1".to_string(),
        }]));
        runtime.renderer_mut().document.type_text("shoes");
        runtime.dispatch(Event::text("shoes")).unwrap();
        assert!(runtime.renderer().document.input_value.is_empty());
        runtime.step().await;

        let doc = &runtime.renderer().document;
        let card = doc.nodes.last().unwrap();
        assert!(card.contains("Rs. 1,999"));
        assert!(card.contains(r#"href="/p/1""#));
        assert_eq!(
            backend.recorded_requests().last().unwrap(),
            &(Endpoint::Chat, "shoes".to_string())
        );
        assert!(runtime.view().input_enabled);
    }

    #[tokio::test]
    async fn test_blank_text_sends_nothing() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(BotReply::text("ok"));
        runtime.dispatch(Event::option("Free Flow")).unwrap();
        runtime.step().await;
        let before = runtime.view().transcript.len();

        runtime.dispatch(Event::text("   ")).unwrap();
        tokio::task::yield_now().await;

        assert_eq!(runtime.view().transcript.len(), before);
        assert_eq!(backend.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_apologizes_and_reports() {
        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel();
        let (runtime, backend) = opened(WidgetContext::default());
        let mut runtime = runtime.with_failure_channel(failure_tx);
        backend.queue_error(BackendError::network("connection refused"));

        runtime.dispatch(Event::option("Guided Questions")).unwrap();
        runtime.step().await;

        let apologies = bot_texts(&runtime)
            .iter()
            .filter(|t| t.as_str() == "Sorry, something went wrong.")
            .count();
        assert_eq!(apologies, 1);
        assert!(runtime.view().input_enabled);
        assert!(!runtime.view().typing_visible);

        let reported = failure_rx.try_recv().unwrap();
        assert_eq!(reported.kind, BackendErrorKind::Network);
    }

    #[tokio::test]
    async fn test_reset_keyword_renders_reply_then_restarts() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(BotReply::text("ok"));
        runtime.dispatch(Event::option("Free Flow")).unwrap();
        runtime.step().await;

        backend.queue_reply(BotReply::text("Chat reset. You can start over."));
        runtime.dispatch(Event::text("New Chat")).unwrap();
        runtime.step().await;

        let texts = bot_texts(&runtime);
        let tail: Vec<_> = texts.iter().rev().take(3).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            [
                "Chat reset. You can start over.",
                "Chat reset. Let's start over.",
                "Hi there! How would you like the conversation to go?"
            ]
        );
        assert_eq!(runtime.view().options, ["Guided Questions", "Free Flow"]);
        assert!(!runtime.view().input_enabled);
    }

    #[tokio::test]
    async fn test_reply_after_host_reset_is_dropped() {
        let (mut runtime, backend) = opened(WidgetContext::default());
        backend.queue_reply(BotReply::text("late reply").with_options(["Mothers"]));

        runtime.dispatch(Event::option("Guided Questions")).unwrap();
        runtime.dispatch(Event::Reset).unwrap();
        let before = runtime.state().clone();

        runtime.step().await;

        assert_eq!(runtime.state(), &before);
        assert!(!bot_texts(&runtime).iter().any(|t| t == "late reply"));
        assert_eq!(runtime.view().options, ["Guided Questions", "Free Flow"]);
    }

    #[tokio::test]
    async fn test_events_from_sender() {
        let (mut runtime, _, _) = runtime_with(WidgetContext::default(), true);
        runtime.load().unwrap();
        let tx = runtime.sender();
        tx.send(Event::ToggleClicked).unwrap();
        tx.send(Event::CloseClicked).unwrap();

        assert_eq!(runtime.drain(), 2);
        assert!(!runtime.view().window_visible);
        assert_eq!(runtime.view().transcript.len(), 1);
    }
}
