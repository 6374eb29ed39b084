//! Widget runtime executor

use crate::backend::{BackendError, ChatBackend};
use crate::consent::ConsentStore;
use crate::view::{diff, Patch, Renderer, WidgetView};
use crate::widget::{transition, Effect, Event, TransitionError, WidgetContext, WidgetState};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Generic widget runtime that can work with any backend, consent store and renderer
pub struct WidgetRuntime<B, S, R>
where
    B: ChatBackend + 'static,
    S: ConsentStore,
    R: Renderer,
{
    context: WidgetContext,
    state: WidgetState,
    /// What the renderer currently shows
    view: WidgetView,
    backend: Arc<B>,
    consent: S,
    renderer: R,
    event_rx: mpsc::UnboundedReceiver<Event>,
    event_tx: mpsc::UnboundedSender<Event>,
    /// Typed request failures forwarded to the host
    failure_tx: Option<mpsc::UnboundedSender<BackendError>>,
}

impl<B, S, R> WidgetRuntime<B, S, R>
where
    B: ChatBackend + 'static,
    S: ConsentStore,
    R: Renderer,
{
    pub fn new(context: WidgetContext, backend: B, consent: S, renderer: R) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            context,
            state: WidgetState::new(),
            view: WidgetView::default(),
            backend: Arc::new(backend),
            consent,
            renderer,
            event_rx,
            event_tx,
            failure_tx: None,
        }
    }

    /// Forward request failures to the host in addition to the apology message
    #[must_use]
    pub fn with_failure_channel(mut self, failure_tx: mpsc::UnboundedSender<BackendError>) -> Self {
        self.failure_tx = Some(failure_tx);
        self
    }

    /// Sender for posting events from other tasks
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.event_tx.clone()
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn view(&self) -> &WidgetView {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Consult the consent store and apply the consent gate. Called once per load.
    pub fn load(&mut self) -> Result<(), TransitionError> {
        let consent_stored = match self.consent.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read consent flag, treating as not given");
                false
            }
        };
        tracing::info!(consent_stored, "Widget loaded");
        self.dispatch(Event::PageLoaded { consent_stored })
    }

    /// Apply one event: transition, render the new view, then run effects.
    ///
    /// Rendering happens before effects so that, for example, a selected
    /// option is on screen before its request goes out.
    pub fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();
        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;

        let view = WidgetView::from_state(&self.state);
        for patch in diff(&self.view, &view) {
            self.renderer.apply(&patch);
        }
        self.view = view;

        tracing::debug!(
            event = event_name,
            phase = ?self.state.phase,
            effects = result.effects.len(),
            "Transition applied"
        );

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    /// Wait for the next queued event and process it. Returns false once the
    /// channel is closed.
    pub async fn step(&mut self) -> bool {
        match self.event_rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Process queued events without waiting
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle(event);
            processed += 1;
        }
        processed
    }

    pub async fn run(mut self) {
        tracing::info!("Starting widget runtime");
        while self.step().await {}
        tracing::info!("Widget runtime stopped");
    }

    /// Dispatch and log instead of returning the error
    pub fn handle(&mut self, event: Event) {
        match self.dispatch(event) {
            Ok(()) => {}
            Err(e @ TransitionError::StaleReply(_)) => {
                tracing::debug!(error = %e, "Dropping stale reply");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Event rejected");
            }
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SendRequest {
                token,
                endpoint,
                message,
            } => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();

                tokio::spawn(async move {
                    tracing::info!(%token, endpoint = endpoint.as_str(), "Sending request");
                    let event = match backend.send(endpoint, &message).await {
                        Ok(reply) => Event::ReplyReceived { token, reply },
                        Err(error) => Event::ReplyFailed { token, error },
                    };
                    let _ = event_tx.send(event);
                });
            }

            Effect::PersistConsent => {
                if let Err(e) = self.consent.store() {
                    tracing::error!(error = %e, "Failed to persist consent flag");
                }
            }

            Effect::ClearInput => self.renderer.apply(&Patch::ClearInput),
            Effect::FocusInput => self.renderer.apply(&Patch::FocusInput),
            Effect::ScrollToBottom => self.renderer.apply(&Patch::ScrollToBottom),

            Effect::ReportFailure { error } => {
                tracing::warn!(kind = error.kind.as_str(), error = %error, "Request failed");
                if let Some(tx) = &self.failure_tx {
                    let _ = tx.send(error);
                }
            }
        }
    }
}
