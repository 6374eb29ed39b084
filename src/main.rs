//! Chat widget terminal host
//!
//! Runs the widget against a live backend, rendering patches as text and
//! reading user actions from stdin.

use chat_widget::view::{Node, Patch, Renderer};
use chat_widget::{runtime, Event, WidgetConfig};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the widget
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_widget=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = WidgetConfig::from_env();
    tracing::info!(
        url = %config.backend.page_url,
        storage = %config.storage_path.display(),
        "Starting chat widget"
    );

    let (failure_tx, mut failure_rx) = mpsc::unbounded_channel();
    let mut runtime = runtime::production(&config, TerminalRenderer::new(std::io::stdout()))?
        .with_failure_channel(failure_tx);

    if let Err(e) = runtime.backend().bootstrap().await {
        tracing::warn!(error = %e, "Could not fetch CSRF cookie, requests may be rejected");
    }
    runtime.load()?;

    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(command) = HostCommand::parse(&line) {
                if command_tx.send(command).is_err() {
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else { break };
                match command.into_event(&runtime.view().options) {
                    Some(event) => runtime.handle(event),
                    None => break,
                }
            }
            alive = runtime.step() => {
                if !alive {
                    break;
                }
            }
            Some(error) = failure_rx.recv() => {
                eprintln!("request failed ({}): {}", error.kind.as_str(), error.message);
            }
        }
    }

    tracing::info!("Chat widget stopped");
    Ok(())
}

/// A line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostCommand {
    Open,
    Close,
    Accept,
    Reset,
    /// Option by 1-based position or by label
    Pick(String),
    Say(String),
    Quit,
}

impl HostCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => None,
            "/open" => Some(Self::Open),
            "/close" => Some(Self::Close),
            "/accept" => Some(Self::Accept),
            "/reset" => Some(Self::Reset),
            "/quit" | "/exit" => Some(Self::Quit),
            "/pick" if !arg.is_empty() => Some(Self::Pick(arg.to_string())),
            _ => Some(Self::Say(line.to_string())),
        }
    }

    /// Widget event for this command, or `None` to quit
    fn into_event(self, options: &[String]) -> Option<Event> {
        let event = match self {
            Self::Open => Event::ToggleClicked,
            Self::Close => Event::CloseClicked,
            Self::Accept => Event::ConsentAccepted,
            Self::Reset => Event::Reset,
            Self::Pick(choice) => {
                let label = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| options.get(i).cloned())
                    .unwrap_or(choice);
                Event::option(label)
            }
            Self::Say(text) => Event::text(text),
            Self::Quit => return None,
        };
        Some(event)
    }
}

/// Prints patches as plain text lines
struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    fn new(out: W) -> Self {
        Self { out }
    }

    fn node(&mut self, node: &Node) {
        let _ = match node {
            Node::Message { speaker, text, .. } => {
                writeln!(self.out, "{}> {text}", speaker.as_str())
            }
            Node::ResultCard(card) => writeln!(
                self.out,
                "  * {} | {} | {}",
                card.name, card.price_label, card.url
            ),
        };
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn apply(&mut self, patch: &Patch) {
        let _ = match patch {
            Patch::SetConsentBannerVisible(true) => writeln!(
                self.out,
                "[consent] This chat stores your consent locally. Type /accept to continue."
            ),
            Patch::SetToggleVisible(true) => writeln!(self.out, "[chat available, type /open]"),
            Patch::AppendNode(node) => {
                self.node(node);
                Ok(())
            }
            Patch::ReplaceTranscript(nodes) => {
                let _ = writeln!(self.out, "--- transcript ---");
                for node in nodes {
                    self.node(node);
                }
                Ok(())
            }
            Patch::ShowOptions(options) => {
                let listed: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(i, o)| format!("[{}] {o}", i + 1))
                    .collect();
                writeln!(self.out, "options: {} (type /pick <n>)", listed.join("  "))
            }
            Patch::SetTyping(true) => writeln!(self.out, "bot is typing..."),
            Patch::SetInputEnabled(true) => writeln!(self.out, "[type a message]"),
            _ => Ok(()),
        };
        let _ = self.out.flush();
    }
}
