//! Chat widget controller
//!
//! Drives an embeddable product-assistant chat widget: a consent gate, a
//! greeting with fixed options, server-driven option rounds and free text,
//! result cards, and a reset flow. The conversation logic is a pure state
//! machine; HTTP, consent storage and rendering sit behind traits.

pub mod backend;
pub mod config;
pub mod consent;
pub mod reply;
pub mod runtime;
pub mod view;
pub mod widget;

pub use backend::{BackendError, BackendErrorKind, ChatBackend, Endpoint, HttpBackend};
pub use config::{BackendConfig, WidgetConfig};
pub use consent::{ConsentStore, FileConsentStore, MemoryConsentStore};
pub use reply::{BotReply, ResultRecord};
pub use runtime::{ProductionRuntime, WidgetRuntime};
pub use view::{HtmlDocument, Patch, Renderer, WidgetView};
pub use widget::{Event, WidgetContext, WidgetState};
