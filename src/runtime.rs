//! Runtime for driving the widget
//!
//! Owns the state, renders each transition and executes effects. Requests run
//! as background tasks and report back through the event channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::WidgetRuntime;

use crate::backend::{BackendError, HttpBackend};
use crate::config::WidgetConfig;
use crate::consent::FileConsentStore;
use crate::view::Renderer;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime<R> = WidgetRuntime<HttpBackend, FileConsentStore, R>;

/// Build a runtime talking HTTP and storing consent on disk
pub fn production<R: Renderer>(
    config: &WidgetConfig,
    renderer: R,
) -> Result<ProductionRuntime<R>, BackendError> {
    let backend = HttpBackend::new(&config.backend)?;
    let consent = FileConsentStore::new(&config.storage_path, &config.consent_key);
    Ok(WidgetRuntime::new(
        config.context.clone(),
        backend,
        consent,
        renderer,
    ))
}
