//! Chat widget state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{
    ConsentGate, FreeFlowMode, Message, OptionSource, Phase, RequestToken, SelectionEndpoint, Speaker,
    TranscriptEntry, WidgetContext, WidgetState,
};
pub use transition::{transition, TransitionError, TransitionResult};
