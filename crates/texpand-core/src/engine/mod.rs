//! The keystroke buffering and expansion engine.
//!
//! Events flow hook -> [`EngineController::on_key_event`] -> classifier ->
//! buffer mutation, or on a trigger key: resolver -> executor -> injector.

pub mod buffer;
pub mod classifier;
pub mod controller;
pub mod event;
pub mod executor;
pub mod ports;
pub mod resolver;
pub mod state;

#[cfg(test)]
pub(crate) mod mock;

pub use buffer::{is_keyword_char, ClearReason, KeywordBuffer};
pub use classifier::{Disposition, EventClassifier};
pub use controller::EngineController;
pub use event::{KeyEvent, KeyPhase, Modifier, ModifierKind, SpecialKey, Trigger};
pub use executor::{Outcome, ReplacementExecutor};
pub use ports::{Injector, SnippetLookup, SyntheticKey};
pub use resolver::{MatchStrategy, Resolution, Resolver};
pub use state::{EchoFilter, EngineFlags, EngineHandle, EngineState, EngineStatus, ModifierSet};
