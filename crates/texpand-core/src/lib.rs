//! texpand-core - keystroke-driven text expansion.
//!
//! Watches the typed word, recognises registered abbreviations and swaps
//! them for their replacement text while the user keeps typing.

pub mod config;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod models;
pub mod normalize;
pub mod storage;

// Re-export common items for convenience
pub use config::{get_config_dir, is_daemon_running, EngineConfig};
pub use engine::{EngineController, EngineHandle, EngineStatus, KeyEvent};
pub use error::{Result, TexpandError};
pub use models::{SearchHit, SnippetEntry, StoreStats};
pub use normalize::normalize;
pub use storage::SnippetStore;
