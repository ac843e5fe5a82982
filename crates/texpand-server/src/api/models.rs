//! Data models for API requests and responses.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use texpand_core::{EngineHandle, SnippetStore};

/// Standard API response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// What every route needs: the live engine and the store it reads from.
#[derive(Clone)]
pub struct ControlState {
    pub engine: EngineHandle,
    pub store: Arc<SnippetStore>,
}

impl ControlState {
    pub fn new(engine: EngineHandle, store: Arc<SnippetStore>) -> Self {
        Self { engine, store }
    }
}

/// Result of a toggle request
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ToggleResult {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BufferPreview {
    pub buffer: String,
    pub len: usize,
}

/// Query string for `/api/snippets/search`
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}
