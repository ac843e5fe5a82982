use super::models::{ApiResponse, BufferPreview, ControlState, ToggleResult};
use log::info;
use texpand_core::{EngineStatus, SearchHit, SnippetEntry, StoreStats};

pub fn engine_status(state: &ControlState) -> ApiResponse<EngineStatus> {
    ApiResponse::success(state.engine.status())
}

pub fn toggle_engine(state: &ControlState) -> ApiResponse<ToggleResult> {
    let enabled = state.engine.toggle_enabled();
    info!("Engine toggled remotely, now {}", if enabled { "on" } else { "off" });
    ApiResponse::success(ToggleResult { enabled })
}

pub fn buffer_preview(state: &ControlState) -> ApiResponse<BufferPreview> {
    let buffer = state.engine.buffer_preview();
    let len = buffer.chars().count();
    ApiResponse::success(BufferPreview { buffer, len })
}

pub fn list_snippets(state: &ControlState) -> ApiResponse<Vec<SnippetEntry>> {
    ApiResponse::success(state.store.list())
}

pub fn search_snippets(state: &ControlState, query: &str) -> ApiResponse<Vec<SearchHit>> {
    let query = query.trim();
    if query.is_empty() {
        return ApiResponse::error("Search query must not be empty".to_string());
    }
    ApiResponse::success(state.store.search(query))
}

pub fn store_stats(state: &ControlState) -> ApiResponse<StoreStats> {
    ApiResponse::success(state.store.stats())
}
