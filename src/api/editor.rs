/// Editor session REST API endpoints
///
/// Every mutation goes through the session's store under the session lock,
/// and most endpoints answer with the refreshed editor view so clients can
/// redraw without a second request.

use crate::{
    api::AppState,
    canvas::{Gesture, GestureOutcome},
    inspector::{FilePicker, InspectorView, SectionId},
    session::EditorView,
    workflow::{store::RunRequest, types::Workflow},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Result of a single gesture plus the view it produced
#[derive(Debug, Serialize)]
pub struct GestureResponse {
    pub outcome: GestureOutcome,
    pub view: EditorView,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub source_id: String,
    pub target_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickFileRequest {
    pub file_id: String,
}

/// Create editor session routes
pub fn create_editor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/editor", get(get_editor))
        .route("/api/editor/gestures", post(apply_gesture))
        .route("/api/editor/name", put(rename_workflow))
        .route("/api/editor/blocks/{id}/config", post(update_block_config))
        .route("/api/editor/blocks/{id}", delete(remove_block))
        .route("/api/editor/connections", delete(remove_connection))
        .route("/api/editor/save", post(save_workflow))
        .route("/api/editor/run", post(run_workflow))
        .route("/api/editor/inspector", get(get_inspector))
        .route("/api/editor/inspector/file", post(pick_file))
        .route(
            "/api/editor/inspector/sections/{section}/toggle",
            post(toggle_section),
        )
}

/// GET /api/editor
async fn get_editor(State(state): State<AppState>) -> Json<EditorView> {
    Json(state.session.lock().await.view())
}

/// Apply one pointer gesture
///
/// POST /api/editor/gestures
/// Body: { "kind": "drop", "pointer": { "x": 140, "y": 260 } }
async fn apply_gesture(
    State(state): State<AppState>,
    Json(gesture): Json<Gesture>,
) -> Json<GestureResponse> {
    let mut session = state.session.lock().await;
    tracing::debug!("Applying gesture {:?}", gesture);
    let outcome = session.apply(gesture);
    Json(GestureResponse {
        outcome,
        view: session.view(),
    })
}

/// PUT /api/editor/name
/// Body: { "name": "Quarterly close" }
async fn rename_workflow(
    State(state): State<AppState>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<EditorView>, StatusCode> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut session = state.session.lock().await;
    session.store.rename_workflow(name);
    Ok(Json(session.view()))
}

/// Shallow-merge configuration into a block
///
/// POST /api/editor/blocks/:id/config
/// Body: { "apiUrl": "https://...", "label": "Ledger API" }
async fn update_block_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(partial): Json<Map<String, Value>>,
) -> Result<Json<EditorView>, StatusCode> {
    let mut session = state.session.lock().await;
    if !session.store.update_block_config(&id, partial) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(session.view()))
}

/// DELETE /api/editor/blocks/:id
/// Returns: { "removed": true|false } (removal is idempotent)
async fn remove_block(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let removed = state.session.lock().await.store.remove_block(&id);
    Json(json!({ "removed": removed }))
}

/// DELETE /api/editor/connections
/// Body: { "sourceId": "...", "targetId": "..." }
async fn remove_connection(
    State(state): State<AppState>,
    Json(payload): Json<ConnectionRequest>,
) -> Json<Value> {
    let removed = state
        .session
        .lock()
        .await
        .store
        .remove_connection(&payload.source_id, &payload.target_id);
    Json(json!({ "removed": removed }))
}

/// Snapshot the session and persist it
///
/// POST /api/editor/save
/// The in-memory snapshot is kept even when persistence fails.
async fn save_workflow(State(state): State<AppState>) -> Result<Json<Workflow>, StatusCode> {
    let workflow = {
        let mut session = state.session.lock().await;
        session.store.save_workflow().clone()
    };

    if let Err(e) = state.storage.save_workflow(&workflow).await {
        tracing::error!("Failed to persist workflow {}: {}", workflow.id, e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(workflow))
}

/// POST /api/editor/run
async fn run_workflow(State(state): State<AppState>) -> Json<RunRequest> {
    Json(state.session.lock().await.store.run_workflow())
}

/// GET /api/editor/inspector
/// Returns `null` when no block is selected
async fn get_inspector(State(state): State<AppState>) -> Json<Option<InspectorView>> {
    Json(state.session.lock().await.inspector_view())
}

/// POST /api/editor/inspector/sections/:section/toggle
async fn toggle_section(
    State(state): State<AppState>,
    Path(section): Path<SectionId>,
) -> Json<Value> {
    let expanded = state.session.lock().await.inspector.toggle(section);
    Json(json!({ "section": section, "expanded": expanded }))
}

/// Attach a previously uploaded file to the selected block
///
/// POST /api/editor/inspector/file
/// Body: { "fileId": "..." }
/// Ids missing from the cached list trigger one reload, made without the session lock.
async fn pick_file(
    State(state): State<AppState>,
    Json(payload): Json<PickFileRequest>,
) -> Result<Json<Option<InspectorView>>, StatusCode> {
    let cached = state.session.lock().await.files.contains(&payload.file_id);
    if !cached {
        let listed = FilePicker::load(state.backend.as_ref()).await;
        state.session.lock().await.files.set_state(listed);
    }

    let mut session = state.session.lock().await;
    if !session.pick_file(&payload.file_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(session.inspector_view()))
}
