//! Route definitions for `/editor/sessions`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::editor;
use crate::state::AppState;

/// Routes mounted at `/editor`. All require auth.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(editor::create_session))
        .route(
            "/sessions/{id}",
            get(editor::get_session).delete(editor::delete_session),
        )
        .route("/sessions/{id}/video", post(editor::upload_video))
        .route("/sessions/{id}/duration", put(editor::report_duration))
        .route("/sessions/{id}/video/{video_id}", get(editor::get_video))
        .route("/sessions/{id}/frames/{index}", get(editor::get_frame))
        .route(
            "/sessions/{id}/selection/{index}",
            post(editor::toggle_selection),
        )
        .route(
            "/sessions/{id}/selection",
            delete(editor::clear_selection),
        )
        .route("/sessions/{id}/generate", post(editor::generate))
        .route("/sessions/{id}/save", post(editor::save))
}
