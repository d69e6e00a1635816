pub mod auth;
pub mod editor;
pub mod health;
pub mod projects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                               register (public)
/// /auth/login                                  login (public)
/// /auth/refresh                                refresh (public)
/// /auth/logout                                 logout
/// /auth/me                                     signed-in identity
///
/// /editor/sessions                             create
/// /editor/sessions/{id}                        get, delete
/// /editor/sessions/{id}/video                  upload (multipart)
/// /editor/sessions/{id}/duration               report duration (PUT)
/// /editor/sessions/{id}/video/{video_id}       displayed video bytes
/// /editor/sessions/{id}/frames/{index}         frame image bytes
/// /editor/sessions/{id}/selection/{index}      toggle (POST)
/// /editor/sessions/{id}/selection              clear (DELETE)
/// /editor/sessions/{id}/generate               interpolate + splice (POST)
/// /editor/sessions/{id}/save                   render + persist (POST)
///
/// /projects                                    list (?page=N)
/// /projects/{id}                               get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/editor", editor::router())
        .nest("/projects", projects::router())
}
