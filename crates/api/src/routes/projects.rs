//! Route definitions for the `/projects` gallery.

use axum::routing::get;
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at `/projects`. All require auth and are owner-scoped.
///
/// ```text
/// GET    /        -> list_projects (?page=N)
/// GET    /{id}    -> get_project
/// PUT    /{id}    -> update_project
/// DELETE /{id}    -> delete_project
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(projects::list_projects)).route(
        "/{id}",
        get(projects::get_project)
            .put(projects::update_project)
            .delete(projects::delete_project),
    )
}
