//! HTTP shell for the storyboard editor: auth, editor sessions and the
//! project gallery.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod routes;
pub mod state;
