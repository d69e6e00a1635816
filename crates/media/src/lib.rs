//! HTTP clients for the external media services.
//!
//! One [`api::MediaApi`] talks to the frame-extraction, AI-interpolation and
//! frames-to-video endpoints that share a base URL. Request/response shapes
//! live in [`models`]; configuration in [`config`].

pub mod api;
pub mod config;
pub mod error;
pub mod models;
