//! Editor session orchestration.
//!
//! [`session::EditorSession`] is the explicit state machine for one editing
//! session. [`orchestrator::Orchestrator`] drives it against the external
//! collaborators declared in [`ports`], and [`registry::SessionRegistry`]
//! keeps the live sessions of all users.

pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod registry;
pub mod session;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{FailureKind, PipelineError};
