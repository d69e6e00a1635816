//! Domain logic for the storyboard editor.
//!
//! Everything in this crate is synchronous and free of I/O: the storyboard
//! splice/provenance model, gallery paging, data-URI codecs, project naming
//! rules, credential validation and thumbnail rendering.

pub mod credentials;
pub mod data_uri;
pub mod error;
pub mod gallery;
pub mod project;
pub mod storyboard;
pub mod thumbnail;
pub mod types;
