//! Data models for the portal backend.
//!
//! Field names serialize as camelCase to match the portal frontend.

mod activity;
mod document;
mod member;
mod project;

pub use activity::*;
pub use document::*;
pub use member::*;
pub use project::*;
