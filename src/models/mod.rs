//! Data models for the community library.
//!
//! Field names serialize in camelCase to match the dashboard and the JSON data files.

mod book;
mod event;
mod user;

pub use book::*;
pub use event::*;
pub use user::*;
