//! HTTP Control Surface (spec.md §4.6): exposes the Runtime Facade over
//! HTTP with shared-token auth, JSON request/response mapping, and
//! multipart upload.

mod auth;
mod dto;
mod error;
mod routes;
mod state;

pub use routes::build_router;
pub use state::AppState;
