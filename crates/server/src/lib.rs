//! Woolery backend library.
//!
//! This crate provides the backend as a library, allowing the router to be
//! tested in-process and reused by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod pricing;
pub mod routes;
pub mod state;

pub use routes::app;
pub use state::AppState;
