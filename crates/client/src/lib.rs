//! Literacy Census client library.
//!
//! Everything the `census` front end needs, usable on its own and in tests:
//!
//! - [`session`] - process-wide sign-in state and the admin predicate
//! - [`guard`] - routes and the navigation guard
//! - [`identity`] - identity providers (Firebase, in-memory)
//! - [`store`] - document stores (`PostgreSQL`, in-memory)
//! - [`directory`] - public schools directory lookups
//! - [`activity`], [`issues`], [`schools`] - collections built on the store
//! - [`state`] - wiring of all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod activity;
pub mod config;
pub mod directory;
pub mod error;
pub mod guard;
pub mod identity;
pub mod issues;
pub mod schools;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;

pub use error::{AppError, Result};
pub use state::AppState;
