//! Literacy Census Core - Shared types library.
//!
//! This crate provides the domain types used across all Literacy Census components:
//! - `client` - Session, identity, document store, directory and issue clients
//! - `cli` - The `census` command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and static data - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identities, string IDs, emails, issue and activity vocabularies, school records
//! - [`catalog`] - The curated table of curriculum providers and their product lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use catalog::{CurriculumProvider, products_for_provider, provider_names};
pub use types::*;
