//! Core types for Literacy Census.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod school;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{Identity, LinkedProvider, ProviderKind, UnknownProviderKind};
pub use school::{SchoolDraft, SchoolRecord};
pub use status::*;
