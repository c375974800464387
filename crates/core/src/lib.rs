//! KidsGPT Core - Shared types library.
//!
//! This crate provides common types used across all KidsGPT components:
//! - `client` - Typed client for the KidsGPT backend API and session handling
//! - `cli` - Command-line front end over the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, PINs, and the
//!   closed role/tier/portal enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
