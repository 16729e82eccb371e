//! Clique & Recicle Core - Shared types library.
//!
//! This crate provides common types used across all Clique & Recicle components:
//! - `web` - Public-facing site (collection points, favorites, agent dashboard)
//! - `cli` - Command-line tools for seeding and inspecting collection points
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no knowledge of the hosted backend. This keeps it lightweight and
//! allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, roles, collection points and favorites

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
