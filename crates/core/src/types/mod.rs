//! Core types for Clique & Recicle.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod collection_point;
pub mod email;
pub mod favorite;
pub mod id;
pub mod role;

pub use collection_point::{
    CollectionPoint, DraftError, NewCollectionPoint, ONBOARDING_MATERIALS, parse_materials,
};
pub use email::{Email, EmailError};
pub use favorite::Favorite;
pub use id::*;
pub use role::UserRole;
