//! Controllers sitting between the routes and the gateway.
//!
//! # Services
//!
//! - `catalog` - search and pagination over the collection point list
//! - `favorites` - the signed-in user's favorites and the toggle
//! - `forms` - registration, login, onboarding and dashboard forms
//! - `uploads` - photo upload interface
//! - `auth` - sign-in, registration and sign-out

pub mod auth;
pub mod catalog;
pub mod favorites;
pub mod fetch;
pub mod forms;
pub mod uploads;
