//! Clique & Recicle web application library.
//!
//! This crate provides the web application as a library, so the router and
//! controllers can be driven from integration tests and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
