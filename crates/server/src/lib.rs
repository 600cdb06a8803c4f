//! Vitrine server library.
//!
//! Storefront reads and the admin editor endpoints, exposed as a library so
//! the router can be driven by integration tests with in-memory stores.
//!
//! # Layers
//!
//! - [`routes`] - axum handlers and the [`routes::app`] router
//! - [`services`] - product and settings editors, asset reconciliation
//! - [`db`] - record store (`PostgreSQL` JSONB or in-memory)
//! - [`media`] - media host client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
