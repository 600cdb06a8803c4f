//! Vitrine Core - Shared domain types.
//!
//! Used by:
//! - `server` - Storefront API and admin endpoints
//! - `cli` - Migrations, seeding and asset tooling
//!
//! # Architecture
//!
//! The core crate performs no I/O: no database access, no HTTP clients. It
//! holds the record shapes, the per-field asset edit states, and the admin
//! editor state machines that produce work for the server's services.
//!
//! # Modules
//!
//! - [`types`] - Products, settings, assets and submitted forms
//! - [`asset_id`] - Derive a media host identifier from a delivery URL
//! - [`catalog`] - Category grouping for the storefront
//! - [`editor`] - Admin editor state containers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod asset_id;
pub mod catalog;
pub mod editor;
pub mod types;

pub use types::*;
