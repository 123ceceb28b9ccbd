//! Rain Advisory Core - Shared domain types.
//!
//! This crate provides the types used across all Rain Advisory components:
//! - `web` - Farmer-facing site, dashboard, reports and admin panel
//! - `cli` - Operational commands (session table, role checks)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Rows are owned by the hosted data service; these types
//! mirror its columns so they can be deserialized straight from PostgREST.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email addresses, enums and table rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
