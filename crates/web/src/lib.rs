//! Rain Advisory web library.
//!
//! Server-rendered pages for farmers (dashboard, reports) and an admin panel,
//! backed by a hosted Supabase project: PostgREST for table reads and GoTrue
//! for sign-in. The library holds everything except process startup so the
//! router can be exercised in tests with an in-memory session store.
//!
//! # Authorization
//!
//! The admin surface is gated by the Access Guard ([`services::access`]),
//! which only grants after the Role Resolver ([`services::roles`]) confirms
//! an `admin` row in `user_roles` for the signed-in user.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
