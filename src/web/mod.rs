// src/web/mod.rs
//! HTTP surface
//!
//! A tiny axum server publishing the snapshot as JSON next to a static
//! dashboard page that polls it.

/// Router, handlers and the serve loop
pub mod server;

pub use server::{bind, router, serve};
