//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web)
//! - Score service transport (fetch)
//! - Canvas drawing

#[cfg(target_arch = "wasm32")]
pub mod web;
