//! # Route Modules
//!
//! One module per resource group. Each exposes `router()` returning a
//! `Router<AppState>`; [`crate::app`] merges them.

pub mod beds;
pub mod board;
pub mod reference;
pub mod sectors;
