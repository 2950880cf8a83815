//! # nir-store: Persistence and Ward Service
//!
//! - [`backend`]: the [`KvBackend`] trait with in-memory and directory
//!   implementations.
//! - [`repository`]: whole-[`Snapshot`] load/commit with a revision check.
//! - [`service`]: [`WardService`], one method per board operation.

pub mod backend;
pub mod error;
pub mod repository;
pub mod service;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use error::{ServiceError, StoreError};
pub use repository::{Repository, Snapshot};
pub use service::{actor_or_system, WardService};
