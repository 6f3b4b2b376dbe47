//! HTTP client for a DataForSEO-shaped asynchronous SERP task API.
//!
//! Implements [`serpwatch_core::provider::RankProvider`]: batches are posted
//! to `task_post`, completion is read from `tasks_ready` and from per-task
//! `task_get` lookups, and completed listings are fetched with `task_get`.
//! Credentials live here; the check engine only sees the trait.

mod client;
mod wire;

pub mod error;

pub use client::{DataForSeoClient, ProviderConfig};
pub use error::{Error, Result};
