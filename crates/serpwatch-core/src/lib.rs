//! Core types and trait definitions for serpwatch.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the ranking data model, the pure pieces of the check pipeline (domain
//! matching, result normalisation, delta classification) and the traits the
//! provider client and the history store implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod delta;
pub mod domain;
pub mod error;
pub mod history;
pub mod keyword;
pub mod observation;
pub mod provider;
pub mod serp;
pub mod store;

pub use error::{Error, Result};
