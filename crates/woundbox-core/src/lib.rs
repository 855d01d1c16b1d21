//! Core types and trait definitions for the Woundbox annotation backend.
//!
//! Deliberately free of HTTP and database dependencies; the domain types,
//! their invariants, and the [`store::WoundStore`] abstraction live here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod annotation;
pub mod assessment;
pub mod error;
pub mod store;
pub mod triage;
pub mod user;

pub use error::{Error, Result};
