//! Core types and trait definitions for the switchboard call center.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! webhook server, the SQLite backend and the operator CLI all depend on it;
//! it only describes configuration, runtime logs, and the seams (store, job
//! queue, notifier) the call flow is driven through.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod error;
pub mod jobs;
pub mod list;
pub mod mailbox;
pub mod menu;
pub mod notify;
pub mod number;
pub mod phone;
pub mod record;
pub mod store;

pub use error::{Error, Result};
