//! Domain model for the Phyto diagnosis gateway.
//!
//! This crate holds everything that does not touch a process, a socket or a
//! file: the classification and advisory contracts, engine-output parsing,
//! the treatment prompt, client-side history and chat state, and the
//! configuration types shared by the binaries.
//!
//! # Module Structure
//!
//! - `classification`: image payloads, results, the `ClassificationInvoker` trait
//! - `advisory`: advisory requests, prompt construction, the `AdvisoryService` trait
//! - `history`: the client-side `ClassificationHistory`
//! - `chat`: chat messages, the per-entry `ChatSession`, message formatting
//! - `config`: `GatewayConfig` and its sections
//! - `error`: the crate-wide `PhytoError`
//! - `wire`: JSON bodies of the HTTP contract

pub mod advisory;
pub mod chat;
pub mod classification;
pub mod config;
pub mod error;
pub mod history;
pub mod wire;

pub use error::{PhytoError, Result};
