//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the catalog core and
//! platform-specific implementations. The core never talks to the network
//! directly; it goes through the [`HttpClient`](http::HttpClient) trait so
//! that desktop builds can use a pooled reqwest client while tests inject a
//! scripted mock.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and preserve enough detail (connect failure vs. timeout)
//! for the transport layer to classify them.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
