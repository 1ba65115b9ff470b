//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the media catalog client:
//! - Logging and tracing infrastructure
//! - Configuration management (server profiles, default saved filters)
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the catalog core depends on.
//! It establishes the logging conventions, the process-wide active-server
//! handle, and the event broadcasting mechanism used to fan out server
//! switches and default-filter changes.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, DefaultFilterSettings, FilterTab, ServerConfig, ServerProfile};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, FilterEvent, ServerEvent};
