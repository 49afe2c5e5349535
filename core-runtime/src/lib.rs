//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by the alarm ringing core:
//! - Logging and tracing infrastructure
//! - Configuration management (`RingerConfig`)
//! - Event bus system for ringing lifecycle events
//!
//! ## Overview
//!
//! The ringing controller, the interruption monitor and the host façade all
//! log through `tracing`, read their bridges and timing bounds from one
//! validated [`config::RingerConfig`], and publish lifecycle changes on one
//! [`events::EventBus`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
