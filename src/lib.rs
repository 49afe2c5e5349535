//! Workspace placeholder crate.
//!
//! This crate exposes the feature flags that map onto the individual workspace
//! crates (`core-service`, `core-ringing`). Host applications can depend on
//! `alarm-ring-workspace` and pick `desktop-shims` (default bridges for
//! storage, presence, power and vibration) or `headless` (every bridge is
//! injected by the host) without wiring each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_ringing as ringing;
#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_service as service;
