// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! RunShare API Layer
//!
//! High-level API coordinating run tracking, live sharing, run history and
//! event callbacks.
//!
//! # Example
//!
//! ```ignore
//! use runshare_core::api::{RunShare, RunShareConfig};
//!
//! let app = RunShare::new(
//!     RunShareConfig::with_storage_path("runs.db")
//!         .with_endpoint("https://relay.example")
//!         .with_identity("my-id", "Ana"),
//! )?;
//! app.start_sharing()?;
//! app.start();
//! app.on_fix(fix);
//! let run = app.stop()?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`] - Configuration types
//! - [`events`] - Event system for callbacks
//! - `runshare` - Main RunShare orchestrator

pub mod config;
mod error;
pub mod events;
mod runshare;

// Error types
pub use error::{RunShareError, RunShareResult};

// Configuration
pub use config::{RunShareConfig, StorageLocation};

// Events
pub use events::{CallbackHandler, EventDispatcher, EventHandler, RunShareEvent};

// RunShare
pub use runshare::RunShare;
