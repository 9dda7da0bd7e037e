#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Slidebot Server
//!
//! An in-memory realtime room server for a sliding-robot puzzle game.
//!
//! No database, no cloud services. One process owns the authoritative state,
//! snapshots it to a JSON file, and serves JSON RPC plus a WebSocket push
//! channel per room.

/// HTTP routes, WebSocket push connections, and CORS
pub mod api;

/// Server configuration and environment variables
pub mod config;

/// Typed service errors
pub mod errors;

/// Game kernel: board, sliding physics, verification, game generation
pub mod game;

/// Structured logging configuration
pub mod logging;

/// Snapshot save/load
pub mod persistence;

/// Wire types, message shapes, room codes, validation
pub mod protocol;

/// Room state, repository, and the pure managers
pub mod room;

/// Service facade, timers, event fan-out, maintenance
pub mod server;

/// Process-lifetime counters
pub mod stats;
