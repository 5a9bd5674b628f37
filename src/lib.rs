//! Library crate for battleground-lobby, exposing modules for the binary and integration tests.

/// Configuration file loading and defaults.
pub mod config;
/// Socket abstraction and its WebSocket and in-memory implementations.
pub mod connection;
/// Wire messages exchanged with the matchmaking server.
pub mod dto;
/// Error and notice types.
pub mod error;
/// Lobby controller and its async driver.
pub mod services;
/// Lobby state, state machine and game handoff.
pub mod state;
