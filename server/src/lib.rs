//! Planet simulation server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod game_loop;
pub mod state;
pub mod wanderer;
pub mod world;
