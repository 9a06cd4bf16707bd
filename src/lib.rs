// ABOUTME: Library root for cutover - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod error;
pub mod events;
pub mod health;
pub mod output;
pub mod pointer;
pub mod push;
pub mod types;
