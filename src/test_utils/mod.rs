//! Test utilities.
//!
//! This module provides:
//! - In-memory repository implementations for mocking persistence
//! - Test data factories for creating valid usage fixtures
//! - A stub LLM client so route tests never touch the network
//! - A TestServer harness wiring all of the above behind the real router

mod factories;
mod mocks;
mod server;

pub use factories::*;
pub use mocks::*;
pub use server::*;
