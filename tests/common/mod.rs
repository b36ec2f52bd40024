//! Shared test helpers.

pub mod mock_hardware;

pub use mock_hardware::*;
