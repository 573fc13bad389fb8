//! Core types - pure abstractions shared across the codebase.

mod state;

pub use state::{CancelToken, setup_shutdown_handler, shutdown_token};
