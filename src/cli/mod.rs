//! Command-line interface module.

mod args;
pub mod init;
pub mod manifest;
pub mod upload;

pub use args::{Cli, Commands, UploadArgs};
