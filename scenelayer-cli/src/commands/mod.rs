//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`init`] - Configuration initialization
//! - [`rules`] - Print request parameters for a selection
//! - [`export`] - Render a view to an image file
//! - [`thumbnail`] - Capture a custom renderer's thumbnail

pub mod common;
pub mod export;
pub mod init;
pub mod rules;
pub mod thumbnail;
