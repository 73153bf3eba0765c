//! # qrgen App
//!
//! Application host for the qrgen QR code generator.
//!
//! ## Usage
//!
//! ```bash
//! qrgen generate "https://github.com" --format png --out ./codes --save
//! qrgen history list --search github
//! qrgen theme set dark
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Data directory, environment theme, and storage quota
//! - `Controller` - Owns all state and maps user actions to it
//! - `execute` - Runs one parsed command against a controller

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod telemetry;

pub use cli::{CliArgs, Command};
pub use commands::{execute, write_notifications};
pub use config::AppConfig;
pub use controller::Controller;
