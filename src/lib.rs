//! fswatch
//!
//! Watches directory trees and restarts a command once changes settle.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod error;
pub mod observability;
pub mod supervisor;
pub mod watcher;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
