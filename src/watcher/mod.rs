//! File system watching.
//!
//! This module provides:
//! - Depth-bounded registration of directory trees
//! - A change event source using notify-rs, with watch errors logged and absorbed
//! - Coalescing of change bursts into settle signals

mod debounce;
mod events;
mod installer;
mod source;

pub use debounce::Coalescer;
pub use events::{ChangeEvent, Settled, SettledSignal};
pub use installer::{install_watches, WatchRegistry};
pub use source::{drain_errors, ChangeEventSource, EventSink, WatchGuard};
