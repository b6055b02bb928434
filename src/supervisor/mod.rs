//! Child process supervision.
//!
//! Keeps exactly one current instance of the configured command, replacing it
//! on every settle signal.

mod process;
mod supervisor;

pub use process::CommandTemplate;
pub use supervisor::{
    ChildExit, KillPolicy, RunningChild, Supervisor, SupervisorStats, SupervisorStatsSnapshot,
};
