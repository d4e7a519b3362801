//! Per-task sandbox: the working directory, its audit log, and the command executor.
//!
//! Commands run through a shell with the task's workspace as the current directory.
//! This is a trusted-input boundary: task definitions may run arbitrary commands, and
//! the sandbox only confines file-step paths and bounds process lifetime. It is not a
//! security boundary against hostile task authors.

mod capture;
mod context;
mod executor;
mod log;
mod paths;

pub use context::SandboxContext;
pub use executor::{SandboxExecutor, ScriptLang};
pub use log::TaskLog;
pub use paths::{confine, normalize_relative};
