//! agentbox core: runs task definitions step by step inside a per-task sandbox
//! directory and records an auditable status/log trail.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod runner;
pub mod sandbox;
pub mod service;
pub mod store;
pub mod task;
pub mod util;
