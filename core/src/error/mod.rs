#[allow(clippy::module_inception)]
pub mod error;
pub mod task;

pub use error::CliError;
pub use task::{ErrorCode, LoadError, PathError, StoreError, SubmitError};
