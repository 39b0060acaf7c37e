pub mod config;
pub mod error;
pub mod git;
pub mod hook;
pub mod inspect;
pub mod preflight;
pub mod snapshot;
pub mod staged;

pub use config::Config;
pub use error::GateError;
pub use hook::{run_pre_commit, HookOutcome};
