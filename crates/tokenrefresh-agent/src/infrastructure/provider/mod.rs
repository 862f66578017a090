//! Credential provider adapters.
//!
//! - `process` runs the real credential tool as a child process.
//! - `locate` finds that tool on the user's `PATH`.
//! - `mock` is a scripted stand-in for tests.

pub mod locate;
pub mod mock;
pub mod process;

pub use locate::{locate_credential_tool, CREDENTIAL_TOOL_EXE};
pub use process::ProcessCredentialProvider;
