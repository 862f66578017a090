//! Infrastructure layer for the refresh agent.
//!
//! Contains OS-facing adapters: the config and settings files, the credential
//! tool process, and the command bridge used by the settings panel.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `tokenrefresh_core`, but MUST NOT be imported by the `application` or domain
//! layers outside of tests.

pub mod provider;
pub mod storage;
pub mod ui_bridge;
