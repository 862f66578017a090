//! Application layer use cases for the refresh agent.
//!
//! Code here orchestrates the domain through two traits and performs no file
//! or process I/O of its own:
//!
//! - **`credential_provider`** – the `CredentialProvider` trait the scheduler
//!   calls to mint a token.
//! - **`token_store`** – the `TokenStore` trait the scheduler commits tokens to.
//! - **`refresh_scheduler`** – the start/stop-able loop that runs one refresh
//!   cycle immediately and then one per interval, never overlapping.
//! - **`observe`** – read-only accessors for the current token and the
//!   scheduler's counters.

pub mod credential_provider;
pub mod observe;
pub mod refresh_scheduler;
pub mod token_store;
