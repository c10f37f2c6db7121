//! Scripted adapters that answer from canned responses.
//!
//! Used by tests to drive inspection and reconciliation without a real
//! git binary or account database.

pub mod accounts;
pub mod vcs;

pub use accounts::StaticAccounts;
pub use vcs::{RecordedCall, ScriptedVcs};
