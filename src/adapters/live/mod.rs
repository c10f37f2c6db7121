//! Live adapters for real external interactions.

pub mod accounts;
pub mod vcs;
