//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the reconciliation core and the
//! operating system (the git executable, the account database).
//! Implementations live in `src/adapters/`.

pub mod accounts;
pub mod vcs;

pub use accounts::{Account, Accounts};
pub use vcs::{VcsCommand, VcsExecutor};
