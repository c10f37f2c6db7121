//! Port implementations.
//!
//! `live` talks to the real system; `scripted` answers from canned data and
//! records what it was asked.

pub mod live;
pub mod scripted;
