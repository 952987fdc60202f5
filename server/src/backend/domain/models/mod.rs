//! Row shapes written to the remote tables.
//!
//! Read models are the `shared` DTOs; these types only describe what the
//! backend is sent on insert and update.

pub mod activity_log;
pub mod contribution;
pub mod loan;
pub mod member;
