//! Cooperative member-finance backend: member registry, contributions,
//! loan lifecycle and settings over a hosted Postgres REST backend.

pub mod backend;
pub mod config;
