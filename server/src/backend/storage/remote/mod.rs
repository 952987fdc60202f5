//! # Remote Backend Client
//!
//! Thin client for the hosted Postgres-as-a-service backend: table reads
//! and single-row writes over its REST interface, named remote procedures,
//! and object storage uploads.

pub mod connection;
pub mod error;
pub mod query;

pub use connection::{FetchedRows, RemoteConnection};
pub use error::RemoteError;
pub use query::{Filters, SelectQuery};
