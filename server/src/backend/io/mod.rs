//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services: request
//! parsing, caller identity, JSON responses and translation of domain
//! errors into status codes.

pub mod rest;
