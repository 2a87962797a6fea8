//! Infrastructure adapters. Implement outbound ports, drive inbound ones.
//!
//! AI model, identity service, SQLite, HTTP. Map errors to DomainError.

pub mod ai;
pub mod http;
pub mod identity;
pub mod persistence;
pub mod ui;
