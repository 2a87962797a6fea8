//! Persistence adapters. Profiles (entitlement) and saved weeks.

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
