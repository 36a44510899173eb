//! Adapter implementations of the planning ports.
//!
//! - [`memory::InMemoryTaskStore`]: thread-safe in-memory storage for tests
//! - [`postgres::PostgresTaskStore`]: `PostgreSQL` persistence using Diesel

pub mod memory;
pub mod postgres;
