//! Project planning: tasks, their two orderings, dependencies, tenancy,
//! sharing and plan import.
//!
//! The reordering engine keeps each project's Gantt sequence and each board
//! column dense (1..N) across moves, creation, deletion, field edits and
//! status transitions. Every store call carries an explicit access context;
//! maintenance paths run with [`domain::AccessContext::Bypass`] after the
//! caller was authorized once. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
