//! Taskboard: storage and ordering core for multi-tenant project planning.
//!
//! Tasks belong to projects owned by organizations and carry two dense
//! orderings: a project-wide Gantt sequence and a per-status board column
//! sequence. The crate keeps both gap-free under moves, inserts, deletes and
//! status changes, guards dependency edges, evaluates visibility itself, and
//! imports plans produced by a pluggable collaborator.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Planning domain, ports, adapters and services
//! - [`config`]: Environment configuration
//! - [`telemetry`]: Tracing setup for binaries

pub mod config;
pub mod task;
pub mod telemetry;
