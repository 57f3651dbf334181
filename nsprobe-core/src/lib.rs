//! nsprobe Core - Foundation types and errors
//!
//! This crate provides the core abstractions shared by the namespace,
//! socket-table and CLI crates.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod report;
pub mod table;
pub mod types;

pub use error::{Error, Result};
pub use report::TargetReport;
pub use table::{SocketTable, SocketTableRow, TableKind};
pub use types::{NamespaceId, ProcessId, ThreadId};
