//! Kernel socket table reading and parsing
//!
//! This crate turns the fixed-format text tables the kernel exposes under
//! `net/` (`tcp`, `udp`, `tcp6`, `udp6`) into [`SocketTable`]s of opaque
//! string fields.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod parser;
pub mod reader;

pub use parser::{SocketTableParser, parse_table};
pub use reader::{PROC_NET_ROOT, SocketTableReader};

// Re-export commonly used types
pub use nsprobe_core::{SocketTable, SocketTableRow, TableKind};
