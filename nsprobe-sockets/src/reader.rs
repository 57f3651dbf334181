//! Reading socket tables from a `net/` proc directory

use std::fs;
use std::path::{Path, PathBuf};

use nsprobe_core::{Error, Result, SocketTable, TableKind};
use tracing::debug;

use crate::parser::parse_table;

/// Socket tables of the calling thread's network namespace
///
/// `/proc/net` follows `/proc/self`, i.e. the thread-group leader, which
/// does not move when another thread switches namespace.
pub const PROC_NET_ROOT: &str = "/proc/thread-self/net";

/// Reads socket tables from a directory holding `tcp`, `udp`, `tcp6`, `udp6`
///
/// Reads are plain blocking file I/O on purpose: they resolve against the
/// namespace of the thread performing them, so they must run on the pinned
/// unit itself and never be handed to another thread pool.
#[derive(Debug, Clone)]
pub struct SocketTableReader {
    root: PathBuf,
}

impl SocketTableReader {
    /// Reader for the calling thread's namespace
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(PROC_NET_ROOT)
    }

    /// Reader for tables stored under `root`
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory tables are read from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the `kind` table
    #[must_use]
    pub fn path_for(&self, kind: TableKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    /// Read and parse one table
    ///
    /// # Errors
    /// Returns [`Error::ResourceUnavailable`] if the table cannot be opened
    /// or read, e.g. because the target process exited after the switch.
    pub fn read(&self, kind: TableKind) -> Result<SocketTable> {
        let path = self.path_for(kind);

        let content = fs::read_to_string(&path).map_err(|source| {
            tracing::error!(
                kind = %kind,
                path = %path.display(),
                error = %source,
                "Failed to read socket table"
            );
            Error::ResourceUnavailable {
                path: path.clone(),
                source,
            }
        })?;

        let table = parse_table(kind, &content);

        debug!(kind = %kind, rows = table.len(), path = %path.display(), "Read socket table");

        Ok(table)
    }

    /// Read `kinds` one after another, stopping at the first failure
    pub fn read_all(&self, kinds: &[TableKind]) -> Result<Vec<SocketTable>> {
        kinds.iter().map(|kind| self.read(*kind)).collect()
    }
}

impl Default for SocketTableReader {
    fn default() -> Self {
        Self::new()
    }
}
