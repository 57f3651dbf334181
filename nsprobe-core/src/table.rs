//! Socket table value objects
//!
//! Rows are kept as opaque whitespace-separated tokens. Addresses, ports,
//! states and inodes stay in the hex/decimal text form the kernel emits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Protocol family of a kernel socket table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// IPv4 TCP sockets
    Tcp,
    /// IPv4 UDP sockets
    Udp,
    /// IPv6 TCP sockets
    Tcp6,
    /// IPv6 UDP sockets
    Udp6,
}

impl TableKind {
    /// Every table kind, in reporting order
    pub const ALL: [Self; 4] = [Self::Tcp, Self::Udp, Self::Tcp6, Self::Udp6];

    /// File name of the table under a `net/` proc directory
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Tcp6 => "tcp6",
            Self::Udp6 => "udp6",
        }
    }

    /// Upper-case label used in log records
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Tcp6 => "TCP6",
            Self::Udp6 => "UDP6",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TableKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Unknown table kind '{s}' (expected tcp, udp, tcp6 or udp6)"
                ))
            })
    }
}

/// One line of a kernel socket table, split into fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketTableRow(Vec<String>);

impl SocketTableRow {
    /// Create a row from already tokenized fields
    #[must_use]
    pub const fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    /// Fields in source order
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Field at `index`, if present
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the row and return its fields
    #[must_use]
    pub fn into_fields(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for SocketTableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for SocketTableRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// All rows read from one kernel socket table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketTable {
    /// Which table the rows came from
    pub kind: TableKind,
    /// Rows in source order
    pub rows: Vec<SocketTableRow>,
}

impl SocketTable {
    /// Create a table from parsed rows
    #[must_use]
    pub const fn new(kind: TableKind, rows: Vec<SocketTableRow>) -> Self {
        Self { kind, rows }
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows
    pub fn iter(&self) -> std::slice::Iter<'_, SocketTableRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a SocketTable {
    type Item = &'a SocketTableRow;
    type IntoIter = std::slice::Iter<'a, SocketTableRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
