//! Per-target inspection summary

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProcessId, SocketTable, TableKind};

/// Row counts gathered for one target process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    /// Target process
    pub pid: ProcessId,
    /// Row count per table kind, in read order
    pub tables: Vec<(TableKind, usize)>,
    /// Namespace link of the target (`net:[...]`), if it could be read
    pub target_namespace: Option<String>,
    /// Namespace link of the pinned unit while switched, if it could be read
    pub unit_namespace: Option<String>,
}

impl TargetReport {
    /// Summarise the tables read for `pid`
    #[must_use]
    pub fn new(pid: ProcessId, tables: &[SocketTable]) -> Self {
        Self {
            pid,
            tables: tables.iter().map(|t| (t.kind, t.len())).collect(),
            target_namespace: None,
            unit_namespace: None,
        }
    }

    /// Row count for `kind`, if that table was read
    #[must_use]
    pub fn rows_for(&self, kind: TableKind) -> Option<usize> {
        self.tables
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, rows)| *rows)
    }

    /// Total rows across all tables
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|(_, rows)| rows).sum()
    }

    /// Whether the pinned unit was observed in the target's namespace
    ///
    /// `None` when either link could not be read.
    #[must_use]
    pub fn namespaces_match(&self) -> Option<bool> {
        match (&self.target_namespace, &self.unit_namespace) {
            (Some(target), Some(unit)) => Some(target == unit),
            _ => None,
        }
    }
}

impl fmt::Display for TargetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}:", self.pid)?;
        for (kind, rows) in &self.tables {
            write!(f, " {kind}={rows}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SocketTableRow;

    fn table(kind: TableKind, rows: usize) -> SocketTable {
        SocketTable::new(
            kind,
            (0..rows)
                .map(|i| SocketTableRow::from_iter([format!("{i}:")]))
                .collect(),
        )
    }

    #[test]
    fn test_report_counts() {
        let pid = ProcessId::new(42).unwrap();
        let report = TargetReport::new(pid, &[table(TableKind::Tcp, 3), table(TableKind::Udp, 0)]);

        assert_eq!(report.rows_for(TableKind::Tcp), Some(3));
        assert_eq!(report.rows_for(TableKind::Udp), Some(0));
        assert_eq!(report.rows_for(TableKind::Tcp6), None);
        assert_eq!(report.total_rows(), 3);
        assert_eq!(report.to_string(), "pid 42: TCP=3 UDP=0");
    }

    #[test]
    fn test_namespaces_match() {
        let mut report = TargetReport::new(ProcessId::new(1).unwrap(), &[]);
        assert_eq!(report.namespaces_match(), None);

        report.target_namespace = Some("net:[4026531840]".to_string());
        report.unit_namespace = Some("net:[4026531840]".to_string());
        assert_eq!(report.namespaces_match(), Some(true));

        report.unit_namespace = Some("net:[4026532001]".to_string());
        assert_eq!(report.namespaces_match(), Some(false));
    }
}
