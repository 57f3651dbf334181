//! Probe configuration

use nsprobe_core::{Error, ProcessId, TableKind};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// What one invocation inspects, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Targets, inspected one after another
    pub pids: Vec<ProcessId>,

    /// Tables read for every target, in order
    pub tables: Vec<TableKind>,

    /// Run the exclusivity probe alongside every session
    pub force_schedule: bool,

    /// Continue after a failed target and report all failures at the end
    pub keep_going: bool,
}

impl ProbeConfig {
    /// Inspect `pids`, reading every table kind
    #[must_use]
    pub fn new(pids: Vec<ProcessId>) -> Self {
        Self {
            pids,
            tables: TableKind::ALL.to_vec(),
            force_schedule: false,
            keep_going: false,
        }
    }

    /// Read only `tables`
    #[must_use]
    pub fn with_tables(mut self, tables: Vec<TableKind>) -> Self {
        self.tables = tables;
        self
    }

    /// Enable the exclusivity probe
    #[must_use]
    pub fn with_force_schedule(mut self, enable: bool) -> Self {
        self.force_schedule = enable;
        self
    }

    /// Continue past failed targets
    #[must_use]
    pub fn with_keep_going(mut self, enable: bool) -> Self {
        self.keep_going = enable;
        self
    }
}

impl TryFrom<&Cli> for ProbeConfig {
    type Error = Error;

    fn try_from(cli: &Cli) -> Result<Self, Error> {
        let pids = ProcessId::parse_list(&cli.pids)?;

        let mut tables = Vec::with_capacity(cli.tables.len());
        for kind in &cli.tables {
            if !tables.contains(kind) {
                tables.push(*kind);
            }
        }

        Ok(Self::new(pids)
            .with_tables(tables)
            .with_force_schedule(cli.force_schedule)
            .with_keep_going(cli.keep_going))
    }
}
