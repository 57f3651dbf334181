//! CLI argument definitions

use clap::Parser;
use nsprobe_core::TableKind;

#[derive(Parser, Debug)]
#[command(name = "nsprobe")]
#[command(
    about = "Inspect socket tables inside another process's network namespace",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Comma-separated PIDs to inspect (e.g. 1,42,977)
    #[arg(short, long = "pid", value_name = "PIDS")]
    pub pids: String,

    /// Check that no runtime task observes the switched namespace
    #[arg(short = 'f', long)]
    pub force_schedule: bool,

    /// Tables to read (tcp, udp, tcp6, udp6)
    #[arg(short, long, value_delimiter = ',', default_values_t = TableKind::ALL)]
    pub tables: Vec<TableKind>,

    /// Continue with the next PID when one fails
    #[arg(short, long)]
    pub keep_going: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["nsprobe", "--pid", "1"]).unwrap();

        assert_eq!(cli.pids, "1");
        assert_eq!(cli.tables, TableKind::ALL.to_vec());
        assert!(!cli.force_schedule);
        assert!(!cli.keep_going);
    }

    #[test]
    fn test_table_selection() {
        let cli =
            Cli::try_parse_from(["nsprobe", "-p", "1,2", "-t", "udp6,tcp", "-f", "-k"]).unwrap();

        assert_eq!(cli.tables, vec![TableKind::Udp6, TableKind::Tcp]);
        assert!(cli.force_schedule);
        assert!(cli.keep_going);
    }

    #[test]
    fn test_unknown_table_rejected() {
        assert!(Cli::try_parse_from(["nsprobe", "-p", "1", "-t", "sctp"]).is_err());
    }
}
