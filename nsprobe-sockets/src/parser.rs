//! Socket table text parsing
//!
//! Format (`/proc/net/tcp`, abbreviated):
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
//!    0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345
//! ```
//! The first line is a header. Every other line is one socket, fields
//! separated by runs of spaces. Blank lines carry no socket.

use std::iter::{FusedIterator, Skip};
use std::str::Lines;

use nsprobe_core::{SocketTable, SocketTableRow, TableKind};

/// Lazy iterator over the rows of one table's text
///
/// # Example
/// ```
/// use nsprobe_sockets::SocketTableParser;
///
/// let text = "  sl  local_address rem_address\n   0: 0100007F:1F90 00000000:0000 0A\n\n";
/// let rows: Vec<_> = SocketTableParser::new(text).collect();
///
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].get(0), Some("0:"));
/// ```
#[derive(Debug, Clone)]
pub struct SocketTableParser<'a> {
    lines: Skip<Lines<'a>>,
}

impl<'a> SocketTableParser<'a> {
    /// Start parsing `content`, skipping its header line
    #[must_use]
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().skip(1),
        }
    }
}

impl Iterator for SocketTableParser<'_> {
    type Item = SocketTableRow;

    fn next(&mut self) -> Option<SocketTableRow> {
        self.lines.by_ref().find_map(|line| {
            let fields: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
            (!fields.is_empty()).then(|| SocketTableRow::new(fields))
        })
    }
}

impl FusedIterator for SocketTableParser<'_> {}

/// Parse the full text of a `kind` table
#[must_use]
pub fn parse_table(kind: TableKind, content: &str) -> SocketTable {
    SocketTable::new(kind, SocketTableParser::new(content).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

    #[test]
    fn test_single_row_and_trailing_blank() {
        let text = format!(
            "{HEADER}\n   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345\n\n"
        );

        let table = parse_table(TableKind::Tcp, &text);

        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.get(0), Some("0:"));
        assert_eq!(row.get(1), Some("0100007F:1F90"));
        assert_eq!(row.get(3), Some("0A"));
        assert_eq!(row.fields().last().map(String::as_str), Some("12345"));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_table(TableKind::Udp, &format!("{HEADER}\n")).is_empty());
        assert!(parse_table(TableKind::Udp, &format!("{HEADER}\n\n   \n")).is_empty());
        assert!(parse_table(TableKind::Udp, HEADER).is_empty());
        assert!(parse_table(TableKind::Udp, "").is_empty());
    }

    #[test]
    fn test_field_order_preserved() {
        let text = format!("{HEADER}\n 1: b a c\n 2: c b a\n");
        let rows: Vec<Vec<String>> = SocketTableParser::new(&text)
            .map(SocketTableRow::into_fields)
            .collect();

        assert_eq!(rows, vec![vec!["1:", "b", "a", "c"], vec!["2:", "c", "b", "a"]]);
    }

    #[test]
    fn test_blank_lines_between_rows() {
        let text = format!("{HEADER}\n 0: x\n\n\t\n 1: y\n");
        let table = parse_table(TableKind::Tcp6, &text);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get(1), Some("y"));
    }

    #[test]
    fn test_last_line_without_newline_kept() {
        let text = format!("{HEADER}\n 0: x\n 1: y");
        assert_eq!(parse_table(TableKind::Udp6, &text).len(), 2);
    }

    #[test]
    fn test_parser_is_lazy_and_fused() {
        let text = format!("{HEADER}\n 0: x\n 1: y\n");
        let mut parser = SocketTableParser::new(&text);

        let first = parser.next().unwrap();
        assert_eq!(first.get(1), Some("x"));
        assert!(parser.next().is_some());
        assert!(parser.next().is_none());
        assert!(parser.next().is_none());
    }
}
