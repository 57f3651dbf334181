use std::fs;
use std::path::Path;

use nsprobe_core::Error;
use nsprobe_sockets::*;

const TCP_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";
const UDP_HEADER: &str = "   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops";

fn write_table(dir: &Path, kind: TableKind, header: &str, rows: &[&str]) {
    let mut content = format!("{header}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(dir.join(kind.file_name()), content).unwrap();
}

#[test]
fn test_read_synthetic_tcp_table() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        TableKind::Tcp,
        TCP_HEADER,
        &[
            "   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 12345 1 0000000000000000 100 0 0 10 0",
            "",
        ],
    );

    let table = SocketTableReader::with_root(dir.path())
        .read(TableKind::Tcp)
        .unwrap();

    assert_eq!(table.kind, TableKind::Tcp);
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows[0].get(0), Some("0:"));
}

#[test]
fn test_empty_table_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), TableKind::Udp6, UDP_HEADER, &[""]);

    let table = SocketTableReader::with_root(dir.path())
        .read(TableKind::Udp6)
        .unwrap();

    assert!(table.is_empty());
}

#[test]
fn test_kinds_do_not_mix() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        TableKind::Tcp,
        TCP_HEADER,
        &[
            "   0: 0100007F:1F90 00000000:0000 0A tcp-only",
            "   1: 0100007F:0016 00000000:0000 0A tcp-only",
        ],
    );
    write_table(
        dir.path(),
        TableKind::Udp,
        UDP_HEADER,
        &["  123: 00000000:0044 00000000:0000 07 udp-only"],
    );

    let reader = SocketTableReader::with_root(dir.path());
    let tables = reader.read_all(&[TableKind::Tcp, TableKind::Udp]).unwrap();

    assert_eq!(tables[0].kind, TableKind::Tcp);
    assert_eq!(tables[0].len(), 2);
    assert!(tables[0].iter().all(|row| row.get(4) == Some("tcp-only")));

    assert_eq!(tables[1].kind, TableKind::Udp);
    assert_eq!(tables[1].len(), 1);
    assert!(tables[1].iter().all(|row| row.get(4) == Some("udp-only")));
}

#[test]
fn test_missing_table_is_resource_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), TableKind::Tcp, TCP_HEADER, &[]);

    let reader = SocketTableReader::with_root(dir.path());
    let err = reader.read_all(&TableKind::ALL).unwrap_err();

    match err {
        Error::ResourceUnavailable { path, .. } => assert_eq!(path, dir.path().join("udp")),
        other => panic!("unexpected error: {other}"),
    }
}
