//! Best-effort namespace link inspection for diagnostics

use std::fs;

use nsprobe_core::{ProcessId, ThreadId};

/// Read the `net:[<inode>]` link of process `pid`
///
/// Returns `None` if the link cannot be read; callers only log the value.
#[must_use]
pub fn net_link_for_pid(pid: ProcessId) -> Option<String> {
    read_link(&format!("/proc/{pid}/ns/net"))
}

/// Read the `net:[<inode>]` link of thread `tid` of process `pid`
#[must_use]
pub fn net_link_for_thread(pid: ProcessId, tid: ThreadId) -> Option<String> {
    read_link(&format!("/proc/{pid}/task/{tid}/ns/net"))
}

fn read_link(path: &str) -> Option<String> {
    match fs::read_link(path) {
        Ok(link) => Some(link.to_string_lossy().into_owned()),
        Err(e) => {
            tracing::debug!(path, error = %e, "Could not read namespace link");
            None
        }
    }
}
