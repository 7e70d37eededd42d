//! Maps a socket inode to its owning process by scanning `/proc/*/fd/*`.

use std::fs;

/// Minimal process identity: PID and command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// Read `/proc/<pid>/comm`, trimmed of trailing whitespace/newline.
fn read_comm(pid: u32) -> Option<String> {
    let data = fs::read_to_string(format!("/proc/{pid}/comm")).ok()?;
    Some(data.trim_end().to_string())
}

/// Scan every PID's open file descriptors for one whose symlink target is
/// `socket:[<inode>]`. Returns `None` on no match — "not found" is a
/// success-with-null result, not an error (spec.md §4.6). Per-PID
/// permission errors are swallowed and the scan continues.
pub fn find_process_by_inode(inode: u64) -> Option<ProcessInfo> {
    let target = format!("socket:[{inode}]");

    let proc_entries = fs::read_dir("/proc").ok()?;
    for entry in proc_entries.flatten() {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
            continue;
        };

        let fd_dir = format!("/proc/{pid}/fd");
        let Ok(fds) = fs::read_dir(&fd_dir) else {
            continue;
        };

        for fd_entry in fds.flatten() {
            let Ok(link) = fs::read_link(fd_entry.path()) else {
                continue;
            };
            if link.to_string_lossy() == target {
                let name = read_comm(pid).unwrap_or_default();
                return Some(ProcessInfo { pid, name });
            }
        }
    }

    None
}
