//! Process attribution: resolve a packet's 5-tuple to the owning process by
//! cross-referencing the kernel's procfs socket tables.

mod process;
mod socket_table;

pub use process::{find_process_by_inode, ProcessInfo};
pub use socket_table::{find_inode, parse_table, read_table, SocketEntry};

use std::net::Ipv4Addr;

use crate::parser::Protocol;

/// Resolve the process owning the socket for a packet's 5-tuple.
/// Returns `None` if the socket can't be found in the kernel table or the
/// owning process can't be located — both are success-with-null results.
pub fn lookup_process(
    protocol: Protocol,
    src_ip: Ipv4Addr,
    src_port: u16,
    dst_ip: Ipv4Addr,
    dst_port: u16,
) -> Option<ProcessInfo> {
    let entries = read_table(protocol).ok()?;
    let inode = find_inode(&entries, src_ip, src_port, dst_ip, dst_port);
    if inode == 0 {
        return None;
    }
    find_process_by_inode(inode)
}
