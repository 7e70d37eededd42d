//! Raw AF_PACKET capture socket bound to a single interface.
//!
//! Opens an AF_PACKET/SOCK_RAW socket in ETH_P_ALL mode, binds it to an
//! interface by name, and performs blocking reads into a caller-provided
//! buffer. Mirrors the teacher's `CaptureEngine`/`windivert_backend` shape:
//! open + bind are fatal on failure, reads are logged and skipped.

use std::io;
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use socket2::Socket;

/// `ETH_P_ALL` in network byte order, as required by `AF_PACKET` sockets
/// that want every EtherType (spec.md §4.2).
fn eth_p_all_network_order() -> i32 {
    (libc::ETH_P_ALL as u16).to_be() as i32
}

/// A raw packet-capture socket bound to one network interface.
pub struct CaptureSocket {
    socket: Socket,
    interface: String,
}

impl CaptureSocket {
    /// Open an `AF_PACKET`/`SOCK_RAW` socket and bind it to `interface`.
    ///
    /// Both the open and the bind are fatal operations: failure here should
    /// terminate the process with exit code 1 (spec.md §4.2, §6).
    pub fn open(interface: &str) -> anyhow::Result<Self> {
        // socket2's typed constructor can't express ETH_P_ALL as the
        // socket(2) protocol argument, so the fd is created via libc
        // directly and then wrapped for socket2's buffered `recv`.
        let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, eth_p_all_network_order()) };
        if fd < 0 {
            return Err(anyhow::anyhow!(
                "create AF_PACKET socket: {}",
                io::Error::last_os_error()
            ));
        }
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        let socket = Socket::from(owned);

        let if_index = nix::net::if_::if_nametoindex(interface)
            .map_err(|e| anyhow::anyhow!("resolve interface {interface}: {e}"))?;

        let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as u16;
        addr.sll_protocol = eth_p_all_network_order() as u16;
        addr.sll_ifindex = if_index as i32;

        let ret = unsafe {
            libc::bind(
                socket.as_raw_fd(),
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as u32,
            )
        };
        if ret != 0 {
            return Err(anyhow::anyhow!(
                "bind to interface {interface}: {}",
                io::Error::last_os_error()
            ));
        }

        Ok(Self {
            socket,
            interface: interface.to_string(),
        })
    }

    /// Block until a frame arrives, writing at most `buf.len()` bytes into
    /// `buf`. Returns the number of bytes written.
    pub fn read_frame(&self, buf: &mut [u8]) -> io::Result<usize> {
        let spare = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr().cast::<MaybeUninit<u8>>(), buf.len())
        };
        self.socket.recv(spare)
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

// `Socket::close` happens implicitly on `Drop` — the underlying fd is
// released on every exit path, matching spec.md §5's scoped-release
// requirement.
