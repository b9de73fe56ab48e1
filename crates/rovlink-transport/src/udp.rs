use std::net::UdpSocket;

use tracing::debug;

use crate::error::{Result, TransportError};

/// The best-effort telemetry transport — a UDP socket on an ephemeral
/// local port.
///
/// The local port is advertised to the remote side during the control
/// handshake; datagrams may be lost or arrive out of order and the
/// receiver tolerates both.
pub struct TelemetrySocket {
    inner: UdpSocket,
    local_port: u16,
}

impl TelemetrySocket {
    /// Bind an ephemeral port on all interfaces.
    pub fn bind() -> Result<Self> {
        let inner = UdpSocket::bind(("0.0.0.0", 0)).map_err(|source| TransportError::Bind {
            addr: "0.0.0.0:0".to_string(),
            source,
        })?;
        let local_port = inner.local_addr()?.port();
        debug!(local_port, "bound telemetry socket");
        Ok(Self { inner, local_port })
    }

    /// Local port the remote side should address datagrams to.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Receive one datagram (blocking).
    ///
    /// Returns `Ok(0)` once the socket has been [`shutdown`](Self::shutdown);
    /// the receive loop treats a zero-length read as its exit condition.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let (read, _addr) = self.inner.recv_from(buf)?;
        Ok(read)
    }

    /// Try to clone this socket (new file descriptor, same port).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            local_port: self.local_port,
        })
    }

    /// Force a blocked `recv` on any clone of this socket to return.
    ///
    /// `std` exposes no shutdown for datagram sockets; on unix the raw
    /// `shutdown(2)` call still wakes a pending `recvfrom`.
    #[cfg(unix)]
    pub fn shutdown(&self) {
        use std::os::fd::AsRawFd;

        // SAFETY: the fd is an open UDP socket owned by this process;
        // shutdown on a datagram socket only wakes pending receives.
        unsafe {
            libc::shutdown(self.inner.as_raw_fd(), libc::SHUT_RDWR);
        }
    }

    /// Force a blocked `recv` on any clone of this socket to return.
    ///
    /// Without `shutdown(2)`, wake the receiver with an empty datagram to
    /// our own port; the zero-length read is the same exit signal.
    #[cfg(not(unix))]
    pub fn shutdown(&self) {
        let _ = self.inner.send_to(&[], ("127.0.0.1", self.local_port));
    }
}

impl std::fmt::Debug for TelemetrySocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySocket")
            .field("local_port", &self.local_port)
            .finish()
    }
}
