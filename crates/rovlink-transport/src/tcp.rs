use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// The reliable control transport — a connected TCP stream.
///
/// Clones share the underlying connection, so one half can sit in a
/// blocked read while the other writes, and [`shutdown`](Self::shutdown)
/// on either clone unblocks both.
pub struct ControlStream {
    inner: TcpStream,
    peer: SocketAddr,
}

impl ControlStream {
    /// Connect to `host:port` with a bounded timeout.
    ///
    /// Resolution picks the first usable address. Refusal and timeout both
    /// surface as [`TransportError::Connect`].
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve {
                host: host.to_string(),
                port,
            })?
            .next()
            .ok_or_else(|| TransportError::Resolve {
                host: host.to_string(),
                port,
            })?;

        let inner = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|source| TransportError::Connect { addr, source })?;
        inner.set_nodelay(true)?;
        debug!(%addr, "connected control stream");
        Ok(Self { inner, peer: addr })
    }

    /// Remote endpoint address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Set or clear the read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (new file descriptor, same connection).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            peer: self.peer,
        })
    }

    /// Shut down both directions. Any blocked read on a clone returns EOF.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl Read for ControlStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for ControlStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for ControlStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlStream")
            .field("peer", &self.peer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    #[test]
    fn connect_and_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
            stream.write_all(b"world").unwrap();
        });

        let mut stream =
            ControlStream::connect("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        stream.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"world");

        server.join().unwrap();
    }

    #[test]
    fn connect_refused() {
        // Bind then drop to find a port with no listener.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = ControlStream::connect("127.0.0.1", port, Duration::from_secs(2));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn resolve_failure() {
        let result = ControlStream::connect("no-such-host.invalid", 1, Duration::from_secs(1));
        assert!(matches!(result, Err(TransportError::Resolve { .. })));
    }

    #[test]
    fn read_timeout_applies() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            // Hold the connection open without writing.
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(200));
            drop(stream);
        });

        let mut stream =
            ControlStream::connect("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let mut buf = [0u8; 1];
        let err = stream.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::WouldBlock | ErrorKind::TimedOut
        ));

        server.join().unwrap();
    }

    #[test]
    fn shutdown_unblocks_reading_clone() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let stream = ControlStream::connect("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        let mut reading = stream.try_clone().unwrap();

        let reader = thread::spawn(move || {
            let mut buf = [0u8; 16];
            // EOF or a reset-style error, never data.
            matches!(reading.read(&mut buf), Ok(0) | Err(_))
        });

        thread::sleep(Duration::from_millis(50));
        let _ = stream.shutdown();
        assert!(reader.join().unwrap());

        server.join().unwrap();
    }
}
