//! Raw TCP connection used for status probes
//!
//! One short-lived connection per probe. Connecting is bounded by the
//! connect timeout, and each command with its whole reply by the I/O timeout,
//! so a hung or trickling node cannot stall a scan.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::trace;

use super::control_plane::{ControlPlane, ControlPlaneExt};
use crate::scan::{Credentials, Endpoint};
use crate::utils::{ConnectionError, RespDecoder, RespEncoder, RespValue};

/// Read half that refuses to read past a deadline.
///
/// Each read gets only the time left, so a peer sending one byte at a time
/// cannot extend a reply indefinitely.
struct DeadlineReader {
    stream: TcpStream,
    deadline: Option<Instant>,
}

impl Read for DeadlineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(deadline) = self.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "reply deadline exceeded"));
            }
            self.stream.set_read_timeout(Some(remaining))?;
        }
        self.stream.read(buf)
    }
}

/// Buffered TCP connection split into reader and writer halves
pub struct RawConnection {
    writer: BufWriter<TcpStream>,
    reader: BufReader<DeadlineReader>,
    encoder: RespEncoder,
    io_timeout: Option<Duration>,
}

impl RawConnection {
    /// Open a TCP connection with a bounded connect time
    pub fn connect_tcp(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let connect_failed = |source: io::Error| ConnectionError::ConnectFailed {
            host: host.to_string(),
            port,
            source,
        };

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(connect_failed)?
            .next()
            .ok_or_else(|| {
                connect_failed(io::Error::new(io::ErrorKind::NotFound, "No addresses found"))
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| {
            if e.kind() == io::ErrorKind::TimedOut {
                ConnectionError::Timeout(connect_timeout.as_millis() as u64)
            } else {
                connect_failed(e)
            }
        })?;

        stream.set_nodelay(true).ok();

        let writer = BufWriter::with_capacity(4096, stream.try_clone().map_err(connect_failed)?);
        let reader = BufReader::with_capacity(
            16384,
            DeadlineReader {
                stream,
                deadline: None,
            },
        );

        Ok(RawConnection {
            writer,
            reader,
            encoder: RespEncoder::with_capacity(128),
            io_timeout: None,
        })
    }

    /// Bound every subsequent command, from sending it to the last byte of
    /// its reply, by `timeout`
    pub fn set_io_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        if timeout.is_zero() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "zero I/O timeout"));
        }
        self.io_timeout = Some(timeout);
        Ok(())
    }

    fn read_response(&mut self) -> io::Result<RespValue> {
        RespDecoder::new(&mut self.reader).decode()
    }
}

impl ControlPlane for RawConnection {
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue> {
        trace!(command = args.first().copied().unwrap_or(""), "execute");
        let deadline = self.io_timeout.map(|t| Instant::now() + t);
        if let Some(timeout) = self.io_timeout {
            self.writer.get_ref().set_write_timeout(Some(timeout))?;
        }
        self.reader.get_mut().deadline = deadline;

        self.encoder.clear();
        self.encoder.encode_command(args);
        self.writer.write_all(self.encoder.as_bytes())?;
        self.writer.flush()?;
        self.read_response()
    }
}

/// Connection factory for creating probe connections with common config
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl ConnectionFactory {
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout,
        }
    }

    /// Connect to `endpoint` and authenticate when credentials are given
    pub fn create(
        &self,
        endpoint: &Endpoint,
        credentials: Option<&Credentials>,
    ) -> Result<RawConnection, ConnectionError> {
        let mut conn = RawConnection::connect_tcp(&endpoint.host, endpoint.port, self.connect_timeout)?;
        conn.set_io_timeout(self.io_timeout)?;

        if let Some(creds) = credentials {
            conn.authenticate(&creds.password, creds.username.as_deref())
                .map_err(|e| match e.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                        ConnectionError::Timeout(self.io_timeout.as_millis() as u64)
                    }
                    _ => ConnectionError::AuthFailed(e.to_string()),
                })?;
        }

        Ok(conn)
    }
}
