//! RESP (Redis Serialization Protocol) encoder and decoder
//!
//! Only the subset needed by status probes: commands are always encoded as
//! arrays of bulk strings, replies are decoded from a buffered stream.

use std::io::{self, BufRead, Read};

use super::error::ProtocolError;

/// RESP value types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple string (+OK\r\n)
    SimpleString(String),
    /// Error (-ERR message\r\n)
    Error(String),
    /// Integer (:1000\r\n)
    Integer(i64),
    /// Bulk string ($6\r\nfoobar\r\n)
    BulkString(Vec<u8>),
    /// Null bulk string or null array
    Null,
    /// Array (*2\r\n...)
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Consume a textual reply (INFO, CLUSTER INFO, CLUSTER NODES).
    ///
    /// Error replies become `ServerError`, anything else that is not text
    /// becomes `UnexpectedResponse` naming `command`.
    pub fn into_text(self, command: &str) -> Result<String, ProtocolError> {
        match self {
            RespValue::BulkString(data) => String::from_utf8(data)
                .map_err(|e| ProtocolError::Parse(format!("Invalid UTF-8: {}", e))),
            RespValue::SimpleString(s) => Ok(s),
            RespValue::Error(e) => Err(ProtocolError::ServerError(e)),
            other => Err(ProtocolError::UnexpectedResponse {
                expected: format!("{} text reply", command),
                actual: format!("{:?}", other),
            }),
        }
    }
}

/// RESP encoder with pre-allocated buffer
pub struct RespEncoder {
    buf: Vec<u8>,
}

impl RespEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `args` as an array of bulk strings
    pub fn encode_command<A: AsRef<[u8]>>(&mut self, args: &[A]) {
        self.write_header(b'*', args.len());
        for arg in args {
            let arg = arg.as_ref();
            self.write_header(b'$', arg.len());
            self.buf.extend_from_slice(arg);
            self.buf.extend_from_slice(b"\r\n");
        }
    }

    /// `<prefix><len>\r\n`
    #[inline]
    fn write_header(&mut self, prefix: u8, len: usize) {
        let mut digits = itoa::Buffer::new();
        self.buf.push(prefix);
        self.buf.extend_from_slice(digits.format(len).as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }
}

/// Largest bulk string accepted, the server's own `proto-max-bulk-len` default
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Largest array accepted
pub const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// Deepest array nesting accepted
const MAX_DEPTH: usize = 32;

/// Elements reserved up front, whatever the announced count
const ARRAY_PREALLOC: usize = 64;

/// RESP decoder for streaming reads
pub struct RespDecoder<R> {
    reader: R,
    line_buf: String,
}

impl<R: BufRead> RespDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(256),
        }
    }

    /// Decode next RESP value from stream.
    ///
    /// Lengths come from the peer, so they are capped and never used to
    /// size an allocation beyond what actually arrives.
    pub fn decode(&mut self) -> io::Result<RespValue> {
        self.decode_at(0)
    }

    fn decode_at(&mut self, depth: usize) -> io::Result<RespValue> {
        self.line_buf.clear();
        self.reader.read_line(&mut self.line_buf)?;

        if self.line_buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Connection closed",
            ));
        }

        let line = self.line_buf.trim_end_matches(&['\r', '\n'][..]);
        let type_byte = match line.as_bytes().first() {
            Some(&b) if b.is_ascii() => b,
            Some(&b) => return Err(invalid_data(ProtocolError::InvalidType(b))),
            None => return Err(invalid_data(ProtocolError::Parse("Empty RESP line".into()))),
        };
        // The type byte is ASCII, so index 1 is a char boundary
        let content = line[1..].to_string();

        match type_byte {
            b'+' => Ok(RespValue::SimpleString(content)),
            b'-' => Ok(RespValue::Error(content)),
            b':' => content
                .parse()
                .map(RespValue::Integer)
                .map_err(|_| invalid_data(ProtocolError::Parse(format!("Invalid integer: {}", content)))),
            b'$' => {
                let len = parse_length(&content, MAX_BULK_LEN)?;
                if len < 0 {
                    return Ok(RespValue::Null);
                }

                let mut data = Vec::new();
                (&mut self.reader).take(len as u64).read_to_end(&mut data)?;
                if data.len() as i64 != len {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "Connection closed inside bulk string",
                    ));
                }

                let mut crlf = [0u8; 2];
                self.reader.read_exact(&mut crlf)?;
                if &crlf != b"\r\n" {
                    return Err(invalid_data(ProtocolError::InvalidLength(len)));
                }

                Ok(RespValue::BulkString(data))
            }
            b'*' => {
                let count = parse_length(&content, MAX_ARRAY_LEN)?;
                if count < 0 {
                    return Ok(RespValue::Null);
                }
                if depth >= MAX_DEPTH {
                    return Err(invalid_data(ProtocolError::Parse(format!(
                        "Arrays nested deeper than {}",
                        MAX_DEPTH
                    ))));
                }

                let mut elements = Vec::with_capacity((count as usize).min(ARRAY_PREALLOC));
                for _ in 0..count {
                    elements.push(self.decode_at(depth + 1)?);
                }
                Ok(RespValue::Array(elements))
            }
            other => Err(invalid_data(ProtocolError::InvalidType(other))),
        }
    }
}

/// Parse a length header; -1 means null, anything above `max` is refused
fn parse_length(content: &str, max: i64) -> io::Result<i64> {
    let len: i64 = content
        .parse()
        .map_err(|_| invalid_data(ProtocolError::Parse(format!("Invalid length: {}", content))))?;
    if len < -1 || len > max {
        return Err(invalid_data(ProtocolError::InvalidLength(len)));
    }
    Ok(len)
}

fn invalid_data(err: ProtocolError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}
