//! RESP framing and reply serialization.
//!
//! Requests arrive as RESP arrays of bulk strings. The reader is
//! incremental: bytes accumulate in a [`BytesMut`] and frames are parsed
//! out as they complete, so pipelined commands and partially received
//! frames both work over a plain socket read loop. Every decoded frame
//! reports its exact encoded byte length, which the replication layer
//! uses for offset accounting.

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::AsyncReadExt;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("connection closed mid-frame")]
    ConnectionReset,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("expected an array of bulk strings")]
    ExpectedArray,
    #[error("invalid bulk string")]
    InvalidBulkString,
    #[error("failed to parse integer")]
    FailedToParseInteger,
    #[error("invalid snapshot payload header")]
    InvalidSnapshotHeader,
}

/// A single RESP reply value, serialized with [`RespValue::encode`].
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(value) => format!(":{}\r\n", value),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(items) => {
                let mut out = format!("*{}\r\n", items.len());
                for item in items {
                    out.push_str(&item.encode());
                }
                out
            }
            RespValue::NullArray => "*-1\r\n".to_string(),
        }
    }

    /// Encodes an argument vector as an array of bulk strings, the form
    /// commands travel in on the wire.
    pub fn command_array(arguments: &[String]) -> String {
        let mut out = format!("*{}\r\n", arguments.len());
        for arg in arguments {
            out.push_str(&format!("${}\r\n{}\r\n", arg.len(), arg));
        }
        out
    }
}

/// One decoded request frame: the argument vector plus the number of
/// bytes it occupied on the wire.
#[derive(Debug, PartialEq, Clone)]
pub struct Frame {
    pub arguments: Vec<String>,
    pub byte_len: usize,
}

/// Incremental RESP reader over any async byte stream.
pub struct RespReader<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncReadExt + Unpin> RespReader<R> {
    pub fn new(reader: R) -> Self {
        RespReader {
            reader,
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Reads one command frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly
    /// (EOF with no buffered partial frame). EOF in the middle of a
    /// frame and any malformed input are framing errors; the caller is
    /// expected to terminate the connection on them.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, RespError> {
        loop {
            if let Some(frame) = parse_frame(&self.buffer)? {
                self.buffer.advance(frame.byte_len);
                return Ok(Some(frame));
            }

            if self.fill().await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(RespError::ConnectionReset);
            }
        }
    }

    /// Reads one CRLF-terminated line, e.g. a `+PONG` handshake reply.
    /// The returned string does not include the terminator.
    pub async fn read_line(&mut self) -> Result<String, RespError> {
        loop {
            if let Some(end) = find_crlf(&self.buffer) {
                let line = self.buffer.split_to(end + 2);
                let text = std::str::from_utf8(&line[..end])
                    .map_err(|_| RespError::InvalidUtf8)?
                    .to_string();
                return Ok(text);
            }

            if self.fill().await? == 0 {
                return Err(RespError::ConnectionReset);
            }
        }
    }

    /// Reads a `$<N>\r\n<N bytes>` snapshot payload. Unlike a bulk
    /// string there is no trailing CRLF after the bytes.
    pub async fn read_snapshot(&mut self) -> Result<Vec<u8>, RespError> {
        let header = self.read_line().await?;
        let length = header
            .strip_prefix('$')
            .ok_or(RespError::InvalidSnapshotHeader)?
            .parse::<usize>()
            .map_err(|_| RespError::InvalidSnapshotHeader)?;

        while self.buffer.len() < length {
            if self.fill().await? == 0 {
                return Err(RespError::ConnectionReset);
            }
        }

        Ok(self.buffer.split_to(length).to_vec())
    }

    /// Resolves when the peer closes (or errors) the connection. Bytes
    /// arriving in the meantime are buffered and parsed as frames later,
    /// so racing this against a blocking command never loses input.
    pub async fn wait_for_close(&mut self) {
        loop {
            match self.reader.read_buf(&mut self.buffer).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    }

    async fn fill(&mut self) -> Result<usize, RespError> {
        self.reader
            .read_buf(&mut self.buffer)
            .await
            .map_err(|e| RespError::Io(e.to_string()))
    }
}

/// Attempts to parse one complete frame from the front of `buf`.
/// Returns `Ok(None)` when more bytes are needed.
fn parse_frame(buf: &[u8]) -> Result<Option<Frame>, RespError> {
    let mut pos = 0;

    let Some(header) = take_line(buf, &mut pos) else {
        return Ok(None);
    };

    if header.first() != Some(&b'*') {
        return Err(RespError::ExpectedArray);
    }

    let count = parse_decimal(&header[1..])?;
    let mut arguments = Vec::with_capacity(count);

    for _ in 0..count {
        let Some(length_line) = take_line(buf, &mut pos) else {
            return Ok(None);
        };

        if length_line.first() != Some(&b'$') {
            return Err(RespError::InvalidBulkString);
        }

        let length = parse_decimal(&length_line[1..])?;

        if buf.len() < pos + length + 2 {
            return Ok(None);
        }

        if &buf[pos + length..pos + length + 2] != b"\r\n" {
            return Err(RespError::InvalidBulkString);
        }

        let argument = std::str::from_utf8(&buf[pos..pos + length])
            .map_err(|_| RespError::InvalidUtf8)?
            .to_string();
        arguments.push(argument);
        pos += length + 2;
    }

    Ok(Some(Frame {
        arguments,
        byte_len: pos,
    }))
}

fn take_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let start = *pos;
    let end = find_crlf(&buf[start..])?;
    *pos = start + end + 2;
    Some(&buf[start..start + end])
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|window| window == b"\r\n")
}

fn parse_decimal(digits: &[u8]) -> Result<usize, RespError> {
    std::str::from_utf8(digits)
        .map_err(|_| RespError::InvalidUtf8)?
        .parse::<usize>()
        .map_err(|_| RespError::FailedToParseInteger)
}
