//! The outbound replication handshake a replica performs against its
//! master: PING, REPLCONF listening-port, REPLCONF capa, PSYNC, then
//! the FULLRESYNC header and the snapshot payload. The payload is
//! discarded; the replica starts empty and applies the streamed
//! commands.

use regex::Regex;
use tokio::io::AsyncRead;

use crate::pubsub::SharedWriter;
use crate::resp::{RespError, RespReader, RespValue};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum HandshakeError {
    #[error("protocol error during handshake: {0}")]
    Resp(#[from] RespError),
    #[error("I/O error during handshake: {0}")]
    Io(String),
    #[error("unexpected response from master: {0:?}")]
    UnexpectedResponse(String),
}

pub async fn perform<R: AsyncRead + Unpin>(
    reader: &mut RespReader<R>,
    writer: &SharedWriter,
    listening_port: u16,
) -> Result<(), HandshakeError> {
    send(writer, &["PING"]).await?;
    expect(reader, "+PONG").await?;

    send(
        writer,
        &["REPLCONF", "listening-port", &listening_port.to_string()],
    )
    .await?;
    expect(reader, "+OK").await?;

    send(writer, &["REPLCONF", "capa", "psync2"]).await?;
    expect(reader, "+OK").await?;

    send(writer, &["PSYNC", "?", "-1"]).await?;
    let full_resync = reader.read_line().await?;
    validate_full_resync(&full_resync)?;

    // The snapshot payload; an empty replica has nothing to load from it.
    let _snapshot = reader.read_snapshot().await?;

    Ok(())
}

async fn send(writer: &SharedWriter, parts: &[&str]) -> Result<(), HandshakeError> {
    let arguments: Vec<String> = parts.iter().map(|part| part.to_string()).collect();
    let frame = RespValue::command_array(&arguments);

    crate::connection::write_to_stream(writer, frame.as_bytes())
        .await
        .map_err(|e| HandshakeError::Io(e.to_string()))
}

async fn expect<R: AsyncRead + Unpin>(
    reader: &mut RespReader<R>,
    expected: &str,
) -> Result<(), HandshakeError> {
    let line = reader.read_line().await?;

    if line != expected {
        return Err(HandshakeError::UnexpectedResponse(line));
    }

    Ok(())
}

fn validate_full_resync(line: &str) -> Result<(), HandshakeError> {
    let unexpected = || HandshakeError::UnexpectedResponse(line.to_string());

    let rest = line.strip_prefix("+FULLRESYNC ").ok_or_else(unexpected)?;
    let parts: Vec<&str> = rest.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(unexpected());
    }

    let repl_id_regex = Regex::new(r"^[a-zA-Z0-9]{40}$").unwrap();
    if !repl_id_regex.is_match(parts[0]) {
        return Err(unexpected());
    }

    parts[1].parse::<u64>().map_err(|_| unexpected())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_full_resync() {
        let valid_id = "a".repeat(40);

        let test_cases = vec![
            (format!("+FULLRESYNC {} 0", valid_id), true),
            (format!("+FULLRESYNC {} 1234", valid_id), true),
            ("+FULLRESYNC short 0".to_string(), false),
            (format!("+FULLRESYNC {} x", valid_id), false),
            (format!("+FULLRESYNC {}", valid_id), false),
            ("+OK".to_string(), false),
            (String::new(), false),
        ];

        for (line, expected_ok) in test_cases {
            assert_eq!(
                validate_full_resync(&line).is_ok(),
                expected_ok,
                "validating {:?}",
                line
            );
        }
    }
}
