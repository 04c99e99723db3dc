//! The snapshot opcode loop.

use std::path::Path;

use jiff::Timestamp;
use thiserror::Error;

use super::length::{read_plain_length, read_string, Cursor};
use crate::store::Value;

const MAGIC: &[u8] = b"REDIS";

const OPCODE_AUX: u8 = 0xFA;
const OPCODE_RESIZE_DB: u8 = 0xFB;
const OPCODE_EXPIRE_MS: u8 = 0xFC;
const OPCODE_EXPIRE_SECONDS: u8 = 0xFD;
const OPCODE_SELECT_DB: u8 = 0xFE;
const OPCODE_EOF: u8 = 0xFF;
const OPCODE_STRING: u8 = 0x00;

#[derive(Error, Debug, PartialEq)]
pub enum RdbError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("unexpected end of snapshot")]
    UnexpectedEof,
    #[error("missing REDIS magic string")]
    BadMagic,
    #[error("LZF-compressed strings are not supported")]
    LzfNotSupported,
    #[error("invalid length encoding sub-code {0}")]
    InvalidLengthEncoding(u8),
    #[error("expected a plain length")]
    ExpectedPlainLength,
    #[error("invalid UTF-8 in snapshot string")]
    InvalidUtf8,
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("expiry timestamp out of range")]
    InvalidExpiry,
}

/// Parses a full snapshot image into `(key, value)` pairs.
///
/// Auxiliary fields, resize hints and database selectors are read and
/// discarded; an expiry opcode arms the expiration applied to the next
/// string entry. The 8-byte trailer after the EOF opcode is consumed
/// but its checksum is not validated.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Vec<(String, Value)>, RdbError> {
    let mut cursor = Cursor::new(bytes);

    if cursor.take(MAGIC.len())? != MAGIC {
        return Err(RdbError::BadMagic);
    }
    // Four ASCII version digits; the contents are ignored.
    cursor.take(4)?;

    let mut entries = Vec::new();
    let mut armed_expiry_ms: Option<u64> = None;

    loop {
        let opcode = cursor.u8()?;

        match opcode {
            OPCODE_AUX => {
                read_string(&mut cursor)?;
                read_string(&mut cursor)?;
            }
            OPCODE_RESIZE_DB => {
                read_plain_length(&mut cursor)?;
                read_plain_length(&mut cursor)?;
            }
            OPCODE_SELECT_DB => {
                read_plain_length(&mut cursor)?;
            }
            OPCODE_EXPIRE_SECONDS => {
                let bytes: [u8; 4] = cursor.take(4)?.try_into().unwrap();
                armed_expiry_ms = Some(u32::from_le_bytes(bytes) as u64 * 1000);
            }
            OPCODE_EXPIRE_MS => {
                let bytes: [u8; 8] = cursor.take(8)?.try_into().unwrap();
                armed_expiry_ms = Some(u64::from_le_bytes(bytes));
            }
            OPCODE_STRING => {
                let key = read_string(&mut cursor)?;
                let value = read_string(&mut cursor)?;
                let expires_at = armed_expiry_ms
                    .take()
                    .map(|ms| {
                        Timestamp::from_millisecond(
                            i64::try_from(ms).map_err(|_| RdbError::InvalidExpiry)?,
                        )
                        .map_err(|_| RdbError::InvalidExpiry)
                    })
                    .transpose()?;
                entries.push((key, Value::string_with_expiry(value, expires_at)));
            }
            OPCODE_EOF => {
                cursor.take(8)?;
                return Ok(entries);
            }
            unknown => return Err(RdbError::UnknownOpcode(unknown)),
        }
    }
}

/// Loads the snapshot file at `path`. A missing file is not an error:
/// the keyspace simply starts empty.
pub fn load_snapshot(path: &Path) -> Result<Option<Vec<(String, Value)>>, RdbError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RdbError::Io(e.to_string())),
    };

    parse_snapshot(&bytes).map(Some)
}

/// The minimal well-formed snapshot a master transmits on full resync:
/// magic, version, EOF opcode and an 8-byte trailer.
pub fn empty_snapshot() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(18);
    bytes.extend_from_slice(b"REDIS0011");
    bytes.push(OPCODE_EOF);
    bytes.extend_from_slice(&[0u8; 8]);
    bytes
}
