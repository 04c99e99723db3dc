//! Stream id parsing and allocation.
//!
//! XADD accepts `ms-seq`, `ms-*` (auto-sequence) and `*` (auto time and
//! sequence); range queries additionally accept the sentinels `-` / `+`
//! and a bare `ms` whose sequence defaults to the bound's extreme.

use crate::commands::CommandError;
use crate::store::StreamId;

/// Resolves the id argument of XADD against the stream's newest id,
/// enforcing that admitted ids are strictly increasing and never `0-0`.
pub fn resolve_entry_id(
    raw: &str,
    last: Option<StreamId>,
    now_ms: u64,
) -> Result<StreamId, CommandError> {
    if raw == "*" {
        // Keep ids strictly increasing even when the wall clock has not
        // advanced past the newest entry.
        let id = match last {
            Some(last) if last.ms >= now_ms => StreamId::new(last.ms, last.seq + 1),
            _ => StreamId::new(now_ms, 0),
        };
        return Ok(id);
    }

    let (ms_part, seq_part) = raw.split_once('-').ok_or(CommandError::InvalidStreamId)?;
    let ms = ms_part
        .parse::<u64>()
        .map_err(|_| CommandError::InvalidStreamId)?;

    if seq_part == "*" {
        let seq = match last {
            Some(last) if ms < last.ms => return Err(CommandError::StreamIdTooSmall),
            Some(last) if ms == last.ms => last.seq + 1,
            _ => {
                if ms == 0 {
                    1
                } else {
                    0
                }
            }
        };
        return Ok(StreamId::new(ms, seq));
    }

    let seq = seq_part
        .parse::<u64>()
        .map_err(|_| CommandError::InvalidStreamId)?;
    let id = StreamId::new(ms, seq);

    if id == StreamId::MIN {
        return Err(CommandError::StreamIdZero);
    }

    if let Some(last) = last {
        if id <= last {
            return Err(CommandError::StreamIdTooSmall);
        }
    }

    Ok(id)
}

/// Parses the inclusive lower bound of XRANGE. `-` is the minimal id; a
/// bare `ms` defaults its sequence to 0.
pub fn parse_range_start(raw: &str) -> Result<StreamId, CommandError> {
    if raw == "-" {
        return Ok(StreamId::MIN);
    }
    parse_bound(raw, 0)
}

/// Parses the inclusive upper bound of XRANGE. `+` is the maximal id; a
/// bare `ms` defaults its sequence to the maximum.
pub fn parse_range_end(raw: &str) -> Result<StreamId, CommandError> {
    if raw == "+" {
        return Ok(StreamId::MAX);
    }
    parse_bound(raw, u64::MAX)
}

/// Parses the exclusive lower bound of XREAD (`$` is resolved by the
/// caller before this is reached).
pub fn parse_read_after(raw: &str) -> Result<StreamId, CommandError> {
    parse_bound(raw, 0)
}

fn parse_bound(raw: &str, default_seq: u64) -> Result<StreamId, CommandError> {
    match raw.split_once('-') {
        Some((ms_part, seq_part)) => {
            let ms = ms_part
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidStreamId)?;
            let seq = seq_part
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidStreamId)?;
            Ok(StreamId::new(ms, seq))
        }
        None => {
            let ms = raw
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidStreamId)?;
            Ok(StreamId::new(ms, default_seq))
        }
    }
}
