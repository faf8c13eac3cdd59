//! Record-separator frame codec.
//!
//! Frames are JSON objects terminated by `0x1E`. Poll responses may
//! concatenate several frames, and a garbled frame must not cost the rest of
//! the batch.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{from_str, to_string};
use tracing::warn;

use crate::error::Result;

use super::Message;

// ============================================================================
// Constants
// ============================================================================

/// ASCII record separator terminating every frame.
pub const RECORD_SEPARATOR: char = '\u{1e}';

// ============================================================================
// Encode / Decode
// ============================================================================

/// Serializes a message and appends the record separator.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    let mut frame = to_string(message)?;
    frame.push(RECORD_SEPARATOR);
    Ok(frame)
}

/// Splits a raw body into frames and parses each one independently.
///
/// Empty segments are dropped. Segments that fail to parse are logged and
/// skipped; frame order is preserved for the rest.
#[must_use]
pub fn decode(raw: &str) -> Vec<Message> {
    raw.split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| match from_str::<Message>(segment) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, frame = %segment, "Message parse error");
                None
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
