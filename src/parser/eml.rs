//! Single `.eml` files (RFC 5322 messages without MBOX framing).

use std::path::Path;

use crate::error::{Result, SpamError};
use crate::model::envelope::{MessageEnvelope, MessageUid};
use crate::parser::header;

/// Read the envelope of a bare RFC 5322 message.
///
/// A leading `From ` separator is tolerated, so single-message mbox
/// exports work too.
pub fn parse_eml(path: impl AsRef<Path>, uid: MessageUid) -> Result<MessageEnvelope> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| SpamError::open(path, e))?;
    let header_end = find_header_end(&data).unwrap_or(data.len());
    Ok(header::parse_envelope(&data[..header_end], uid))
}

/// Byte offset where the headers end (the first blank line).
fn find_header_end(data: &[u8]) -> Option<usize> {
    let lf = data.windows(2).position(|w| w == b"\n\n");
    let crlf = data.windows(4).position(|w| w == b"\r\n\r\n");
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
