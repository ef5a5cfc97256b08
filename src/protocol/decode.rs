//! Response line decoding

use super::constants::LINE_TERMINATOR;
use bytes::{Bytes, BytesMut};

/// Split one complete line off the front of `buf`.
///
/// Returns the line content without its terminator and advances `buf` past the
/// terminator. Returns `None` (leaving `buf` untouched) when no terminator has
/// arrived yet.
pub fn decode_line(buf: &mut BytesMut) -> Option<Bytes> {
    let pos = buf.iter().position(|&b| b == LINE_TERMINATOR)?;
    let mut line = buf.split_to(pos + 1);
    line.truncate(pos);
    Some(line.freeze())
}

/// Move every complete line in `buf` into `out`, delimiters stripped.
///
/// Returns the number of content bytes appended.
pub fn drain_lines(buf: &mut BytesMut, out: &mut BytesMut) -> usize {
    drain_lines_from(buf, out, &mut 0)
}

/// Like [`drain_lines`], but skips the first `scanned` bytes of `buf` when
/// looking for the first terminator.
///
/// On return `scanned` equals `buf.len()`: everything left is a partial line
/// already known to hold no terminator. Feeding more bytes and calling again
/// only searches the new bytes, so a long line arriving in many reads is
/// scanned once.
pub fn drain_lines_from(buf: &mut BytesMut, out: &mut BytesMut, scanned: &mut usize) -> usize {
    let mut appended = 0;
    let mut start = (*scanned).min(buf.len());

    while let Some(offset) = buf[start..].iter().position(|&b| b == LINE_TERMINATOR) {
        let pos = start + offset;
        let line = buf.split_to(pos + 1);
        out.extend_from_slice(&line[..pos]);
        appended += pos;
        start = 0;
    }

    *scanned = buf.len();
    appended
}

/// Take whatever is left in `buf` after end-of-stream: a final line that never
/// received its terminator.
pub fn take_remainder(buf: &mut BytesMut) -> Option<Bytes> {
    if buf.is_empty() {
        None
    } else {
        Some(buf.split().freeze())
    }
}
