//! Request encoding

use super::constants::LINE_TERMINATOR;
use bytes::{BufMut, BytesMut};

/// Encode a request: the payload bytes followed by exactly one line terminator.
///
/// The payload is written once. An empty payload encodes to a bare `\n`.
pub fn encode_request(payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(payload.len() + 1);
    buf.put_slice(payload);
    buf.put_u8(LINE_TERMINATOR);
    buf
}
