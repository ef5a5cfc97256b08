//! Line framing
//!
//! Requests go out as `payload` followed by a single `\n`. Responses come back
//! as `\n`-delimited lines whose contents are concatenated without delimiters.

pub mod constants;
pub mod decode;
pub mod encode;

pub use decode::{decode_line, drain_lines, drain_lines_from, take_remainder};
pub use encode::encode_request;
