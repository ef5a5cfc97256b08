//! Framing constants

/// Line terminator appended to every request and used to split responses
pub const LINE_TERMINATOR: u8 = b'\n';

/// Initial capacity of a session's read buffer
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 8192;
