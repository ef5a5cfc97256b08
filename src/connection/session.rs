//! Connected stream handle

use crate::metrics::{counters, histograms, labels};
use crate::protocol::constants::DEFAULT_READ_BUFFER_CAPACITY;
use crate::protocol::{drain_lines_from, encode_request, take_remainder};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// An open byte stream: write newline-terminated requests, read
/// newline-delimited responses until the peer closes.
///
/// [`SecureStreamClient`](crate::SecureStreamClient) creates one per
/// successful connect. `Session::new` also accepts any other
/// `AsyncRead + AsyncWrite` stream.
pub struct Session<S> {
    stream: S,
    read_buf: BytesMut,
    // Prefix of `read_buf` already searched for a terminator
    scanned: usize,
    read_chunk: usize,
    read_timeout: Option<Duration>,
    max_response_size: Option<usize>,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream with no read timeout and no response cap
    pub fn new(stream: S) -> Self {
        Self::with_capacity(stream, DEFAULT_READ_BUFFER_CAPACITY)
    }

    /// Wrap a connected stream with a specific read buffer capacity
    pub fn with_capacity(stream: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stream,
            read_buf: BytesMut::with_capacity(capacity),
            scanned: 0,
            read_chunk: capacity,
            read_timeout: None,
            max_response_size: None,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Fail a read that sees no data for this long
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Fail a response that grows past this many bytes
    pub fn with_max_response_size(mut self, limit: Option<usize>) -> Self {
        self.max_response_size = limit;
        self
    }

    /// Write `payload` followed by one `\n` and flush.
    ///
    /// Returns the number of bytes written, terminator included.
    pub async fn send_request(&mut self, payload: &[u8]) -> Result<usize> {
        let frame = encode_request(payload);

        if let Err(e) = self.write_frame(&frame).await {
            counters::stream_error(labels::KIND_WRITE);
            return Err(Error::Io(e));
        }

        self.bytes_sent += frame.len() as u64;
        counters::bytes_sent(frame.len());
        tracing::trace!(bytes = frame.len(), "request sent");
        Ok(frame.len())
    }

    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await
    }

    /// Read lines until the peer closes and return their contents concatenated,
    /// delimiters stripped.
    ///
    /// Blocks on the socket while the peer is idle; there is no polling. Without
    /// a read timeout this only returns once the peer closes. Bytes after the
    /// last `\n` are kept as a final line. A TLS peer that closes without
    /// `close_notify` counts as a normal close.
    ///
    /// # Errors
    ///
    /// `Error::Stream` if a read fails (carrying the bytes assembled so far),
    /// `Error::ResponseTooLarge` if the response passes the configured cap.
    pub async fn read_response(&mut self) -> Result<Bytes> {
        let mut response = BytesMut::new();

        loop {
            drain_lines_from(&mut self.read_buf, &mut response, &mut self.scanned);
            // Only an unterminated line remains buffered, so this is a lower
            // bound on the final response size
            self.check_response_size(response.len() + self.read_buf.len())?;

            match self.fill_read_buf().await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::debug!("peer closed without close_notify");
                    break;
                }
                Err(source) => {
                    let kind = if source.kind() == io::ErrorKind::TimedOut {
                        labels::KIND_TIMEOUT
                    } else {
                        labels::KIND_READ
                    };
                    counters::stream_error(kind);
                    return Err(Error::Stream {
                        source,
                        partial: response.freeze(),
                    });
                }
            }
        }

        self.scanned = 0;
        if let Some(tail) = take_remainder(&mut self.read_buf) {
            response.extend_from_slice(&tail);
            self.check_response_size(response.len())?;
        }

        histograms::response_size(response.len());
        tracing::debug!(bytes = response.len(), "response complete, peer closed");
        Ok(response.freeze())
    }

    async fn fill_read_buf(&mut self) -> io::Result<usize> {
        self.read_buf.reserve(self.read_chunk);
        let timeout = self.read_timeout;
        let read = self.stream.read_buf(&mut self.read_buf);

        let n = match timeout {
            Some(limit) => tokio::time::timeout(limit, read).await.map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no data received for {:?}", limit),
                )
            })??,
            None => read.await?,
        };

        self.bytes_received += n as u64;
        counters::bytes_received(n);
        Ok(n)
    }

    fn check_response_size(&self, len: usize) -> Result<()> {
        match self.max_response_size {
            Some(limit) if len > limit => {
                counters::stream_error(labels::KIND_TOO_LARGE);
                Err(Error::ResponseTooLarge { limit })
            }
            _ => Ok(()),
        }
    }

    /// Shut down the write side (sends TLS `close_notify` on TLS streams)
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

impl<S> Session<S> {
    /// Underlying stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Underlying stream, mutably
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Give back the underlying stream. Buffered, unread bytes are dropped.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Total request bytes written
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes read from the peer
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("buffered", &self.read_buf.len())
            .field("read_timeout", &self.read_timeout)
            .field("max_response_size", &self.max_response_size)
            .field("bytes_sent", &self.bytes_sent)
            .field("bytes_received", &self.bytes_received)
            .finish()
    }
}
