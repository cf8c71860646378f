//! Intercepting transport adapter.
//!
//! # Responsibilities
//! - Expose the same `AsyncRead`/`AsyncWrite` contract as the wrapped stream
//! - Mirror every byte the TLS engine reads into the diagnostics sink
//! - Leave the write path, flush and shutdown untouched
//!
//! The adapter sits between the TLS engine and the raw TCP stream, so the
//! capture is an exact, ordered record of ciphertext-level wire bytes. It
//! adds no buffering: each `poll_read` is a 1:1 passthrough with a
//! side-effecting observation of exactly the bytes the inner stream
//! produced (not the caller's buffer size).

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::diag::DiagnosticsSink;

/// Transport decorator observing the inbound byte stream.
pub struct TapStream<S> {
    inner: S,
    sink: Arc<dyn DiagnosticsSink>,
    label: String,
}

impl<S> TapStream<S> {
    /// Wrap `inner`, mirroring reads to `sink` under `label`.
    pub fn new(inner: S, sink: Arc<dyn DiagnosticsSink>, label: impl Into<String>) -> Self {
        Self {
            inner,
            sink,
            label: label.into(),
        }
    }

    /// Consume the adapter and return the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TapStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        match Pin::new(&mut self.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                // Exactly the bytes this call produced; empty marks EOF.
                let received = &buf.filled()[before..];
                self.sink.emit_binary(&self.label, received);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => {
                tracing::debug!(label = %self.label, error = %e, "transport read error");
                Poll::Ready(Err(e))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TapStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
