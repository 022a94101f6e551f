use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

use crate::stream::decode_line;
use crate::types::generate::StreamFrame;
use crate::Result;

/// Adapts a raw byte stream into a stream of [`StreamFrame`]s.
///
/// Bytes are buffered only until the next `\n`; complete lines go through
/// [`decode_line`] one at a time, so frames are yielded in network-arrival
/// order with no further buffering.
///
/// The parser fuses itself once the stream is over: after a `Finish` frame
/// or a decode error the inner byte stream is dropped immediately — not on
/// the parser's own drop — so the connection is released even if the caller
/// keeps the parser around.
pub struct FrameStreamParser<S>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    inner: Option<S>,
    buffer: Vec<u8>,
    done: bool,
}

impl<S> FrameStreamParser<S>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(stream),
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Decode the next frame out of complete lines already buffered.
    /// `None` means no full line is left; filler lines are consumed silently.
    fn next_buffered_frame(&mut self) -> Option<Result<StreamFrame>> {
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes = self.buffer.drain(..=newline_pos).collect::<Vec<u8>>();
            let line = String::from_utf8_lossy(&line_bytes);
            match decode_line(&line) {
                Ok(None) => continue,
                Ok(Some(frame)) => return Some(Ok(frame)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    /// Record terminal items: a finish frame or any error ends the stream
    /// and releases the inner byte stream right away.
    fn seal(&mut self, item: Result<StreamFrame>) -> Result<StreamFrame> {
        if matches!(&item, Ok(frame) if frame.is_finish()) || item.is_err() {
            self.done = true;
            self.inner = None;
            self.buffer.clear();
        }
        item
    }
}

impl<S> Stream for FrameStreamParser<S>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    type Item = Result<StreamFrame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        loop {
            if let Some(item) = this.next_buffered_frame() {
                let item = this.seal(item);
                return Poll::Ready(Some(item));
            }

            let Some(inner) = this.inner.as_mut() else {
                this.done = true;
                return Poll::Ready(None);
            };

            match Pin::new(inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    let item = this.seal(Err(e));
                    return Poll::Ready(Some(item));
                }
                Poll::Ready(None) => {
                    // Flush a final unterminated line, if any.
                    this.inner = None;
                    if this.buffer.is_empty() {
                        this.done = true;
                        return Poll::Ready(None);
                    }
                    let line = String::from_utf8_lossy(&this.buffer).to_string();
                    this.buffer.clear();
                    match decode_line(&line) {
                        Ok(None) => {
                            this.done = true;
                            return Poll::Ready(None);
                        }
                        Ok(Some(frame)) => {
                            let item = this.seal(Ok(frame));
                            return Poll::Ready(Some(item));
                        }
                        Err(e) => {
                            let item = this.seal(Err(e));
                            return Poll::Ready(Some(item));
                        }
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
