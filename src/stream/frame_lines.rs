use std::io::BufRead;

use crate::stream::decode_line;
use crate::types::generate::StreamFrame;
use crate::Result;

/// Blocking counterpart of [`FrameStreamParser`](crate::stream::FrameStreamParser):
/// an iterator of [`StreamFrame`]s over any buffered reader.
///
/// Each `next` call blocks on the reader until a decodable line arrives or
/// the body ends. The reader is dropped as soon as the stream terminates —
/// finish frame, decode error, or read error — and also whenever the
/// iterator itself is dropped, so an early-stopping consumer still releases
/// the underlying connection.
pub struct FrameLines<R: BufRead> {
    reader: Option<R>,
    line: String,
}

impl<R: BufRead> FrameLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            line: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for FrameLines<R> {
    type Item = Result<StreamFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let reader = self.reader.as_mut()?;
            self.line.clear();
            match reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.reader = None;
                    return Some(Err(e.into()));
                }
            }
            match decode_line(&self.line) {
                Ok(None) => continue,
                Ok(Some(frame)) => {
                    if frame.is_finish() {
                        self.reader = None;
                    }
                    return Some(Ok(frame));
                }
                Err(e) => {
                    self.reader = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
