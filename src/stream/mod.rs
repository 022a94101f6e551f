//! Streaming response protocol: turns the raw `generateStream` body into a
//! sequence of [`StreamFrame`](crate::types::generate::StreamFrame)s.
//!
//! The decoding itself lives in one pure function, [`decode_line`]; the two
//! adapters here only differ in how lines are obtained — an async byte
//! stream ([`FrameStreamParser`]) versus a blocking reader ([`FrameLines`]).

mod decoder;
mod frame_lines;
mod frame_stream;

pub use decoder::decode_line;
pub use frame_lines::FrameLines;
pub use frame_stream::FrameStreamParser;
