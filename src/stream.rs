//! Turn event stream handling
//!
//! Two small layers sit between the transport and the session: a line
//! framer that reassembles complete lines from arbitrarily chunked bytes,
//! and a decoder that turns each line into a typed event (or ignores it).

mod decoder;
mod framer;

#[cfg(test)]
mod proptests;

pub use decoder::{decode_line, Citation, Decoded, StreamEvent};
pub use framer::LineFramer;
