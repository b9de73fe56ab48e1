//! Line-delimited message framing for the rovlink wire protocol.
//!
//! Every message is one newline-terminated text line, canonically
//! `VERB|LLLL|DATA\n` where `LLLL` is the zero-padded payload length.
//! The length is informational — the newline is what frames the stream.
//! Decoding also accepts the legacy `VERB KEY=VAL ...` and bare pipe
//! forms, and degrades to a raw frame rather than failing.

pub mod assembler;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use assembler::LineAssembler;
pub use codec::{decode_frame, encode_frame, Frame, ACK_VERBS, RAW_VERB};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
