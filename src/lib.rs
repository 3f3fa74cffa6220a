//! Streaming disassembler for WebAssembly binary modules.
//!
//! Bytes are pulled from a [`binary::ChunkSource`] in whatever pieces it
//! delivers and rendered as indented, commented text. Anything the
//! disassembler does not understand is shown as a hex/ASCII dump instead.

pub mod binary;
pub mod render;

pub use binary::{ByteReader, ChunkSource};
pub use render::{Options, disassemble, disassemble_to_string};
