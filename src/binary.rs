pub mod decode;
pub mod instr;
pub mod ty;
pub mod value;

pub use decode::{ByteReader, ChunkSource, IterSource, ReadSource};
