//! Text rendering of a module: the section dispatcher and everything it drives.

pub mod code;
pub mod hexdump;
mod section;

use std::io::Write;

use crate::binary::decode::{
    ByteReader, ChunkSource, DEFAULT_CHUNK_SIZE, DecodeTag as _, ReadSource,
};
use crate::binary::ty;
use hexdump::{BYTES_PER_LINE, HexDump};

pub const INDENT: &str = "  ";
const RAW_BLOCK: usize = 256 * BYTES_PER_LINE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Dump every section as hex instead of decoding it.
    pub raw: bool,
    /// Display column where inline instruction docs start.
    pub comment_column: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            raw: false,
            comment_column: 80,
        }
    }
}

enum State {
    Header,
    Sections,
    Done,
}

/// Disassembles the whole input, writing text to `out` as it goes.
pub fn disassemble<S: ChunkSource, W: Write>(
    bytes: &mut ByteReader<S>,
    out: &mut W,
    options: &Options,
) -> anyhow::Result<()> {
    let mut disassembler = Disassembler {
        bytes,
        out,
        options,
    };
    let mut state = State::Header;
    loop {
        state = match state {
            State::Header => {
                disassembler.header()?;
                State::Sections
            }
            State::Sections if disassembler.section()? => State::Sections,
            State::Sections => State::Done,
            State::Done => break,
        };
    }
    Ok(())
}

pub fn disassemble_to_string(input: &[u8], options: &Options) -> anyhow::Result<String> {
    let mut out = Vec::new();
    let mut bytes = ByteReader::new(ReadSource::new(input, DEFAULT_CHUNK_SIZE));
    disassemble(&mut bytes, &mut out, options)?;
    Ok(String::from_utf8(out)?)
}

pub(crate) struct Disassembler<'a, S, W> {
    pub(crate) bytes: &'a mut ByteReader<S>,
    pub(crate) out: &'a mut W,
    pub(crate) options: &'a Options,
}

impl<S: ChunkSource, W: Write> Disassembler<'_, S, W> {
    fn header(&mut self) -> anyhow::Result<()> {
        for label in ["magic", "version"] {
            let blob = self.bytes.take(4)?;
            if blob.is_empty() {
                return Ok(());
            }
            writeln!(self.out, "{label}")?;
            write!(self.out, "{}", HexDump::new(&blob, INDENT))?;
        }
        Ok(())
    }

    /// Renders one section. Returns `false` once no further section id can be read.
    fn section(&mut self) -> anyhow::Result<bool> {
        let Some(id) = self.bytes.next()? else {
            return Ok(false);
        };
        let size = self.bytes.decode::<u32>()?.unwrap_or_default();
        let end = self.bytes.bytes_read() + u64::from(size);
        let kind = ty::Section::decode_tag(id);
        tracing::debug!(id, size, end, "section");

        match kind {
            Some(ty::Section::Custom) => {
                let name = self.name(end)?.unwrap_or_default();
                writeln!(self.out, "Custom section {name:?} (id {id}, {size} bytes)")?;
            }
            Some(kind) => writeln!(self.out, "{} section (id {id}, {size} bytes)", kind.name())?,
            None => writeln!(self.out, "Unknown section (id {id}, {size} bytes)")?,
        }

        match kind {
            _ if self.options.raw => self.dump_until(end, INDENT)?,
            Some(ty::Section::Type) => self.type_section(end)?,
            Some(ty::Section::Function) => self.function_section(end)?,
            Some(ty::Section::Export) => self.export_section(end)?,
            Some(ty::Section::Code) => self.code_section(end)?,
            _ => self.dump_until(end, INDENT)?,
        }
        self.finish(end, INDENT, "section")?;
        Ok(true)
    }

    pub(crate) fn remaining(&self, end: u64) -> u64 {
        end.saturating_sub(self.bytes.bytes_read())
    }

    /// Reads a `u32`, or `None` if `end` has already been reached.
    pub(crate) fn u32_before(&mut self, end: u64) -> anyhow::Result<Option<u32>> {
        if self.remaining(end) == 0 {
            return Ok(None);
        }
        self.bytes.decode::<u32>()
    }

    /// Reads a length-prefixed name, clamping its bytes at `end`.
    pub(crate) fn name(&mut self, end: u64) -> anyhow::Result<Option<String>> {
        let Some(len) = self.u32_before(end)? else {
            return Ok(None);
        };
        let len = u64::from(len).min(self.remaining(end));
        let raw = self.bytes.take(len as usize)?;
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    pub(crate) fn dump_until(&mut self, end: u64, prefix: &str) -> anyhow::Result<()> {
        self.dump_with(Vec::new(), end, prefix)
    }

    /// Dumps `head` followed by everything up to `end`, keeping 16-byte line alignment.
    pub(crate) fn dump_with(
        &mut self,
        mut head: Vec<u8>,
        end: u64,
        prefix: &str,
    ) -> anyhow::Result<()> {
        loop {
            let wanted = RAW_BLOCK.saturating_sub(head.len()).min(self.remaining(end) as usize);
            head.extend(self.bytes.take(wanted)?);
            write!(self.out, "{}", HexDump::new(&head, prefix))?;
            if head.len() < RAW_BLOCK || self.remaining(end) == 0 {
                return Ok(());
            }
            head.clear();
        }
    }

    /// Checks that a grammar stopped exactly at `end`, resynchronising if it stopped short.
    pub(crate) fn finish(&mut self, end: u64, prefix: &str, what: &str) -> anyhow::Result<()> {
        let position = self.bytes.bytes_read();
        if position > end {
            let overrun = position - end;
            tracing::warn!(overrun, what, "read past declared end");
            writeln!(
                self.out,
                "{prefix};; {what} overran its declared size by {overrun} bytes",
            )?;
        } else if self.bytes.is_finished() && position < end {
            let missing = end - position;
            tracing::warn!(missing, what, "input ended early");
            writeln!(
                self.out,
                "{prefix};; input ended {missing} bytes before the end of the {what}",
            )?;
        } else if position < end {
            let left = end - position;
            tracing::warn!(left, what, "unread bytes");
            writeln!(self.out, "{prefix};; {left} unread bytes at the end of the {what}")?;
            self.dump_until(end, prefix)?;
            if self.bytes.bytes_read() < end {
                let missing = end - self.bytes.bytes_read();
                writeln!(
                    self.out,
                    "{prefix};; input ended {missing} bytes before the end of the {what}",
                )?;
            }
        }
        Ok(())
    }
}
