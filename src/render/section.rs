use std::io::Write;

use super::{Disassembler, INDENT};
use crate::binary::decode::ChunkSource;
use crate::binary::ty::{FUNC_FORM, Kind, TypeId};
use crate::binary::value::{UnsignedInt, read_unsigned};

fn join(types: &[TypeId]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl<S: ChunkSource, W: Write> Disassembler<'_, S, W> {
    /// Reads an entry count, or `None` if the input ended.
    fn count(&mut self) -> anyhow::Result<Option<u32>> {
        self.bytes.decode::<u32>()
    }

    /// Reads up to `count` value types, stopping at `end`.
    fn types(&mut self, count: u64, end: u64) -> anyhow::Result<Vec<TypeId>> {
        let mut types = Vec::new();
        for _ in 0..count {
            if self.remaining(end) == 0 {
                break;
            }
            match self.bytes.decode::<TypeId>()? {
                Some(ty) => types.push(ty),
                None => break,
            }
        }
        Ok(types)
    }

    pub(super) fn type_section(&mut self, end: u64) -> anyhow::Result<()> {
        let Some(count) = self.count()? else {
            return Ok(());
        };
        for index in 0..count {
            if self.remaining(end) == 0 {
                break;
            }
            let Some(UnsignedInt(form)) = self.bytes.decode::<UnsignedInt<7>>()? else {
                return Ok(());
            };
            if form != u64::from(FUNC_FORM) {
                tracing::warn!(index, form, "unexpected type form");
                writeln!(
                    self.out,
                    "{INDENT};; unexpected form 0x{form:0>2x} for type #{index}, \
                     expected 0x{FUNC_FORM:0>2x}"
                )?;
                return self.dump_until(end, INDENT);
            }
            let params = match self.u32_before(end)? {
                Some(count) => self.types(u64::from(count), end)?,
                None => Vec::new(),
            };
            let returns = match self.remaining(end) {
                0 => Vec::new(),
                _ => {
                    let count = read_unsigned(self.bytes, 1)?.unwrap_or_default();
                    self.types(count, end)?
                }
            };
            writeln!(
                self.out,
                "{INDENT}Function type #{index} ({}) → ({})",
                join(&params),
                join(&returns),
            )?;
        }
        Ok(())
    }

    pub(super) fn function_section(&mut self, end: u64) -> anyhow::Result<()> {
        let Some(count) = self.count()? else {
            return Ok(());
        };
        for index in 0..count {
            if self.remaining(end) == 0 {
                break;
            }
            let Some(ty) = self.bytes.decode::<u32>()? else {
                break;
            };
            writeln!(self.out, "{INDENT}Function #{index} is of function type #{ty}")?;
        }
        Ok(())
    }

    pub(super) fn export_section(&mut self, end: u64) -> anyhow::Result<()> {
        let Some(count) = self.count()? else {
            return Ok(());
        };
        for _ in 0..count {
            if self.remaining(end) == 0 {
                break;
            }
            let Some(name) = self.name(end)? else {
                break;
            };
            if self.remaining(end) == 0 {
                break;
            }
            let Some(kind) = self.bytes.next()? else {
                break;
            };
            let index = self.u32_before(end)?.unwrap_or_default();
            writeln!(
                self.out,
                "{INDENT}Export {name:?} of kind {} → entry #{index}",
                Kind(kind),
            )?;
        }
        Ok(())
    }

    pub(super) fn code_section(&mut self, end: u64) -> anyhow::Result<()> {
        let Some(count) = self.count()? else {
            return Ok(());
        };
        for index in 0..count {
            if self.remaining(end) == 0 {
                break;
            }
            let Some(size) = self.bytes.decode::<u32>()? else {
                break;
            };
            let body_end = self.bytes.bytes_read() + u64::from(size);
            tracing::debug!(index, size, "function body");
            writeln!(self.out, "{INDENT}Function body #{index} ({size} bytes)")?;
            self.function_body(body_end)?;
            self.finish(body_end, INDENT, "function body")?;
        }
        Ok(())
    }
}
