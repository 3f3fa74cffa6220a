use std::io::Write;

use super::{Disassembler, INDENT};
use crate::binary::decode::ChunkSource;
use crate::binary::instr::{self, Nesting};
use crate::binary::ty::TypeId;

/// Indentation for one function body. The bottom level is the base and is never popped.
#[derive(Debug)]
pub struct IndentStack {
    levels: Vec<String>,
}

impl IndentStack {
    pub fn new(base: &str) -> Self {
        Self {
            levels: vec![base.to_owned()],
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn current(&self) -> &str {
        &self.levels[self.levels.len() - 1]
    }

    pub fn push(&mut self) {
        let next = format!("{}{INDENT}", self.current());
        self.levels.push(next);
    }

    pub fn pop(&mut self) -> bool {
        if self.depth() == 0 {
            return false;
        }
        self.levels.pop();
        true
    }

    /// Applies the nesting effect of an instruction and returns the indent for its own line,
    /// or `Err` with that indent when the instruction closes a block that was never opened.
    pub fn apply(&mut self, nesting: Nesting) -> Result<String, String> {
        match nesting {
            Nesting::None => Ok(self.current().to_owned()),
            Nesting::Open => {
                let line = self.current().to_owned();
                self.push();
                Ok(line)
            }
            Nesting::Else => match self.depth() {
                0 => Err(self.current().to_owned()),
                depth => Ok(self.levels[depth - 1].clone()),
            },
            Nesting::Close if self.pop() => Ok(self.current().to_owned()),
            Nesting::Close => Err(self.current().to_owned()),
        }
    }
}

/// Lays out an instruction line with its doc comment starting at `column`.
/// When the text leaves no room, the comment goes on its own line above it.
pub fn layout(indent: &str, text: &str, doc: &str, column: usize) -> String {
    if doc.is_empty() {
        return format!("{indent}{text}\n");
    }
    let width = column.saturating_sub(indent.chars().count());
    let len = text.chars().count();
    if len < width {
        let pad = width - len;
        format!("{indent}{text}{:pad$};; {doc}\n", "")
    } else {
        format!("{indent}{:width$};; {doc}\n{indent}{text}\n", "")
    }
}

impl<S: ChunkSource, W: Write> Disassembler<'_, S, W> {
    pub(super) fn function_body(&mut self, end: u64) -> anyhow::Result<()> {
        let locals_indent = format!("{INDENT}{INDENT}");
        let Some(count) = self.u32_before(end)? else {
            return Ok(());
        };
        for index in 0..count {
            let Some(repeat) = self.u32_before(end)? else {
                break;
            };
            if self.remaining(end) == 0 {
                break;
            }
            let Some(ty) = self.bytes.next()? else {
                return Ok(());
            };
            writeln!(self.out, "{locals_indent}Local #{index}: {repeat} of {}", TypeId(ty))?;
        }
        self.instructions(end)
    }

    fn instructions(&mut self, end: u64) -> anyhow::Result<()> {
        let mut indents = IndentStack::new(INDENT);
        // the function body itself is the outermost block
        indents.push();
        while 0 < self.remaining(end) {
            let Some(code) = self.bytes.next()? else {
                break;
            };
            let Some(opcode) = instr::lookup(code) else {
                let left = self.remaining(end) + 1;
                tracing::warn!(code, left, "unknown opcode");
                writeln!(
                    self.out,
                    "{};; unknown opcode 0x{code:0>2x}, dumping the remaining {left} bytes",
                    indents.current()
                )?;
                let prefix = indents.current().to_owned();
                return self.dump_with(vec![code], end, &prefix);
            };
            let indent = match indents.apply(opcode.nesting()) {
                Ok(indent) => indent,
                Err(indent) => {
                    tracing::warn!(mnemonic = opcode.mnemonic, "no enclosing block");
                    writeln!(
                        self.out,
                        "{indent};; `{}` without an enclosing block",
                        opcode.mnemonic,
                    )?;
                    indent
                }
            };
            let text = opcode.render(self.bytes, end)?;
            let line = layout(&indent, &text, opcode.doc, self.options.comment_column);
            self.out.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depths(stack: &mut IndentStack, nestings: &[Nesting]) -> Vec<usize> {
        nestings
            .iter()
            .map(|&nesting| {
                let indent = stack.apply(nesting).unwrap_or_else(|indent| indent);
                indent.len() / INDENT.len()
            })
            .collect()
    }

    #[test]
    fn nested_blocks() {
        let mut stack = IndentStack::new("");
        let nestings = [Nesting::Open, Nesting::Open, Nesting::Close, Nesting::Close];
        assert_eq!(vec![0, 1, 1, 0], depths(&mut stack, &nestings));
        assert_eq!(0, stack.depth());
    }

    #[test]
    fn else_dedents_only_its_own_line() {
        let mut stack = IndentStack::new("");
        let nestings = [
            Nesting::Open,
            Nesting::None,
            Nesting::Else,
            Nesting::None,
            Nesting::Close,
            Nesting::None,
        ];
        assert_eq!(vec![0, 1, 0, 1, 0, 0], depths(&mut stack, &nestings));
    }

    #[test]
    fn unmatched_close_is_flagged() {
        let mut stack = IndentStack::new("  ");
        assert_eq!(Err("  ".to_owned()), stack.apply(Nesting::Close));
        assert_eq!(Err("  ".to_owned()), stack.apply(Nesting::Else));
        assert_eq!(0, stack.depth());
        assert_eq!(Ok("  ".to_owned()), stack.apply(Nesting::Open));
        assert_eq!(Ok("  ".to_owned()), stack.apply(Nesting::Close));
    }

    #[test]
    fn comment_starts_at_column() {
        let line = layout("    ", "i32.add", "Sign-agnostic i32 addition", 80);
        assert_eq!(Some(80), line.find(";;"));
        assert!(line.starts_with("    i32.add "));
        assert_eq!(1, line.lines().count());
    }

    #[test]
    fn long_line_puts_comment_above() {
        let text = "x".repeat(78);
        let line = layout("  ", &text, "doc", 80);
        let lines = line.lines().collect::<Vec<_>>();
        assert_eq!(2, lines.len());
        assert_eq!(format!("{};; doc", " ".repeat(80)), lines[0]);
        assert_eq!(format!("  {text}"), lines[1]);
    }

    #[test]
    fn no_doc_no_padding() {
        assert_eq!("  nop\n", layout("  ", "nop", "", 80));
    }
}
