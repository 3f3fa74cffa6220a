use std::sync::LazyLock;

use super::decode::{ByteReader, ChunkSource};
use super::ty::{EMPTY_BLOCK, TypeId};
use super::value::{SignedInt, read_unsigned};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmediateKind {
    BlockType,
    BranchTable,
    MemoryAccess,
    VarInt { bits: u32, signed: bool },
    Float { bits: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Immediate {
    pub name: Option<&'static str>,
    pub kind: ImmediateKind,
}

impl Immediate {
    const fn new(kind: ImmediateKind) -> Self {
        Self { name: None, kind }
    }

    const fn named(name: &'static str, kind: ImmediateKind) -> Self {
        Self {
            name: Some(name),
            kind,
        }
    }

    /// Decodes the operand and renders it. `None` means there is nothing to show,
    /// either because the operand is the empty block type or the input ran out.
    /// Nothing is read once the reader has reached `end`.
    pub fn format<S: ChunkSource>(
        &self,
        bytes: &mut ByteReader<S>,
        end: u64,
    ) -> anyhow::Result<Option<String>> {
        if end <= bytes.bytes_read() {
            return Ok(None);
        }
        let value = match self.kind {
            ImmediateKind::BlockType => {
                let Some(SignedInt(id)) = bytes.decode::<SignedInt<7>>()? else {
                    return Ok(None);
                };
                let byte = (id as u8) & 0x7f;
                if byte == EMPTY_BLOCK {
                    return Ok(None);
                }
                TypeId(byte).to_string()
            }
            ImmediateKind::BranchTable => {
                let Some(count) = read_unsigned(bytes, 32)? else {
                    return Ok(None);
                };
                let mut targets = Vec::new();
                for _ in 0..count {
                    if end <= bytes.bytes_read() {
                        break;
                    }
                    match read_unsigned(bytes, 32)? {
                        Some(target) => targets.push(target.to_string()),
                        None => break,
                    }
                }
                let default = if bytes.bytes_read() < end {
                    read_unsigned(bytes, 32)?
                } else {
                    None
                };
                let default = default.map_or_else(|| "?".to_owned(), |target| target.to_string());
                format!("[{}] default: {default}", targets.join(", "))
            }
            ImmediateKind::MemoryAccess => {
                let Some(flags) = read_unsigned(bytes, 32)? else {
                    return Ok(None);
                };
                let offset = if bytes.bytes_read() < end {
                    read_unsigned(bytes, 32)?.unwrap_or_default()
                } else {
                    0
                };
                if flags == 0 {
                    format!("offset: {offset}")
                } else {
                    format!("offset: {offset} align:{flags}")
                }
            }
            ImmediateKind::VarInt { bits: 64, signed: true } => {
                match bytes.decode::<SignedInt<64>>()? {
                    Some(SignedInt(value)) => value.to_string(),
                    None => return Ok(None),
                }
            }
            ImmediateKind::VarInt { signed: true, .. } => {
                match bytes.decode::<SignedInt<32>>()? {
                    Some(SignedInt(value)) => value.to_string(),
                    None => return Ok(None),
                }
            }
            ImmediateKind::VarInt { bits, signed: false } => match read_unsigned(bytes, bits)? {
                Some(value) => value.to_string(),
                None => return Ok(None),
            },
            ImmediateKind::Float { bits: 32 } => match bytes.decode::<f32>()? {
                Some(value) => value.to_string(),
                None => return Ok(None),
            },
            ImmediateKind::Float { .. } => match bytes.decode::<f64>()? {
                Some(value) => value.to_string(),
                None => return Ok(None),
            },
        };
        Ok(Some(match self.name {
            Some(name) => format!("{name}: {value}"),
            None => value,
        }))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: &'static str,
    pub immediates: &'static [Immediate],
    pub doc: &'static str,
}

impl Opcode {
    /// Mnemonic followed by every present immediate, space separated.
    /// Immediates stop at `end`, the end of the enclosing function body.
    pub fn render<S: ChunkSource>(
        &self,
        bytes: &mut ByteReader<S>,
        end: u64,
    ) -> anyhow::Result<String> {
        let mut line = self.mnemonic.to_owned();
        for immediate in self.immediates {
            if let Some(text) = immediate.format(bytes, end)? {
                line.push(' ');
                line.push_str(&text);
            }
        }
        Ok(line)
    }

    pub fn nesting(&self) -> Nesting {
        match self.code {
            BLOCK | LOOP | IF => Nesting::Open,
            ELSE => Nesting::Else,
            END => Nesting::Close,
            _ => Nesting::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nesting {
    None,
    Open,
    Else,
    Close,
}

pub const BLOCK: u8 = 0x02;
pub const LOOP: u8 = 0x03;
pub const IF: u8 = 0x04;
pub const ELSE: u8 = 0x05;
pub const END: u8 = 0x0b;

const BLOCK_TYPE: &[Immediate] = &[Immediate::new(ImmediateKind::BlockType)];
const BRANCH_TABLE: &[Immediate] = &[Immediate::new(ImmediateKind::BranchTable)];
const MEMORY: &[Immediate] = &[Immediate::new(ImmediateKind::MemoryAccess)];
const DEPTH: &[Immediate] = &[Immediate::named("depth", U32)];
const INDEX: &[Immediate] = &[Immediate::new(U32)];
const FUNCTION: &[Immediate] = &[Immediate::named("function", U32)];
const INDIRECT: &[Immediate] = &[Immediate::named("type", U32), Immediate::named("reserved", U1)];
const RESERVED: &[Immediate] = &[Immediate::named("reserved", U1)];
const I32: &[Immediate] = &[Immediate::new(ImmediateKind::VarInt { bits: 32, signed: true })];
const I64: &[Immediate] = &[Immediate::new(ImmediateKind::VarInt { bits: 64, signed: true })];
const F32: &[Immediate] = &[Immediate::new(ImmediateKind::Float { bits: 32 })];
const F64: &[Immediate] = &[Immediate::new(ImmediateKind::Float { bits: 64 })];

const U32: ImmediateKind = ImmediateKind::VarInt { bits: 32, signed: false };
const U1: ImmediateKind = ImmediateKind::VarInt { bits: 1, signed: false };

const fn op(
    code: u8,
    mnemonic: &'static str,
    immediates: &'static [Immediate],
    doc: &'static str,
) -> Opcode {
    Opcode {
        code,
        mnemonic,
        immediates,
        doc,
    }
}

#[rustfmt::skip]
pub static OPCODES: &[Opcode] = &[
    // control
    op(0x00, "unreachable", &[], "Trap immediately"),
    op(0x01, "nop", &[], "No operation"),
    op(BLOCK, "block", BLOCK_TYPE, "Begin a sequence of expressions, yielding 0 or 1 values"),
    op(LOOP, "loop", BLOCK_TYPE, "Begin a block which can also form control flow loops"),
    op(IF, "if", BLOCK_TYPE, "Begin if expression"),
    op(ELSE, "else", &[], "Begin else expression of if"),
    op(END, "end", &[], "End a block, loop, if, or function body"),
    op(0x0c, "br", DEPTH, "Break that targets an outer nested block"),
    op(0x0d, "br_if", DEPTH, "Conditional break that targets an outer nested block"),
    op(0x0e, "br_table", BRANCH_TABLE, "Branch table control flow construct"),
    op(0x0f, "return", &[], "Return zero or one value from this function"),
    op(0x10, "call", FUNCTION, "Call a function by its index"),
    op(0x11, "call_indirect", INDIRECT, "Call a function indirect with an expected signature"),
    // parametric
    op(0x1a, "drop", &[], "Ignore value"),
    op(0x1b, "select", &[], "Select one of two values based on condition"),
    // variable access
    op(0x20, "get_local", INDEX, "Read a local variable or parameter"),
    op(0x21, "set_local", INDEX, "Write a local variable or parameter"),
    op(0x22, "tee_local", INDEX, "Write a local variable or parameter and return the same value"),
    op(0x23, "get_global", INDEX, "Read a global variable"),
    op(0x24, "set_global", INDEX, "Write a global variable"),
    // memory
    op(0x28, "i32.load", MEMORY, "Load 4 bytes as i32"),
    op(0x29, "i64.load", MEMORY, "Load 8 bytes as i64"),
    op(0x2a, "f32.load", MEMORY, "Load 4 bytes as f32"),
    op(0x2b, "f64.load", MEMORY, "Load 8 bytes as f64"),
    op(0x2c, "i32.load8_s", MEMORY, "Load 1 byte and sign-extend i8 to i32"),
    op(0x2d, "i32.load8_u", MEMORY, "Load 1 byte and zero-extend i8 to i32"),
    op(0x2e, "i32.load16_s", MEMORY, "Load 2 bytes and sign-extend i16 to i32"),
    op(0x2f, "i32.load16_u", MEMORY, "Load 2 bytes and zero-extend i16 to i32"),
    op(0x30, "i64.load8_s", MEMORY, "Load 1 byte and sign-extend i8 to i64"),
    op(0x31, "i64.load8_u", MEMORY, "Load 1 byte and zero-extend i8 to i64"),
    op(0x32, "i64.load16_s", MEMORY, "Load 2 bytes and sign-extend i16 to i64"),
    op(0x33, "i64.load16_u", MEMORY, "Load 2 bytes and zero-extend i16 to i64"),
    op(0x34, "i64.load32_s", MEMORY, "Load 4 bytes and sign-extend i32 to i64"),
    op(0x35, "i64.load32_u", MEMORY, "Load 4 bytes and zero-extend i32 to i64"),
    op(0x36, "i32.store", MEMORY, "Store 4 bytes (no conversion)"),
    op(0x37, "i64.store", MEMORY, "Store 8 bytes (no conversion)"),
    op(0x38, "f32.store", MEMORY, "Store 4 bytes (no conversion)"),
    op(0x39, "f64.store", MEMORY, "Store 8 bytes (no conversion)"),
    op(0x3a, "i32.store8", MEMORY, "Wrap i32 to i8 and store 1 byte"),
    op(0x3b, "i32.store16", MEMORY, "Wrap i32 to i16 and store 2 bytes"),
    op(0x3c, "i64.store8", MEMORY, "Wrap i64 to i8 and store 1 byte"),
    op(0x3d, "i64.store16", MEMORY, "Wrap i64 to i16 and store 2 bytes"),
    op(0x3e, "i64.store32", MEMORY, "Wrap i64 to i32 and store 4 bytes"),
    op(0x3f, "current_memory", RESERVED, "Query the size of memory in pages"),
    op(0x40, "grow_memory", RESERVED, "Grow the size of memory by a number of pages"),
    // constants
    op(0x41, "i32.const", I32, "A constant value interpreted as i32"),
    op(0x42, "i64.const", I64, "A constant value interpreted as i64"),
    op(0x43, "f32.const", F32, "A constant value interpreted as f32"),
    op(0x44, "f64.const", F64, "A constant value interpreted as f64"),
    // comparison
    op(0x45, "i32.eqz", &[], "Compare i32 equal to zero"),
    op(0x46, "i32.eq", &[], "Sign-agnostic compare i32 equal"),
    op(0x47, "i32.ne", &[], "Sign-agnostic compare i32 unequal"),
    op(0x48, "i32.lt_s", &[], "Signed i32 less than"),
    op(0x49, "i32.lt_u", &[], "Unsigned i32 less than"),
    op(0x4a, "i32.gt_s", &[], "Signed i32 greater than"),
    op(0x4b, "i32.gt_u", &[], "Unsigned i32 greater than"),
    op(0x4c, "i32.le_s", &[], "Signed i32 less than or equal"),
    op(0x4d, "i32.le_u", &[], "Unsigned i32 less than or equal"),
    op(0x4e, "i32.ge_s", &[], "Signed i32 greater than or equal"),
    op(0x4f, "i32.ge_u", &[], "Unsigned i32 greater than or equal"),
    op(0x50, "i64.eqz", &[], "Compare i64 equal to zero"),
    op(0x51, "i64.eq", &[], "Sign-agnostic compare i64 equal"),
    op(0x52, "i64.ne", &[], "Sign-agnostic compare i64 unequal"),
    op(0x53, "i64.lt_s", &[], "Signed i64 less than"),
    op(0x54, "i64.lt_u", &[], "Unsigned i64 less than"),
    op(0x55, "i64.gt_s", &[], "Signed i64 greater than"),
    op(0x56, "i64.gt_u", &[], "Unsigned i64 greater than"),
    op(0x57, "i64.le_s", &[], "Signed i64 less than or equal"),
    op(0x58, "i64.le_u", &[], "Unsigned i64 less than or equal"),
    op(0x59, "i64.ge_s", &[], "Signed i64 greater than or equal"),
    op(0x5a, "i64.ge_u", &[], "Unsigned i64 greater than or equal"),
    op(0x5b, "f32.eq", &[], "Compare f32 ordered and equal"),
    op(0x5c, "f32.ne", &[], "Compare f32 unordered or unequal"),
    op(0x5d, "f32.lt", &[], "Compare f32 ordered and less than"),
    op(0x5e, "f32.gt", &[], "Compare f32 ordered and greater than"),
    op(0x5f, "f32.le", &[], "Compare f32 ordered and less than or equal"),
    op(0x60, "f32.ge", &[], "Compare f32 ordered and greater than or equal"),
    op(0x61, "f64.eq", &[], "Compare f64 ordered and equal"),
    op(0x62, "f64.ne", &[], "Compare f64 unordered or unequal"),
    op(0x63, "f64.lt", &[], "Compare f64 ordered and less than"),
    op(0x64, "f64.gt", &[], "Compare f64 ordered and greater than"),
    op(0x65, "f64.le", &[], "Compare f64 ordered and less than or equal"),
    op(0x66, "f64.ge", &[], "Compare f64 ordered and greater than or equal"),
    // i32 arithmetic
    op(0x67, "i32.clz", &[], "Sign-agnostic count leading zero bits of i32"),
    op(0x68, "i32.ctz", &[], "Sign-agnostic count trailing zero bits of i32"),
    op(0x69, "i32.popcnt", &[], "Sign-agnostic count number of one bits of i32"),
    op(0x6a, "i32.add", &[], "Sign-agnostic i32 addition"),
    op(0x6b, "i32.sub", &[], "Sign-agnostic i32 subtraction"),
    op(0x6c, "i32.mul", &[], "Sign-agnostic i32 multiplication (lower 32 bits)"),
    op(0x6d, "i32.div_s", &[], "Signed i32 division (result is truncated toward zero)"),
    op(0x6e, "i32.div_u", &[], "Unsigned i32 division (result is floored)"),
    op(0x6f, "i32.rem_s", &[], "Signed i32 remainder (result has the sign of the dividend)"),
    op(0x70, "i32.rem_u", &[], "Unsigned i32 remainder"),
    op(0x71, "i32.and", &[], "Sign-agnostic i32 bitwise and"),
    op(0x72, "i32.or", &[], "Sign-agnostic i32 bitwise inclusive or"),
    op(0x73, "i32.xor", &[], "Sign-agnostic i32 bitwise exclusive or"),
    op(0x74, "i32.shl", &[], "Sign-agnostic i32 shift left"),
    op(0x75, "i32.shr_s", &[], "Sign-replicating (arithmetic) i32 shift right"),
    op(0x76, "i32.shr_u", &[], "Zero-replicating (logical) i32 shift right"),
    op(0x77, "i32.rotl", &[], "Sign-agnostic i32 rotate left"),
    op(0x78, "i32.rotr", &[], "Sign-agnostic i32 rotate right"),
    // i64 arithmetic
    op(0x79, "i64.clz", &[], "Sign-agnostic count leading zero bits of i64"),
    op(0x7a, "i64.ctz", &[], "Sign-agnostic count trailing zero bits of i64"),
    op(0x7b, "i64.popcnt", &[], "Sign-agnostic count number of one bits of i64"),
    op(0x7c, "i64.add", &[], "Sign-agnostic i64 addition"),
    op(0x7d, "i64.sub", &[], "Sign-agnostic i64 subtraction"),
    op(0x7e, "i64.mul", &[], "Sign-agnostic i64 multiplication (lower 64 bits)"),
    op(0x7f, "i64.div_s", &[], "Signed i64 division (result is truncated toward zero)"),
    op(0x80, "i64.div_u", &[], "Unsigned i64 division (result is floored)"),
    op(0x81, "i64.rem_s", &[], "Signed i64 remainder (result has the sign of the dividend)"),
    op(0x82, "i64.rem_u", &[], "Unsigned i64 remainder"),
    op(0x83, "i64.and", &[], "Sign-agnostic i64 bitwise and"),
    op(0x84, "i64.or", &[], "Sign-agnostic i64 bitwise inclusive or"),
    op(0x85, "i64.xor", &[], "Sign-agnostic i64 bitwise exclusive or"),
    op(0x86, "i64.shl", &[], "Sign-agnostic i64 shift left"),
    op(0x87, "i64.shr_s", &[], "Sign-replicating (arithmetic) i64 shift right"),
    op(0x88, "i64.shr_u", &[], "Zero-replicating (logical) i64 shift right"),
    op(0x89, "i64.rotl", &[], "Sign-agnostic i64 rotate left"),
    op(0x8a, "i64.rotr", &[], "Sign-agnostic i64 rotate right"),
    // f32 arithmetic
    op(0x8b, "f32.abs", &[], "f32 absolute value"),
    op(0x8c, "f32.neg", &[], "f32 negation"),
    op(0x8d, "f32.ceil", &[], "f32 ceiling operator"),
    op(0x8e, "f32.floor", &[], "f32 floor operator"),
    op(0x8f, "f32.trunc", &[], "f32 round to nearest integer towards zero"),
    op(0x90, "f32.nearest", &[], "f32 round to nearest integer, ties to even"),
    op(0x91, "f32.sqrt", &[], "f32 square root"),
    op(0x92, "f32.add", &[], "f32 addition"),
    op(0x93, "f32.sub", &[], "f32 subtraction"),
    op(0x94, "f32.mul", &[], "f32 multiplication"),
    op(0x95, "f32.div", &[], "f32 division"),
    op(0x96, "f32.min", &[], "f32 minimum (binary operator); if either operand is NaN, returns NaN"),
    op(0x97, "f32.max", &[], "f32 maximum (binary operator); if either operand is NaN, returns NaN"),
    op(0x98, "f32.copysign", &[], "f32 copysign"),
    // f64 arithmetic
    op(0x99, "f64.abs", &[], "f64 absolute value"),
    op(0x9a, "f64.neg", &[], "f64 negation"),
    op(0x9b, "f64.ceil", &[], "f64 ceiling operator"),
    op(0x9c, "f64.floor", &[], "f64 floor operator"),
    op(0x9d, "f64.trunc", &[], "f64 round to nearest integer towards zero"),
    op(0x9e, "f64.nearest", &[], "f64 round to nearest integer, ties to even"),
    op(0x9f, "f64.sqrt", &[], "f64 square root"),
    op(0xa0, "f64.add", &[], "f64 addition"),
    op(0xa1, "f64.sub", &[], "f64 subtraction"),
    op(0xa2, "f64.mul", &[], "f64 multiplication"),
    op(0xa3, "f64.div", &[], "f64 division"),
    op(0xa4, "f64.min", &[], "f64 minimum (binary operator); if either operand is NaN, returns NaN"),
    op(0xa5, "f64.max", &[], "f64 maximum (binary operator); if either operand is NaN, returns NaN"),
    op(0xa6, "f64.copysign", &[], "f64 copysign"),
    // conversions
    op(0xa7, "i32.wrap/i64", &[], "Wrap a 64-bit integer to a 32-bit integer"),
    op(0xa8, "i32.trunc_s/f32", &[], "Truncate a 32-bit float to a signed 32-bit integer"),
    op(0xa9, "i32.trunc_u/f32", &[], "Truncate a 32-bit float to an unsigned 32-bit integer"),
    op(0xaa, "i32.trunc_s/f64", &[], "Truncate a 64-bit float to a signed 32-bit integer"),
    op(0xab, "i32.trunc_u/f64", &[], "Truncate a 64-bit float to an unsigned 32-bit integer"),
    op(0xac, "i64.extend_s/i32", &[], "Extend a signed 32-bit integer to a 64-bit integer"),
    op(0xad, "i64.extend_u/i32", &[], "Extend an unsigned 32-bit integer to a 64-bit integer"),
    op(0xae, "i64.trunc_s/f32", &[], "Truncate a 32-bit float to a signed 64-bit integer"),
    op(0xaf, "i64.trunc_u/f32", &[], "Truncate a 32-bit float to an unsigned 64-bit integer"),
    op(0xb0, "i64.trunc_s/f64", &[], "Truncate a 64-bit float to a signed 64-bit integer"),
    op(0xb1, "i64.trunc_u/f64", &[], "Truncate a 64-bit float to an unsigned 64-bit integer"),
    op(0xb2, "f32.convert_s/i32", &[], "Convert a signed 32-bit integer to a 32-bit float"),
    op(0xb3, "f32.convert_u/i32", &[], "Convert an unsigned 32-bit integer to a 32-bit float"),
    op(0xb4, "f32.convert_s/i64", &[], "Convert a signed 64-bit integer to a 32-bit float"),
    op(0xb5, "f32.convert_u/i64", &[], "Convert an unsigned 64-bit integer to a 32-bit float"),
    op(0xb6, "f32.demote/f64", &[], "Demote a 64-bit float to a 32-bit float"),
    op(0xb7, "f64.convert_s/i32", &[], "Convert a signed 32-bit integer to a 64-bit float"),
    op(0xb8, "f64.convert_u/i32", &[], "Convert an unsigned 32-bit integer to a 64-bit float"),
    op(0xb9, "f64.convert_s/i64", &[], "Convert a signed 64-bit integer to a 64-bit float"),
    op(0xba, "f64.convert_u/i64", &[], "Convert an unsigned 64-bit integer to a 64-bit float"),
    op(0xbb, "f64.promote/f32", &[], "Promote a 32-bit float to a 64-bit float"),
    // reinterpretations
    op(0xbc, "i32.reinterpret/f32", &[], "Reinterpret the bits of a 32-bit float as a 32-bit integer"),
    op(0xbd, "i64.reinterpret/f64", &[], "Reinterpret the bits of a 64-bit float as a 64-bit integer"),
    op(0xbe, "f32.reinterpret/i32", &[], "Reinterpret the bits of a 32-bit integer as a 32-bit float"),
    op(0xbf, "f64.reinterpret/i64", &[], "Reinterpret the bits of a 64-bit integer as a 64-bit float"),
];

static BY_CODE: LazyLock<[Option<&'static Opcode>; 256]> = LazyLock::new(|| {
    let mut table = [None; 256];
    for opcode in OPCODES {
        table[usize::from(opcode.code)] = Some(opcode);
    }
    table
});

pub fn lookup(code: u8) -> Option<&'static Opcode> {
    BY_CODE[usize::from(code)]
}
