use super::decode::{ByteReader, ChunkSource, Decode, DecodeTag};

pub const FUNC_FORM: u8 = 0x60;
pub const EMPTY_BLOCK: u8 = 0x40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    I32,
    I64,
    F32,
    F64,
    AnyFunc,
    Func,
    Empty,
}

impl DecodeTag for Value {
    fn decode_tag(byte: u8) -> Option<Self> {
        Some(match byte {
            0x7f => Self::I32,
            0x7e => Self::I64,
            0x7d => Self::F32,
            0x7c => Self::F64,
            0x70 => Self::AnyFunc,
            FUNC_FORM => Self::Func,
            EMPTY_BLOCK => Self::Empty,
            _ => return None,
        })
    }
}

impl Value {
    pub fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::AnyFunc => "anyfunc",
            Self::Func => "func",
            Self::Empty => "empty",
        }
    }
}

/// A type id as it appears on the wire, known or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeId(pub u8);

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match Value::decode_tag(self.0) {
            Some(value) => f.write_str(value.name()),
            None => write!(f, "unknown type with id 0x{:0>2x}", self.0),
        }
    }
}

impl<S: ChunkSource> Decode<S> for TypeId {
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>> {
        Ok(super::value::read_unsigned(bytes, 7)?.map(|id| Self(id as u8)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalKind {
    Function,
    Table,
    Memory,
    Global,
}

impl DecodeTag for ExternalKind {
    fn decode_tag(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Function),
            0x01 => Some(Self::Table),
            0x02 => Some(Self::Memory),
            0x03 => Some(Self::Global),
            _ => None,
        }
    }
}

pub struct Kind(pub u8);

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match ExternalKind::decode_tag(self.0) {
            Some(ExternalKind::Function) => "function",
            Some(ExternalKind::Table) => "table",
            Some(ExternalKind::Memory) => "memory",
            Some(ExternalKind::Global) => "global",
            None => return write!(f, "unknown kind 0x{:0>2x}", self.0),
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Custom,
    Type,
    Import,
    Function,
    Table,
    Memory,
    Global,
    Export,
    Start,
    Element,
    Code,
    Data,
}

impl DecodeTag for Section {
    fn decode_tag(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Custom,
            1 => Self::Type,
            2 => Self::Import,
            3 => Self::Function,
            4 => Self::Table,
            5 => Self::Memory,
            6 => Self::Global,
            7 => Self::Export,
            8 => Self::Start,
            9 => Self::Element,
            10 => Self::Code,
            11 => Self::Data,
            _ => return None,
        })
    }
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Type => "Type",
            Self::Import => "Import",
            Self::Function => "Function",
            Self::Table => "Table",
            Self::Memory => "Memory",
            Self::Global => "Global",
            Self::Export => "Export",
            Self::Start => "Start",
            Self::Element => "Element",
            Self::Code => "Code",
            Self::Data => "Data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!("i32", TypeId(0x7f).to_string());
        assert_eq!("f64", TypeId(0x7c).to_string());
        assert_eq!("anyfunc", TypeId(0x70).to_string());
        assert_eq!("unknown type with id 0x7b", TypeId(0x7b).to_string());
    }

    #[test]
    fn kind_names() {
        assert_eq!("memory", Kind(2).to_string());
        assert_eq!("unknown kind 0x04", Kind(4).to_string());
    }

    #[test]
    fn section_ids() {
        assert_eq!(Some(Section::Code), Section::decode_tag(10));
        assert_eq!(Some(Section::Custom), Section::decode_tag(0));
        assert_eq!(None, Section::decode_tag(12));
    }
}
