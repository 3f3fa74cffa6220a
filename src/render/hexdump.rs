use std::fmt;

pub const BYTES_PER_LINE: usize = 16;
const GROUP: usize = 8;

/// Canonical hex plus printable-ASCII rendering, 16 bytes per line.
pub struct HexDump<'a> {
    pub bytes: &'a [u8],
    pub prefix: &'a str,
}

impl<'a> HexDump<'a> {
    pub fn new(bytes: &'a [u8], prefix: &'a str) -> Self {
        Self { bytes, prefix }
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.bytes.chunks(BYTES_PER_LINE) {
            f.write_str(self.prefix)?;
            for i in 0..BYTES_PER_LINE {
                if i == GROUP {
                    f.write_str(" ")?;
                }
                if 0 < i {
                    f.write_str(" ")?;
                }
                match line.get(i) {
                    Some(byte) => write!(f, "{byte:0>2x}")?,
                    None => f.write_str("  ")?,
                }
            }
            f.write_str("  |")?;
            for &byte in line {
                let shown = if (0x20..0x7f).contains(&byte) { byte as char } else { '.' };
                write!(f, "{shown}")?;
            }
            f.write_str("|\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        assert_eq!("", HexDump::new(&[], "").to_string());
    }

    #[test]
    fn single_byte() {
        let expected = format!("{:<48}  |a|\n", "61");
        assert_eq!(expected, HexDump::new(b"a", "").to_string());
    }

    #[test]
    fn one_group() {
        let magic = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
        let dump = HexDump::new(&magic, "  ").to_string();
        assert_eq!(format!("  {:<48}  |.asm....|\n", "00 61 73 6d 01 00 00 00"), dump);
    }

    #[test]
    fn full_line() {
        let bytes = (0x40..0x50).collect::<Vec<u8>>();
        assert_eq!(
            "40 41 42 43 44 45 46 47  48 49 4a 4b 4c 4d 4e 4f  |@ABCDEFGHIJKLMNO|\n",
            HexDump::new(&bytes, "").to_string(),
        );
    }

    #[test]
    fn second_line_stays_aligned() {
        let mut bytes = b"Hello, world!\n\t\x7f".to_vec();
        bytes.push(0xff);
        let dump = HexDump::new(&bytes, "> ").to_string();
        let lines = dump.lines().collect::<Vec<_>>();
        assert_eq!(
            vec![
                "> 48 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21 0a 09 7f  |Hello, world!...|",
                "> ff                                                |.|",
            ],
            lines,
        );
        assert_eq!(lines[0].find('|'), lines[1].find('|'));
    }
}
