use super::decode::{ByteReader, ChunkSource, Decode};

pub enum UnsignedIntByte {
    Next(u8),
    Last(u8),
}

impl UnsignedIntByte {
    const BIT_COUNT: u32 = 7;
}

impl From<u8> for UnsignedIntByte {
    fn from(byte: u8) -> Self {
        if 0 < byte & 0b1000_0000 {
            Self::Next(byte & 0b0111_1111)
        } else {
            Self::Last(byte)
        }
    }
}

/// Accumulates LEB128 payload bits until a final byte, `max_bits` bits, or the end of input.
/// Returns the raw value together with the number of payload bits read.
fn accumulate<S: ChunkSource>(
    bytes: &mut ByteReader<S>,
    max_bits: u32,
) -> anyhow::Result<Option<(u64, u32)>> {
    let mut result = 0u64;
    let mut shift = 0;
    while let Some(byte) = bytes.next()? {
        let (payload, is_last) = match UnsignedIntByte::from(byte) {
            UnsignedIntByte::Next(payload) => (payload, false),
            UnsignedIntByte::Last(payload) => (payload, true),
        };
        if shift < u64::BITS {
            result |= u64::from(payload) << shift;
        }
        shift += UnsignedIntByte::BIT_COUNT;
        if is_last || max_bits <= shift {
            break;
        }
    }
    Ok((0 < shift).then_some((result, shift)))
}

pub fn read_unsigned<S: ChunkSource>(
    bytes: &mut ByteReader<S>,
    max_bits: u32,
) -> anyhow::Result<Option<u64>> {
    Ok(accumulate(bytes, max_bits)?.map(|(value, _)| value))
}

/// Two's-complement over the bits actually read, capped at `max_bits`.
pub fn read_signed<S: ChunkSource>(
    bytes: &mut ByteReader<S>,
    max_bits: u32,
) -> anyhow::Result<Option<i64>> {
    Ok(accumulate(bytes, max_bits)?.map(|(value, shift)| {
        let width = shift.min(max_bits).min(u64::BITS);
        let unused = u64::BITS - width;
        (value << unused).cast_signed() >> unused
    }))
}

pub struct UnsignedInt<const N: u32>(pub u64);

impl<S: ChunkSource, const N: u32> Decode<S> for UnsignedInt<N> {
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>> {
        Ok(read_unsigned(bytes, N)?.map(Self))
    }
}

pub struct SignedInt<const N: u32>(pub i64);

impl<S: ChunkSource, const N: u32> Decode<S> for SignedInt<N> {
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>> {
        Ok(read_signed(bytes, N)?.map(Self))
    }
}

impl<S: ChunkSource> Decode<S> for u32 {
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>> {
        Ok(bytes.decode::<UnsignedInt<32>>()?.map(|i| i.0 as u32))
    }
}

impl<S: ChunkSource> Decode<S> for f32 {
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>> {
        let raw = bytes.take(4)?;
        Ok(<[u8; 4]>::try_from(raw).ok().map(f32::from_le_bytes))
    }
}

impl<S: ChunkSource> Decode<S> for f64 {
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>> {
        let raw = bytes.take(8)?;
        Ok(<[u8; 8]>::try_from(raw).ok().map(f64::from_le_bytes))
    }
}

#[cfg(test)]
mod uleb128_tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(mut value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(byte);
                return out;
            }
            out.push(byte | 0x80);
        }
    }

    #[test]
    fn decode_trailing_zeroes() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0b0000_0011]);
        assert_eq!(3, bytes.decode::<UnsignedInt<8>>()?.unwrap().0);
        let mut bytes = ByteReader::from([0b1000_0011, 0]);
        assert_eq!(3, bytes.decode::<UnsignedInt<8>>()?.unwrap().0);
        assert_eq!(2, bytes.bytes_read());
        Ok(())
    }

    #[test]
    fn stops_at_max_bits() -> anyhow::Result<()> {
        // a one-bit field never reads past its first byte, continuation or not
        let mut bytes = ByteReader::from([0x81, 0x05]);
        assert_eq!(Some(1), read_unsigned(&mut bytes, 1)?);
        assert_eq!(Some(5), read_unsigned(&mut bytes, 1)?);

        let mut bytes = ByteReader::from([0xff, 0xff, 0xff, 0xff, 0x0f, 0x2a]);
        assert_eq!(Some(u64::from(u32::MAX)), read_unsigned(&mut bytes, 32)?);
        assert_eq!(5, bytes.bytes_read());
        Ok(())
    }

    #[test]
    fn truncated_value_is_partial() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0x83, 0x81]);
        assert_eq!(Some(3 | 1 << 7), read_unsigned(&mut bytes, 32)?);
        assert!(bytes.is_finished());

        let mut bytes = ByteReader::from([0u8; 0]);
        assert_eq!(None, read_unsigned(&mut bytes, 32)?);
        Ok(())
    }

    proptest! {
        #[test]
        fn round_trip_u32(value: u32) {
            let mut bytes = ByteReader::from(encode(u64::from(value)));
            prop_assert_eq!(Some(u64::from(value)), read_unsigned(&mut bytes, 32).unwrap());
        }

        #[test]
        fn round_trip_u64(value: u64) {
            let mut bytes = ByteReader::from(encode(value));
            prop_assert_eq!(Some(value), read_unsigned(&mut bytes, 64).unwrap());
        }
    }
}

#[cfg(test)]
mod sleb128_tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(mut value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
            if done {
                out.push(byte);
                return out;
            }
            out.push(byte | 0x80);
        }
    }

    #[test]
    fn decode_trailing_ones() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0b0111_1110]);
        assert_eq!(-2, bytes.decode::<SignedInt<16>>()?.unwrap().0);
        let mut bytes = ByteReader::from([0b1111_1110, 0b0111_1111]);
        assert_eq!(-2, bytes.decode::<SignedInt<16>>()?.unwrap().0);
        let mut bytes = ByteReader::from([0b1111_1110, 0b1111_1111, 0b0111_1111]);
        assert_eq!(-2, bytes.decode::<SignedInt<16>>()?.unwrap().0);
        Ok(())
    }

    #[test]
    fn empty_block_type() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0x40, 0x7f, 0x3f]);
        assert_eq!(Some(-64), read_signed(&mut bytes, 7)?);
        assert_eq!(Some(-1), read_signed(&mut bytes, 7)?);
        assert_eq!(Some(63), read_signed(&mut bytes, 7)?);
        Ok(())
    }

    #[test]
    fn sign_bit_at_max_bits() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(Some(-1), read_signed(&mut bytes, 32)?);
        let mut bytes = ByteReader::from([0x80, 0x80, 0x80, 0x80, 0x78]);
        assert_eq!(Some(i64::from(i32::MIN)), read_signed(&mut bytes, 32)?);
        Ok(())
    }

    #[test]
    fn truncated_value_is_sign_extended() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0xff]);
        assert_eq!(Some(-1), read_signed(&mut bytes, 32)?);
        let mut bytes = ByteReader::from([0x80, 0xbf]);
        assert_eq!(Some(0x3f << 7), read_signed(&mut bytes, 32)?);
        Ok(())
    }

    #[test]
    fn floats_are_little_endian() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from([0x00, 0x00, 0xc0, 0x3f, 0x01]);
        assert_eq!(Some(1.5), bytes.decode::<f32>()?);
        assert_eq!(None, bytes.decode::<f32>()?);

        let mut bytes = ByteReader::from((-0.25f64).to_le_bytes());
        assert_eq!(Some(-0.25), bytes.decode::<f64>()?);
        Ok(())
    }

    proptest! {
        #[test]
        fn round_trip_i32(value: i32) {
            let mut bytes = ByteReader::from(encode(i64::from(value)));
            prop_assert_eq!(Some(i64::from(value)), read_signed(&mut bytes, 32).unwrap());
        }

        #[test]
        fn round_trip_i64(value: i64) {
            let mut bytes = ByteReader::from(encode(value));
            prop_assert_eq!(Some(value), read_signed(&mut bytes, 64).unwrap());
        }
    }
}
