use zerocopy::byteorder::{self, BigEndian, LittleEndian};

/// Byte order of multi-byte numbers (and of string length prefixes).
///
/// Java Edition data is big-endian, which is the default; Bedrock Edition
/// data is little-endian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

#[cfg(feature = "serde")]
impl serde::Serialize for Endianness {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (index, name) = match self {
            Endianness::Big => (0, "Big"),
            Endianness::Little => (1, "Little"),
        };
        serializer.serialize_unit_variant("Endianness", index, name)
    }
}

macro_rules! endian_codec {
    ($($decode:ident, $encode:ident: $ty:ty => $wrapper:ident[$n:literal];)*) => {
        impl Endianness {
            $(
                #[inline]
                pub fn $decode(self, bytes: [u8; $n]) -> $ty {
                    match self {
                        Endianness::Big => byteorder::$wrapper::<BigEndian>::from_bytes(bytes).get(),
                        Endianness::Little => {
                            byteorder::$wrapper::<LittleEndian>::from_bytes(bytes).get()
                        }
                    }
                }

                #[inline]
                pub fn $encode(self, value: $ty) -> [u8; $n] {
                    match self {
                        Endianness::Big => byteorder::$wrapper::<BigEndian>::new(value).to_bytes(),
                        Endianness::Little => {
                            byteorder::$wrapper::<LittleEndian>::new(value).to_bytes()
                        }
                    }
                }
            )*
        }
    };
}

endian_codec! {
    decode_u16, encode_u16: u16 => U16[2];
    decode_i16, encode_i16: i16 => I16[2];
    decode_i32, encode_i32: i32 => I32[4];
    decode_i64, encode_i64: i64 => I64[8];
    decode_f32, encode_f32: f32 => F32[4];
    decode_f64, encode_f64: f64 => F64[8];
}
