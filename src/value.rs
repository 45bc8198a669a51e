use crate::{Error, Result, TagKind};

/// The payload of a value-bearing tag.
///
/// Lists and compounds are not values: they are containers of other tags
/// and live in [`Tag`](crate::Tag) itself.
#[derive(Clone, Debug, PartialEq)]
pub enum NbtValue {
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn kind(&self) -> TagKind {
        match self {
            NbtValue::Byte(_) => TagKind::Byte,
            NbtValue::Short(_) => TagKind::Short,
            NbtValue::Int(_) => TagKind::Int,
            NbtValue::Long(_) => TagKind::Long,
            NbtValue::Float(_) => TagKind::Float,
            NbtValue::Double(_) => TagKind::Double,
            NbtValue::ByteArray(_) => TagKind::ByteArray,
            NbtValue::String(_) => TagKind::String,
            NbtValue::IntArray(_) => TagKind::IntArray,
            NbtValue::LongArray(_) => TagKind::LongArray,
        }
    }

    /// The zero value of `kind`, or `None` if `kind` carries no value.
    pub fn default_for(kind: TagKind) -> Option<NbtValue> {
        Some(match kind {
            TagKind::Byte => NbtValue::Byte(0),
            TagKind::Short => NbtValue::Short(0),
            TagKind::Int => NbtValue::Int(0),
            TagKind::Long => NbtValue::Long(0),
            TagKind::Float => NbtValue::Float(0.0),
            TagKind::Double => NbtValue::Double(0.0),
            TagKind::ByteArray => NbtValue::ByteArray(Vec::new()),
            TagKind::String => NbtValue::String(String::new()),
            TagKind::IntArray => NbtValue::IntArray(Vec::new()),
            TagKind::LongArray => NbtValue::LongArray(Vec::new()),
            TagKind::End | TagKind::List | TagKind::Compound => return None,
        })
    }

    /// Converts into `T`, applying the widening rules of [`FromNbtValue`].
    #[inline]
    pub fn convert<T: FromNbtValue>(self) -> Result<T> {
        T::from_nbt_value(self)
    }

    fn cast_error<T: FromNbtValue>(&self) -> Error {
        Error::InvalidCast {
            from: self.kind(),
            to: T::TYPE_NAME,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for NbtValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    NbtValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value!(
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<u8> => ByteArray,
    String => String,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
);

impl From<i8> for NbtValue {
    #[inline]
    fn from(value: i8) -> Self {
        NbtValue::Byte(value as u8)
    }
}

impl From<bool> for NbtValue {
    #[inline]
    fn from(value: bool) -> Self {
        NbtValue::Byte(value as u8)
    }
}

impl From<&str> for NbtValue {
    #[inline]
    fn from(value: &str) -> Self {
        NbtValue::String(value.to_owned())
    }
}

impl From<&[u8]> for NbtValue {
    #[inline]
    fn from(value: &[u8]) -> Self {
        NbtValue::ByteArray(value.to_vec())
    }
}

impl From<&[i32]> for NbtValue {
    #[inline]
    fn from(value: &[i32]) -> Self {
        NbtValue::IntArray(value.to_vec())
    }
}

impl From<&[i64]> for NbtValue {
    #[inline]
    fn from(value: &[i64]) -> Self {
        NbtValue::LongArray(value.to_vec())
    }
}

/// Conversion out of an [`NbtValue`].
///
/// Numeric conversions only widen: a Byte can be read as any integer or
/// float type, an Int as `i32`, `i64`, `f32` or `f64`, but a Long is never
/// narrowed to `i32`. `String` accepts every scalar and renders it.
pub trait FromNbtValue: Sized {
    /// Name used in [`Error::InvalidCast`].
    const TYPE_NAME: &'static str;

    /// Whether values of `kind` convert into `Self`.
    fn accepts(kind: TagKind) -> bool;

    fn from_nbt_value(value: NbtValue) -> Result<Self>;
}

macro_rules! impl_from_nbt_value_integer {
    ($($ty:ty: $($variant:ident),+;)*) => {
        $(
            impl FromNbtValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn accepts(kind: TagKind) -> bool {
                    matches!(kind, $(TagKind::$variant)|+)
                }

                fn from_nbt_value(value: NbtValue) -> Result<Self> {
                    match value {
                        $(NbtValue::$variant(v) => Ok(v as $ty),)+
                        other => Err(other.cast_error::<Self>()),
                    }
                }
            }
        )*
    };
}

impl_from_nbt_value_integer! {
    u8: Byte;
    i8: Byte;
    i16: Byte, Short;
    i32: Byte, Short, Int;
    i64: Byte, Short, Int, Long;
    f32: Byte, Short, Int, Long, Float;
    f64: Byte, Short, Int, Long, Float, Double;
}

impl FromNbtValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn accepts(kind: TagKind) -> bool {
        kind == TagKind::Byte
    }

    fn from_nbt_value(value: NbtValue) -> Result<Self> {
        match value {
            NbtValue::Byte(v) => Ok(v != 0),
            other => Err(other.cast_error::<Self>()),
        }
    }
}

impl FromNbtValue for String {
    const TYPE_NAME: &'static str = "String";

    fn accepts(kind: TagKind) -> bool {
        kind.is_primitive() || kind == TagKind::String
    }

    fn from_nbt_value(value: NbtValue) -> Result<Self> {
        Ok(match value {
            NbtValue::Byte(v) => v.to_string(),
            NbtValue::Short(v) => v.to_string(),
            NbtValue::Int(v) => v.to_string(),
            NbtValue::Long(v) => v.to_string(),
            NbtValue::Float(v) => v.to_string(),
            NbtValue::Double(v) => v.to_string(),
            NbtValue::String(v) => v,
            other => return Err(other.cast_error::<Self>()),
        })
    }
}

macro_rules! impl_from_nbt_value_array {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromNbtValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn accepts(kind: TagKind) -> bool {
                    kind == TagKind::$variant
                }

                fn from_nbt_value(value: NbtValue) -> Result<Self> {
                    match value {
                        NbtValue::$variant(v) => Ok(v),
                        other => Err(other.cast_error::<Self>()),
                    }
                }
            }
        )*
    };
}

impl_from_nbt_value_array!(
    Vec<u8> => ByteArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
);

impl FromNbtValue for NbtValue {
    const TYPE_NAME: &'static str = "NbtValue";

    fn accepts(kind: TagKind) -> bool {
        kind.has_value()
    }

    #[inline]
    fn from_nbt_value(value: NbtValue) -> Result<Self> {
        Ok(value)
    }
}
