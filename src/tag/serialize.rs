use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

use super::{Payload, Tag};
use crate::{NbtValue, TagKind};

/// Serializes the payload only: compounds become maps keyed by child name,
/// lists and int/long arrays become sequences, byte arrays become bytes.
/// The tag's own name is not part of the output.
impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.node().payload {
            Payload::Value(value) => value.serialize(serializer),
            Payload::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.items.len()))?;
                for item in &list.items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Payload::Compound(map) => {
                let mut names: Vec<&String> = map.keys().collect();
                names.sort();
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for name in names {
                    out.serialize_entry(name, &map[name])?;
                }
                out.end()
            }
        }
    }
}

impl Serialize for NbtValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NbtValue::Byte(v) => serializer.serialize_u8(*v),
            NbtValue::Short(v) => serializer.serialize_i16(*v),
            NbtValue::Int(v) => serializer.serialize_i32(*v),
            NbtValue::Long(v) => serializer.serialize_i64(*v),
            NbtValue::Float(v) => serializer.serialize_f32(*v),
            NbtValue::Double(v) => serializer.serialize_f64(*v),
            NbtValue::ByteArray(v) => serializer.serialize_bytes(v),
            NbtValue::String(v) => serializer.serialize_str(v),
            NbtValue::IntArray(v) => v.serialize(serializer),
            NbtValue::LongArray(v) => v.serialize(serializer),
        }
    }
}

impl Serialize for TagKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}
