use std::fmt::{self, Write};

use super::{Payload, Tag};
use crate::NbtValue;

const DEFAULT_INDENT: &str = "  ";

impl Tag {
    /// Renders the tree in the classic `TAG_Kind("name"): value` layout,
    /// nesting children one `indent` deeper than their container.
    pub fn to_string_indented(&self, indent: &str) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.pretty(&mut out, indent, 0);
        out
    }

    fn pretty(&self, out: &mut impl Write, indent: &str, level: usize) -> fmt::Result {
        for _ in 0..level {
            out.write_str(indent)?;
        }
        let node = self.node();
        out.write_str(node.payload.kind().display_name())?;
        if let Some(name) = node.name.as_deref().filter(|name| !name.is_empty()) {
            write!(out, "(\"{name}\")")?;
        }
        out.write_str(": ")?;
        match &node.payload {
            Payload::Value(value) => write_value(out, value),
            Payload::List(list) => {
                let kind = list.kind.map_or("unset", |kind| kind.display_name());
                writeln!(out, "{} entries of {kind} {{", list.items.len())?;
                for item in &list.items {
                    item.pretty(out, indent, level + 1)?;
                    out.write_char('\n')?;
                }
                close(out, indent, level)
            }
            Payload::Compound(map) => {
                writeln!(out, "{} entries {{", map.len())?;
                let mut names: Vec<&String> = map.keys().collect();
                names.sort();
                for name in names {
                    map[name].pretty(out, indent, level + 1)?;
                    out.write_char('\n')?;
                }
                close(out, indent, level)
            }
        }
    }
}

fn write_value(out: &mut impl Write, value: &NbtValue) -> fmt::Result {
    match value {
        NbtValue::Byte(v) => write!(out, "{v}"),
        NbtValue::Short(v) => write!(out, "{v}"),
        NbtValue::Int(v) => write!(out, "{v}"),
        NbtValue::Long(v) => write!(out, "{v}"),
        NbtValue::Float(v) => write!(out, "{v}"),
        NbtValue::Double(v) => write!(out, "{v}"),
        NbtValue::String(v) => write!(out, "{v:?}"),
        NbtValue::ByteArray(v) => write!(out, "[{} bytes]", v.len()),
        NbtValue::IntArray(v) => write!(out, "[{} ints]", v.len()),
        NbtValue::LongArray(v) => write!(out, "[{} longs]", v.len()),
    }
}

fn close(out: &mut impl Write, indent: &str, level: usize) -> fmt::Result {
    for _ in 0..level {
        out.write_str(indent)?;
    }
    out.write_char('}')
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pretty(f, DEFAULT_INDENT, 0)
    }
}
