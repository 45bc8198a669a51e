//! Whole-tree encoding and decoding on top of the binary primitives.

use std::io::{Read, Write};

use crate::{
    Error, NbtBinaryReader, NbtBinaryWriter, NbtValue, Result, Tag, TagKind,
    binary::array_bytes,
    tag::Payload,
};

/// Deepest container nesting accepted from a stream.
pub(crate) const MAX_DEPTH: usize = 512;

/// Decides per tag whether it is materialized while loading.
pub type Selector<'a> = &'a dyn Fn(&Tag) -> bool;

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::format(format!(
            "containers nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

/// Builds tag trees from a stream, optionally pruned by a selector.
pub(crate) struct TreeReader<'s> {
    selector: Option<Selector<'s>>,
    pub(crate) tags_read: u64,
}

impl<'s> TreeReader<'s> {
    pub(crate) fn new(selector: Option<Selector<'s>>) -> Self {
        Self {
            selector,
            tags_read: 0,
        }
    }

    /// Reads a named root Compound.
    pub(crate) fn read_root<R: Read>(&mut self, r: &mut NbtBinaryReader<R>) -> Result<Tag> {
        let kind = r.read_tag_kind()?;
        if kind != TagKind::Compound {
            return Err(Error::format(format!(
                "root tag must be a TAG_Compound, found {kind}"
            )));
        }
        let root = Tag::named_compound(r.read_string()?);
        self.tags_read += 1;
        self.read_compound_body(r, &root, 1)?;
        Ok(root)
    }

    /// Reads named children into `compound` up to and including its End.
    pub(crate) fn read_compound_body<R: Read>(
        &mut self,
        r: &mut NbtBinaryReader<R>,
        compound: &Tag,
        depth: usize,
    ) -> Result<()> {
        check_depth(depth)?;
        loop {
            let kind = r.read_tag_kind()?;
            if kind == TagKind::End {
                return Ok(());
            }
            let name = r.read_string()?;
            if let Some(child) = self.read_child(r, kind, Some(name), compound, depth)? {
                compound.add(child).map_err(|e| match e {
                    Error::Argument(message) => Error::Format(message),
                    e => e,
                })?;
            }
        }
    }

    /// Reads `len` unnamed elements of `element_kind` into an empty list.
    pub(crate) fn read_list_body<R: Read>(
        &mut self,
        r: &mut NbtBinaryReader<R>,
        list: &Tag,
        element_kind: TagKind,
        len: usize,
        depth: usize,
    ) -> Result<()> {
        check_depth(depth)?;
        if element_kind == TagKind::End && len > 0 {
            return Err(Error::format(format!(
                "list of {len} elements declares element kind TAG_End"
            )));
        }
        list.set_list_kind(Some(element_kind))?;
        for _ in 0..len {
            if let Some(item) = self.read_child(r, element_kind, None, list, depth)? {
                list.add(item)?;
            }
        }
        Ok(())
    }

    fn read_child<R: Read>(
        &mut self,
        r: &mut NbtBinaryReader<R>,
        kind: TagKind,
        name: Option<String>,
        parent: &Tag,
        depth: usize,
    ) -> Result<Option<Tag>> {
        let tag = Tag::empty(kind)?;
        tag.set_name(name.as_deref())?;
        self.tags_read += 1;
        if let Some(selector) = self.selector {
            // Attached provisionally so the selector can see its path.
            tag.set_parent(Some(parent));
            let keep = selector(&tag);
            tag.set_parent(None);
            if !keep {
                self.tags_read += skip_payload(r, kind, depth + 1)?;
                return Ok(None);
            }
        }
        match kind {
            TagKind::Compound => self.read_compound_body(r, &tag, depth + 1)?,
            TagKind::List => {
                let element_kind = r.read_tag_kind()?;
                let len = r.read_length()?;
                self.read_list_body(r, &tag, element_kind, len, depth + 1)?;
            }
            kind => tag.set_value(read_value(r, kind)?)?,
        }
        Ok(Some(tag))
    }
}

/// Reads the payload of a value-bearing tag, length prefix included.
pub(crate) fn read_value<R: Read>(r: &mut NbtBinaryReader<R>, kind: TagKind) -> Result<NbtValue> {
    Ok(match kind {
        TagKind::Byte => NbtValue::Byte(r.read_u8()?),
        TagKind::Short => NbtValue::Short(r.read_i16()?),
        TagKind::Int => NbtValue::Int(r.read_i32()?),
        TagKind::Long => NbtValue::Long(r.read_i64()?),
        TagKind::Float => NbtValue::Float(r.read_f32()?),
        TagKind::Double => NbtValue::Double(r.read_f64()?),
        TagKind::String => NbtValue::String(r.read_string()?),
        TagKind::ByteArray | TagKind::IntArray | TagKind::LongArray => {
            let len = r.read_length()?;
            read_array(r, kind, len)?
        }
        TagKind::End | TagKind::List | TagKind::Compound => {
            return Err(Error::invalid_operation(format!("{kind} carries no value")));
        }
    })
}

/// Reads an array body whose length prefix was already consumed.
pub(crate) fn read_array<R: Read>(
    r: &mut NbtBinaryReader<R>,
    kind: TagKind,
    len: usize,
) -> Result<NbtValue> {
    Ok(match kind {
        TagKind::ByteArray => NbtValue::ByteArray(r.read_bytes(len)?),
        TagKind::IntArray => NbtValue::IntArray(r.read_i32_array(len)?),
        TagKind::LongArray => NbtValue::LongArray(r.read_i64_array(len)?),
        kind => return Err(Error::invalid_operation(format!("{kind} is not an array"))),
    })
}

/// Skips the payload of a tag whose header was consumed. Returns the number
/// of nested tags passed over.
pub(crate) fn skip_payload<R: Read>(
    r: &mut NbtBinaryReader<R>,
    kind: TagKind,
    depth: usize,
) -> Result<u64> {
    match kind {
        TagKind::End => Ok(0),
        TagKind::String => r.skip_string().map(|_| 0),
        TagKind::ByteArray | TagKind::IntArray | TagKind::LongArray => {
            let len = r.read_length()?;
            r.skip(array_bytes(len, kind.element_size())? as u64)?;
            Ok(0)
        }
        TagKind::List => {
            let element_kind = r.read_tag_kind()?;
            let len = r.read_length()?;
            skip_list_body(r, element_kind, len, depth)
        }
        TagKind::Compound => skip_compound_body(r, depth),
        primitive => {
            r.skip(primitive.fixed_size().unwrap_or(0) as u64)?;
            Ok(0)
        }
    }
}

pub(crate) fn skip_list_body<R: Read>(
    r: &mut NbtBinaryReader<R>,
    element_kind: TagKind,
    len: usize,
    depth: usize,
) -> Result<u64> {
    check_depth(depth)?;
    if element_kind == TagKind::End && len > 0 {
        return Err(Error::format(format!(
            "list of {len} elements declares element kind TAG_End"
        )));
    }
    if let Some(size) = element_kind.fixed_size() {
        r.skip(array_bytes(len, size)? as u64)?;
        return Ok(len as u64);
    }
    let mut skipped = 0;
    for _ in 0..len {
        skipped += 1 + skip_payload(r, element_kind, depth + 1)?;
    }
    Ok(skipped)
}

pub(crate) fn skip_compound_body<R: Read>(r: &mut NbtBinaryReader<R>, depth: usize) -> Result<u64> {
    check_depth(depth)?;
    let mut skipped = 0;
    loop {
        let kind = r.read_tag_kind()?;
        if kind == TagKind::End {
            return Ok(skipped);
        }
        r.skip_string()?;
        skipped += 1 + skip_payload(r, kind, depth + 1)?;
    }
}

/// Writes type byte, name (empty when unnamed) and payload.
pub(crate) fn write_named<W: Write>(w: &mut NbtBinaryWriter<W>, tag: &Tag) -> Result<()> {
    let node = tag.node();
    w.write_tag_kind(node.payload.kind())?;
    w.write_string(node.name.as_deref().unwrap_or_default())?;
    write_payload_of(w, &node.payload)
}

/// Writes the payload only, as found inside a list.
pub(crate) fn write_payload<W: Write>(w: &mut NbtBinaryWriter<W>, tag: &Tag) -> Result<()> {
    write_payload_of(w, &tag.node().payload)
}

fn write_payload_of<W: Write>(w: &mut NbtBinaryWriter<W>, payload: &Payload) -> Result<()> {
    match payload {
        Payload::Value(value) => write_value(w, value),
        Payload::List(list) => {
            let kind = match (list.kind, list.items.first()) {
                (_, Some(first)) => first.kind(),
                (Some(kind), None) => kind,
                (None, None) => {
                    return Err(Error::format(
                        "cannot write an empty list whose element kind is unset",
                    ));
                }
            };
            w.write_tag_kind(kind)?;
            w.write_length(list.items.len())?;
            list.items.iter().try_for_each(|item| write_payload(w, item))
        }
        Payload::Compound(map) => {
            for child in map.values() {
                write_named(w, child)?;
            }
            w.write_tag_kind(TagKind::End)
        }
    }
}

pub(crate) fn write_value<W: Write>(w: &mut NbtBinaryWriter<W>, value: &NbtValue) -> Result<()> {
    match value {
        NbtValue::Byte(v) => w.write_u8(*v),
        NbtValue::Short(v) => w.write_i16(*v),
        NbtValue::Int(v) => w.write_i32(*v),
        NbtValue::Long(v) => w.write_i64(*v),
        NbtValue::Float(v) => w.write_f32(*v),
        NbtValue::Double(v) => w.write_f64(*v),
        NbtValue::String(v) => w.write_string(v),
        NbtValue::ByteArray(v) => {
            w.write_length(v.len())?;
            w.write_bytes(v)
        }
        NbtValue::IntArray(v) => {
            w.write_length(v.len())?;
            w.write_i32_slice(v)
        }
        NbtValue::LongArray(v) => {
            w.write_length(v.len())?;
            w.write_i64_slice(v)
        }
    }
}
