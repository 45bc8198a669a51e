//! Forward-only construction of an NBT stream without building a tree.
//!
//! [`NbtWriter`] checks every call against the structure written so far:
//! names only inside compounds, declared list kinds and lengths, and
//! balanced begin/end pairs. Violations are reported as format errors.
//!
//! ```
//! use nbt_tree::{NbtWriter, TagKind};
//!
//! let mut writer = NbtWriter::new(Vec::new(), "root").unwrap();
//! writer.write_int(Some("answer"), 42).unwrap();
//! writer.begin_list(Some("scores"), TagKind::Short, 2).unwrap();
//! writer.write_short(None, 7).unwrap();
//! writer.write_short(None, 9).unwrap();
//! writer.end_list().unwrap();
//! writer.end_compound().unwrap();
//! writer.finish().unwrap();
//!
//! let bytes = writer.into_inner();
//! assert_eq!(bytes[0], 0x0A);
//! ```

use std::io::{Read, Write};

use crate::{Endianness, Error, NbtBinaryWriter, Result, Tag, TagKind, codec};

/// Staging buffer used when copying byte arrays from a reader.
const COPY_BUFFER_SIZE: usize = 8 * 1024;

struct Frame {
    parent_kind: TagKind,
    list_kind: Option<TagKind>,
    list_size: usize,
    list_index: usize,
}

/// Writes one tag at a time, enforcing the nesting rules of the format.
pub struct NbtWriter<W: Write> {
    writer: NbtBinaryWriter<W>,
    parent_kind: TagKind,
    list_kind: Option<TagKind>,
    list_size: usize,
    list_index: usize,
    frames: Vec<Frame>,
    done: bool,
}

impl<W: Write> NbtWriter<W> {
    /// Starts a big-endian document and writes the root compound header.
    pub fn new(inner: W, root_name: &str) -> Result<Self> {
        Self::with_endianness(inner, root_name, Endianness::Big)
    }

    pub fn with_endianness(inner: W, root_name: &str, endianness: Endianness) -> Result<Self> {
        let mut writer = NbtBinaryWriter::new(inner, endianness);
        writer.write_tag_kind(TagKind::Compound)?;
        writer.write_string(root_name)?;
        Ok(Self {
            writer,
            parent_kind: TagKind::Compound,
            list_kind: None,
            list_size: 0,
            list_index: 0,
            frames: Vec::new(),
            done: false,
        })
    }

    /// `true` once the root compound has been closed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.position()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    pub fn begin_compound(&mut self, name: Option<&str>) -> Result<()> {
        self.enforce_constraints(name, TagKind::Compound)?;
        self.write_header(name, TagKind::Compound)?;
        self.go_down(TagKind::Compound);
        Ok(())
    }

    /// Closes the innermost compound; closing the root finishes the
    /// document.
    pub fn end_compound(&mut self) -> Result<()> {
        if self.done || self.parent_kind != TagKind::Compound {
            return Err(Error::format("not currently in a compound"));
        }
        self.go_up();
        self.writer.write_tag_kind(TagKind::End)
    }

    /// Opens a list of exactly `length` elements of `element_kind`.
    ///
    /// A non-empty list of `TAG_End` and a length beyond `i32::MAX` are
    /// format errors.
    pub fn begin_list(
        &mut self,
        name: Option<&str>,
        element_kind: TagKind,
        length: usize,
    ) -> Result<()> {
        if element_kind == TagKind::End && length > 0 {
            return Err(Error::format(
                "only empty lists may have element kind TAG_End",
            ));
        }
        if i32::try_from(length).is_err() {
            return Err(Error::format(format!("list length {length} does not fit in an i32")));
        }
        self.enforce_constraints(name, TagKind::List)?;
        self.write_header(name, TagKind::List)?;
        self.go_down(TagKind::List);
        self.list_kind = Some(element_kind);
        self.list_size = length;
        self.writer.write_tag_kind(element_kind)?;
        self.writer.write_length(length)
    }

    pub fn end_list(&mut self) -> Result<()> {
        if self.done || self.parent_kind != TagKind::List {
            return Err(Error::format("not currently in a list"));
        }
        if self.list_index < self.list_size {
            return Err(Error::format(format!(
                "cannot end list: {} of {} declared elements written",
                self.list_index, self.list_size
            )));
        }
        self.go_up();
        Ok(())
    }

    pub fn write_byte(&mut self, name: Option<&str>, value: u8) -> Result<()> {
        self.scalar_header(name, TagKind::Byte)?;
        self.writer.write_u8(value)
    }

    pub fn write_short(&mut self, name: Option<&str>, value: i16) -> Result<()> {
        self.scalar_header(name, TagKind::Short)?;
        self.writer.write_i16(value)
    }

    pub fn write_int(&mut self, name: Option<&str>, value: i32) -> Result<()> {
        self.scalar_header(name, TagKind::Int)?;
        self.writer.write_i32(value)
    }

    pub fn write_long(&mut self, name: Option<&str>, value: i64) -> Result<()> {
        self.scalar_header(name, TagKind::Long)?;
        self.writer.write_i64(value)
    }

    pub fn write_float(&mut self, name: Option<&str>, value: f32) -> Result<()> {
        self.scalar_header(name, TagKind::Float)?;
        self.writer.write_f32(value)
    }

    pub fn write_double(&mut self, name: Option<&str>, value: f64) -> Result<()> {
        self.scalar_header(name, TagKind::Double)?;
        self.writer.write_f64(value)
    }

    pub fn write_string(&mut self, name: Option<&str>, value: &str) -> Result<()> {
        self.scalar_header(name, TagKind::String)?;
        self.writer.write_string(value)
    }

    pub fn write_byte_array(&mut self, name: Option<&str>, value: &[u8]) -> Result<()> {
        self.scalar_header(name, TagKind::ByteArray)?;
        self.writer.write_length(value.len())?;
        self.writer.write_bytes(value)
    }

    pub fn write_int_array(&mut self, name: Option<&str>, value: &[i32]) -> Result<()> {
        self.scalar_header(name, TagKind::IntArray)?;
        self.writer.write_length(value.len())?;
        self.writer.write_i32_slice(value)
    }

    pub fn write_long_array(&mut self, name: Option<&str>, value: &[i64]) -> Result<()> {
        self.scalar_header(name, TagKind::LongArray)?;
        self.writer.write_length(value.len())?;
        self.writer.write_i64_slice(value)
    }

    /// Writes a byte array of exactly `count` bytes taken from `source`.
    pub fn write_byte_array_from_reader<S: Read + ?Sized>(
        &mut self,
        name: Option<&str>,
        source: &mut S,
        count: usize,
    ) -> Result<()> {
        let mut buffer = vec![0u8; count.clamp(1, COPY_BUFFER_SIZE)];
        self.write_byte_array_from_reader_with_buffer(name, source, count, &mut buffer)
    }

    /// Like [`write_byte_array_from_reader`](NbtWriter::write_byte_array_from_reader),
    /// staging the copy through a caller-provided buffer.
    pub fn write_byte_array_from_reader_with_buffer<S: Read + ?Sized>(
        &mut self,
        name: Option<&str>,
        source: &mut S,
        count: usize,
        buffer: &mut [u8],
    ) -> Result<()> {
        if buffer.is_empty() && count > 0 {
            return Err(Error::argument("copy buffer must not be empty"));
        }
        self.scalar_header(name, TagKind::ByteArray)?;
        self.writer.write_length(count)?;
        self.writer.write_from_reader(source, count, buffer)
    }

    /// Writes a whole tag tree. Inside a compound the tag must be named,
    /// inside a list it must be unnamed.
    pub fn write_tag(&mut self, tag: &Tag) -> Result<()> {
        let name = tag.name();
        self.enforce_constraints(name.as_deref(), tag.kind())?;
        if name.is_some() {
            codec::write_named(&mut self.writer, tag)
        } else {
            codec::write_payload(&mut self.writer, tag)
        }
    }

    /// Verifies the root compound was closed and flushes the sink.
    pub fn finish(&mut self) -> Result<()> {
        if !self.done {
            return Err(Error::format(
                "cannot finish: the root compound has not been closed",
            ));
        }
        self.writer.flush()
    }

    fn scalar_header(&mut self, name: Option<&str>, kind: TagKind) -> Result<()> {
        self.enforce_constraints(name, kind)?;
        self.write_header(name, kind)
    }

    fn write_header(&mut self, name: Option<&str>, kind: TagKind) -> Result<()> {
        if let Some(name) = name {
            self.writer.write_tag_kind(kind)?;
            self.writer.write_string(name)?;
        }
        Ok(())
    }

    fn enforce_constraints(&mut self, name: Option<&str>, kind: TagKind) -> Result<()> {
        if self.done {
            return Err(Error::format(
                "cannot write any more tags: the root compound has been closed",
            ));
        }
        if self.parent_kind == TagKind::List {
            if name.is_some() {
                return Err(Error::format("expecting an unnamed tag inside a list"));
            }
            let expected = self.list_kind.unwrap_or(TagKind::End);
            if expected != kind {
                return Err(Error::TagMismatch {
                    expected,
                    found: kind,
                });
            }
            if self.list_index >= self.list_size {
                return Err(Error::format(format!(
                    "list of {} elements is already full",
                    self.list_size
                )));
            }
            self.list_index += 1;
        } else if name.is_none() {
            return Err(Error::format("expecting a named tag inside a compound"));
        }
        Ok(())
    }

    fn go_down(&mut self, kind: TagKind) {
        self.frames.push(Frame {
            parent_kind: self.parent_kind,
            list_kind: self.list_kind,
            list_size: self.list_size,
            list_index: self.list_index,
        });
        self.parent_kind = kind;
        self.list_kind = None;
        self.list_size = 0;
        self.list_index = 0;
    }

    fn go_up(&mut self) {
        match self.frames.pop() {
            Some(frame) => {
                self.parent_kind = frame.parent_kind;
                self.list_kind = frame.list_kind;
                self.list_size = frame.list_size;
                self.list_index = frame.list_index;
            }
            None => self.done = true,
        }
    }
}
