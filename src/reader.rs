//! Forward-only, pull-style access to an NBT stream.
//!
//! [`NbtReader`] walks the tags of a document one at a time without
//! building a tree. At any point the current tag can be skipped at the byte
//! level, read as a value, or materialized into a [`Tag`].
//!
//! ```
//! use nbt_tree::{NbtFile, NbtReader, Tag};
//!
//! let root = Tag::named_compound("level");
//! root.add(Tag::named("seed", 42i64)).unwrap();
//! let bytes = NbtFile::with_root(root)
//!     .unwrap()
//!     .save_to_buffer(nbt_tree::Compression::None)
//!     .unwrap();
//!
//! let mut reader = NbtReader::new(&bytes[..]);
//! assert!(reader.read_to_following(Some("seed")).unwrap());
//! assert_eq!(reader.read_value_as::<i64>().unwrap(), 42);
//! ```

use std::io::Read;

use tracing::trace;

use crate::{
    Endianness, Error, FromNbtValue, NbtBinaryReader, NbtValue, Result, Tag, TagKind,
    binary::array_bytes,
    codec::{self, TreeReader},
};

/// Where the reader is relative to the tag structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    StreamBeginning,
    CompoundBeginning,
    InCompound,
    CompoundEnd,
    ListBeginning,
    InList,
    StreamEnd,
    Errored,
}

/// Coarse, public view of the reader's progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// Nothing has been read yet.
    Fresh,
    /// Positioned on a tag (or a visible End marker).
    Positioned,
    /// The root compound has been fully consumed.
    AtEndOfStream,
    /// A format or stream error occurred; every further call fails with
    /// [`Error::InvalidReaderState`].
    Errored,
}

/// Saved context of an enclosing container.
struct Frame {
    parent_name: Option<String>,
    parent_kind: Option<TagKind>,
    parent_length: usize,
    list_index: usize,
    list_kind: Option<TagKind>,
    element_kind: Option<TagKind>,
}

/// A forward-only reader positioned on one tag at a time.
pub struct NbtReader<R> {
    reader: NbtBinaryReader<R>,
    cursor: Cursor,
    frames: Vec<Frame>,

    tag_kind: Option<TagKind>,
    tag_name: Option<String>,
    tag_length: usize,
    list_kind: Option<TagKind>,
    tag_start_offset: u64,

    parent_name: Option<String>,
    parent_kind: Option<TagKind>,
    parent_length: usize,
    /// Elements of the enclosing list entered so far.
    list_index: usize,
    /// Element kind of the enclosing list.
    element_kind: Option<TagKind>,

    depth: usize,
    tags_read: u64,
    at_value: bool,
    value_cache: Option<NbtValue>,
    root_name: Option<String>,

    skip_end_tags: bool,
    cache_tag_values: bool,
    selector: Option<Box<dyn Fn(&Tag) -> bool>>,
}

impl<R: Read> NbtReader<R> {
    /// Creates a big-endian reader positioned before the root tag.
    pub fn new(inner: R) -> Self {
        Self::with_endianness(inner, Endianness::Big)
    }

    pub fn with_endianness(inner: R, endianness: Endianness) -> Self {
        Self {
            reader: NbtBinaryReader::new(inner, endianness),
            cursor: Cursor::StreamBeginning,
            frames: Vec::new(),
            tag_kind: None,
            tag_name: None,
            tag_length: 0,
            list_kind: None,
            tag_start_offset: 0,
            parent_name: None,
            parent_kind: None,
            parent_length: 0,
            list_index: 0,
            element_kind: None,
            depth: 0,
            tags_read: 0,
            at_value: false,
            value_cache: None,
            root_name: None,
            skip_end_tags: true,
            cache_tag_values: false,
            selector: None,
        }
    }

    // ---- properties ----

    pub fn state(&self) -> ReaderState {
        match self.cursor {
            Cursor::StreamBeginning => ReaderState::Fresh,
            Cursor::StreamEnd => ReaderState::AtEndOfStream,
            Cursor::Errored => ReaderState::Errored,
            _ => ReaderState::Positioned,
        }
    }

    pub fn is_at_stream_end(&self) -> bool {
        self.cursor == Cursor::StreamEnd
    }

    pub fn is_in_error_state(&self) -> bool {
        self.cursor == Cursor::Errored
    }

    pub fn tag_kind(&self) -> Option<TagKind> {
        self.tag_kind
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Element kind of the current tag if it is a list.
    pub fn list_kind(&self) -> Option<TagKind> {
        match self.tag_kind {
            Some(TagKind::List) => self.list_kind,
            _ => None,
        }
    }

    /// Whether the current tag kind carries a value.
    pub fn has_value(&self) -> bool {
        self.tag_kind.is_some_and(TagKind::has_value)
    }

    pub fn has_name(&self) -> bool {
        self.tag_name.is_some()
    }

    /// Whether the current tag is an array or a list.
    pub fn has_length(&self) -> bool {
        self.tag_kind
            .is_some_and(|kind| kind.is_array() || kind == TagKind::List)
    }

    /// Element count of the current array or list.
    pub fn tag_length(&self) -> usize {
        self.tag_length
    }

    pub fn is_compound(&self) -> bool {
        self.tag_kind == Some(TagKind::Compound)
    }

    pub fn is_list(&self) -> bool {
        self.tag_kind == Some(TagKind::List)
    }

    pub fn is_list_element(&self) -> bool {
        self.parent_kind == Some(TagKind::List)
    }

    /// Position of the current tag inside its enclosing list.
    pub fn list_index(&self) -> Option<usize> {
        if self.is_list_element() {
            self.list_index.checked_sub(1)
        } else {
            None
        }
    }

    /// Nesting depth of the current tag; the root is at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    pub fn parent_kind(&self) -> Option<TagKind> {
        self.parent_kind
    }

    pub fn parent_tag_length(&self) -> usize {
        self.parent_length
    }

    /// Number of tags passed so far, skipped or not.
    pub fn tags_read(&self) -> u64 {
        self.tags_read
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    /// Offset of the current tag's first byte, counted in bytes consumed
    /// from the underlying stream.
    pub fn tag_start_offset(&self) -> u64 {
        self.tag_start_offset
    }

    /// Bytes consumed from the underlying stream.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn endianness(&self) -> Endianness {
        self.reader.endianness()
    }

    pub fn skip_end_tags(&self) -> bool {
        self.skip_end_tags
    }

    /// When `false`, the End marker of each compound is reported as a tag.
    /// Defaults to `true`.
    pub fn set_skip_end_tags(&mut self, skip: bool) {
        self.skip_end_tags = skip;
    }

    pub fn cache_tag_values(&self) -> bool {
        self.cache_tag_values
    }

    /// When `true`, the value of the current tag may be read repeatedly.
    pub fn set_cache_tag_values(&mut self, cache: bool) {
        self.cache_tag_values = cache;
    }

    /// Prunes the trees built by [`NbtReader::read_as_tag`].
    pub fn set_selector(&mut self, selector: impl Fn(&Tag) -> bool + 'static) {
        self.selector = Some(Box::new(selector));
    }

    pub fn clear_selector(&mut self) {
        self.selector = None;
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    // ---- navigation ----

    /// Moves to the next tag in document order, descending into containers.
    /// With a name, keeps going until a tag of that name is found.
    ///
    /// Returns `false` once the end of the stream is reached.
    pub fn read_to_following(&mut self, name: Option<&str>) -> Result<bool> {
        self.guarded(|r| {
            while r.advance(None)? {
                if name.is_none() || r.tag_name.as_deref() == name {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Searches the subtree of the current tag for a descendant called
    /// `name`.
    ///
    /// Returns `false` when the subtree is exhausted; the reader then stays
    /// at the end of that subtree rather than moving past it. For a compound
    /// that is its End marker: [`tag_kind`](Self::tag_kind) reports
    /// [`TagKind::End`] and [`tag_name`](Self::tag_name) is `None`. For a
    /// list it is the last element, or the list itself when it is empty. On a
    /// value tag nothing moves.
    pub fn read_to_descendant(&mut self, name: &str) -> Result<bool> {
        self.guarded(|r| {
            match r.cursor {
                Cursor::StreamBeginning => {
                    if !r.advance(None)? {
                        return Ok(false);
                    }
                }
                Cursor::CompoundBeginning | Cursor::ListBeginning => {}
                _ => return Ok(false),
            }
            let floor = r.depth + 1;
            while r.advance(Some(floor))? {
                if r.tag_name.as_deref() == Some(name) {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Skips the rest of the current tag and moves to its next sibling,
    /// optionally the next sibling called `name`.
    ///
    /// Returns `false` and stays at the end of the parent when there is no
    /// such sibling. A fresh reader moves to the root tag.
    pub fn read_to_next_sibling(&mut self, name: Option<&str>) -> Result<bool> {
        self.guarded(|r| {
            if r.cursor == Cursor::StreamBeginning {
                return r.advance(None);
            }
            let depth = r.depth;
            loop {
                r.skip_current()?;
                if !r.advance(Some(depth))? || r.tag_kind == Some(TagKind::End) {
                    return Ok(false);
                }
                if name.is_none() || r.tag_name.as_deref() == name {
                    return Ok(true);
                }
            }
        })
    }

    /// Skips the current tag, including its whole subtree, without
    /// decoding it. Returns the number of tags skipped; `0` when there is
    /// nothing left to skip.
    pub fn skip(&mut self) -> Result<u64> {
        self.guarded(|r| {
            if r.cursor == Cursor::StreamBeginning && !r.advance(None)? {
                return Ok(0);
            }
            r.skip_current()
        })
    }

    /// Materializes the current tag, with its subtree, into a detached
    /// [`Tag`] and moves on to the tag that follows it in document order.
    /// Repeated calls therefore walk siblings.
    ///
    /// Fails with [`Error::EndOfStream`] once the stream is exhausted; the
    /// reader stays at the end of the stream.
    pub fn read_as_tag(&mut self) -> Result<Tag> {
        if self.cursor == Cursor::StreamEnd {
            return Err(Error::EndOfStream);
        }
        self.guarded(Self::materialize)?.ok_or(Error::EndOfStream)
    }

    fn materialize(&mut self) -> Result<Option<Tag>> {
        while matches!(self.cursor, Cursor::StreamBeginning | Cursor::CompoundEnd) {
            if !self.advance(None)? {
                return Ok(None);
            }
        }
        let tag = match self.cursor {
            Cursor::StreamEnd => return Ok(None),
            Cursor::CompoundBeginning => {
                let tag = Tag::compound();
                tag.set_name(self.tag_name.as_deref())?;
                let mut tree = TreeReader::new(self.selector.as_deref());
                tree.read_compound_body(&mut self.reader, &tag, self.depth)?;
                self.tags_read += tree.tags_read;
                self.finish_container();
                tag
            }
            Cursor::ListBeginning => {
                let tag = Tag::list(None);
                tag.set_name(self.tag_name.as_deref())?;
                let element_kind = self.list_kind.unwrap_or(TagKind::End);
                let mut tree = TreeReader::new(self.selector.as_deref());
                tree.read_list_body(&mut self.reader, &tag, element_kind, self.tag_length, self.depth)?;
                self.tags_read += tree.tags_read;
                self.finish_container();
                tag
            }
            _ => {
                let value = self.take_value()?;
                Tag::from_value(self.tag_name.clone(), value)
            }
        };
        self.advance(None)?;
        Ok(Some(tag))
    }

    /// Reads the value of the current tag.
    ///
    /// A value can be read once, unless [`set_cache_tag_values`] is on.
    /// Fails with [`Error::InvalidOperation`] on containers.
    ///
    /// [`set_cache_tag_values`]: NbtReader::set_cache_tag_values
    pub fn read_value(&mut self) -> Result<NbtValue> {
        self.guarded(Self::take_value)
    }

    /// Reads the value of the current tag converted to `T`. The kind is
    /// checked before anything is consumed.
    pub fn read_value_as<T: FromNbtValue>(&mut self) -> Result<T> {
        if self.cursor == Cursor::Errored {
            return Err(Error::InvalidReaderState);
        }
        if let Some(kind) = self.tag_kind.filter(|kind| kind.has_value()) {
            if !T::accepts(kind) {
                return Err(Error::InvalidCast {
                    from: kind,
                    to: T::TYPE_NAME,
                });
            }
        }
        self.read_value()?.convert()
    }

    /// Reads every element of the current list, which must hold primitive,
    /// string or array values convertible to `T`.
    ///
    /// Afterwards the reader sits on the list's last element.
    pub fn read_list_as_array<T: FromNbtValue>(&mut self) -> Result<Vec<T>> {
        if self.cursor == Cursor::StreamEnd {
            return Err(Error::EndOfStream);
        }
        self.guarded(|r| {
            if r.cursor != Cursor::ListBeginning {
                return Err(Error::invalid_operation(
                    "read_list_as_array may only be used on List tags",
                ));
            }
            let element_kind = r.list_kind.unwrap_or(TagKind::End);
            if element_kind.is_composite() {
                return Err(Error::invalid_operation(format!(
                    "read_list_as_array cannot read lists of {element_kind}"
                )));
            }
            if element_kind != TagKind::End && !T::accepts(element_kind) {
                return Err(Error::InvalidCast {
                    from: element_kind,
                    to: T::TYPE_NAME,
                });
            }
            let len = r.tag_length;
            r.go_down();
            r.element_kind = Some(element_kind);
            r.cursor = Cursor::InList;
            let mut values = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                values.push(codec::read_value(&mut r.reader, element_kind)?.convert()?);
            }
            r.list_index = len;
            r.tags_read += len as u64;
            r.tag_kind = Some(element_kind);
            r.tag_name = None;
            r.at_value = false;
            Ok(values)
        })
    }

    // ---- internals ----

    /// Runs `op` unless the reader is errored; latches stream-corrupting
    /// failures.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.cursor == Cursor::Errored {
            return Err(Error::InvalidReaderState);
        }
        let result = op(self);
        if let Err(error) = &result {
            if error.corrupts_stream() {
                trace!(%error, offset = self.reader.position(), "NBT reader entered the errored state");
                self.cursor = Cursor::Errored;
            }
        }
        result
    }

    /// Moves to the next tag. With a `floor`, refuses to leave a container
    /// whose children sit at that depth and returns `false` instead.
    fn advance(&mut self, floor: Option<usize>) -> Result<bool> {
        loop {
            match self.cursor {
                Cursor::StreamBeginning => {
                    self.tag_start_offset = self.reader.position();
                    let kind = self.reader.read_tag_kind()?;
                    if kind != TagKind::Compound {
                        return Err(Error::format(format!(
                            "stream must start with a TAG_Compound, found {kind}"
                        )));
                    }
                    self.depth = 1;
                    self.tag_kind = Some(kind);
                    self.read_tag_header(true)?;
                    self.root_name = self.tag_name.clone();
                    return Ok(true);
                }
                Cursor::CompoundBeginning => {
                    self.go_down();
                    self.element_kind = None;
                    self.cursor = Cursor::InCompound;
                }
                Cursor::ListBeginning => {
                    let element_kind = self.list_kind;
                    self.go_down();
                    self.element_kind = element_kind;
                    self.cursor = Cursor::InList;
                }
                Cursor::InCompound => {
                    if self.at_value {
                        self.skip_value()?;
                    }
                    self.tag_start_offset = self.reader.position();
                    let kind = self.reader.read_tag_kind()?;
                    self.tag_kind = Some(kind);
                    if kind != TagKind::End {
                        self.read_tag_header(true)?;
                        return Ok(true);
                    }
                    self.tag_name = None;
                    self.tag_length = 0;
                    self.list_kind = None;
                    self.value_cache = None;
                    self.cursor = Cursor::CompoundEnd;
                    if !self.skip_end_tags {
                        self.tags_read += 1;
                        return Ok(true);
                    }
                }
                Cursor::InList => {
                    if self.at_value {
                        self.skip_value()?;
                    }
                    if self.list_index < self.parent_length {
                        self.list_index += 1;
                        self.tag_start_offset = self.reader.position();
                        self.tag_kind = self.element_kind;
                        self.read_tag_header(false)?;
                        return Ok(true);
                    }
                    if floor == Some(self.depth) {
                        return Ok(false);
                    }
                    self.leave_container()?;
                }
                Cursor::CompoundEnd => {
                    if floor == Some(self.depth) {
                        return Ok(false);
                    }
                    self.leave_container()?;
                }
                Cursor::StreamEnd => return Ok(false),
                Cursor::Errored => return Err(Error::InvalidReaderState),
            }
        }
    }

    /// Reads what follows the type byte: the name (if any) and, for arrays
    /// and lists, the length header.
    fn read_tag_header(&mut self, named: bool) -> Result<()> {
        self.tags_read += 1;
        self.tag_name = if named {
            Some(self.reader.read_string()?)
        } else {
            None
        };
        self.value_cache = None;
        self.tag_length = 0;
        self.list_kind = None;
        self.at_value = false;
        match self.tag_kind {
            Some(TagKind::ByteArray | TagKind::IntArray | TagKind::LongArray) => {
                self.tag_length = self.reader.read_length()?;
                self.at_value = true;
            }
            Some(TagKind::List) => {
                let element_kind = self.reader.read_tag_kind()?;
                let len = self.reader.read_length()?;
                if element_kind == TagKind::End && len > 0 {
                    return Err(Error::format(format!(
                        "list of {len} elements declares element kind TAG_End"
                    )));
                }
                self.list_kind = Some(element_kind);
                self.tag_length = len;
                self.cursor = Cursor::ListBeginning;
            }
            Some(TagKind::Compound) => self.cursor = Cursor::CompoundBeginning,
            Some(TagKind::End) | None => {
                return Err(Error::format("unexpected TAG_End where a tag was expected"));
            }
            Some(_) => self.at_value = true,
        }
        Ok(())
    }

    fn go_down(&mut self) {
        self.frames.push(Frame {
            parent_name: self.parent_name.take(),
            parent_kind: self.parent_kind,
            parent_length: self.parent_length,
            list_index: self.list_index,
            list_kind: self.list_kind,
            element_kind: self.element_kind,
        });
        self.parent_name = self.tag_name.clone();
        self.parent_kind = self.tag_kind;
        self.parent_length = self.tag_length;
        self.list_index = 0;
        self.tag_length = 0;
        self.depth += 1;
    }

    /// Pops one level; the container just left becomes the current tag.
    fn go_up(&mut self) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::format("container end without a matching start"))?;
        self.tag_kind = self.parent_kind;
        self.tag_name = self.parent_name.take();
        self.tag_length = 0;
        self.parent_name = frame.parent_name;
        self.parent_kind = frame.parent_kind;
        self.parent_length = frame.parent_length;
        self.list_index = frame.list_index;
        self.list_kind = frame.list_kind;
        self.element_kind = frame.element_kind;
        self.depth -= 1;
        Ok(())
    }

    fn leave_container(&mut self) -> Result<()> {
        self.go_up()?;
        self.cursor = self.parent_cursor()?;
        Ok(())
    }

    fn parent_cursor(&self) -> Result<Cursor> {
        match self.parent_kind {
            Some(TagKind::Compound) => Ok(Cursor::InCompound),
            Some(TagKind::List) => Ok(Cursor::InList),
            None => Ok(Cursor::StreamEnd),
            Some(kind) => Err(Error::format(format!("{kind} cannot contain tags"))),
        }
    }

    /// Called once the body of the container at the cursor was consumed.
    fn finish_container(&mut self) {
        self.at_value = false;
        self.cursor = match self.parent_kind {
            Some(TagKind::List) => Cursor::InList,
            Some(_) => Cursor::InCompound,
            None => Cursor::StreamEnd,
        };
    }

    fn skip_current(&mut self) -> Result<u64> {
        match self.cursor {
            Cursor::CompoundBeginning => {
                let skipped = codec::skip_compound_body(&mut self.reader, self.depth)?;
                self.tags_read += skipped;
                self.finish_container();
                Ok(1 + skipped)
            }
            Cursor::ListBeginning => {
                let element_kind = self.list_kind.unwrap_or(TagKind::End);
                let skipped =
                    codec::skip_list_body(&mut self.reader, element_kind, self.tag_length, self.depth)?;
                self.tags_read += skipped;
                self.finish_container();
                Ok(1 + skipped)
            }
            Cursor::InCompound | Cursor::InList if self.at_value => {
                self.skip_value()?;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn skip_value(&mut self) -> Result<()> {
        match self.tag_kind {
            Some(TagKind::String) => self.reader.skip_string()?,
            Some(kind) if kind.is_array() => {
                let bytes = array_bytes(self.tag_length, kind.element_size())?;
                self.reader.skip(bytes as u64)?;
            }
            Some(kind) => self.reader.skip(kind.fixed_size().unwrap_or(0) as u64)?,
            None => {}
        }
        self.at_value = false;
        self.value_cache = None;
        Ok(())
    }

    fn take_value(&mut self) -> Result<NbtValue> {
        if !self.at_value {
            if self.cache_tag_values {
                if let Some(value) = &self.value_cache {
                    return Ok(value.clone());
                }
            }
            return Err(match self.tag_kind {
                Some(kind) if !kind.has_value() => {
                    Error::invalid_operation(format!("{kind} has no value to read"))
                }
                _ => Error::invalid_operation(
                    "value already read; enable cache_tag_values to read it again",
                ),
            });
        }
        let kind = self.tag_kind.unwrap_or(TagKind::End);
        let value = if kind.is_array() {
            codec::read_array(&mut self.reader, kind, self.tag_length)?
        } else {
            codec::read_value(&mut self.reader, kind)?
        };
        self.at_value = false;
        if self.cache_tag_values {
            self.value_cache = Some(value.clone());
        }
        Ok(value)
    }
}

impl<R> std::fmt::Debug for NbtReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NbtReader")
            .field("cursor", &self.cursor)
            .field("tag_kind", &self.tag_kind)
            .field("tag_name", &self.tag_name)
            .field("depth", &self.depth)
            .field("tags_read", &self.tags_read)
            .finish_non_exhaustive()
    }
}
