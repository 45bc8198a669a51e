//! Loading and saving whole documents.

use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    Compression, Endianness, Error, NbtBinaryReader, NbtBinaryWriter, Result, Tag, TagKind,
    codec::{self, Selector, TreeReader},
    compression::{self, Encoder},
};

/// Default size of the I/O buffers wrapped around files and streams.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// A document: one named root compound plus the settings used to load and
/// save it.
///
/// ```
/// use nbt_tree::{Compression, NbtFile, Tag};
///
/// let root = Tag::named_compound("hello world");
/// root.add(Tag::named("name", "Bananrama")).unwrap();
///
/// let mut file = NbtFile::with_root(root).unwrap();
/// let bytes = file.save_to_buffer(Compression::GZip).unwrap();
///
/// let mut loaded = NbtFile::new();
/// loaded.load_from_buffer(&bytes, Compression::AutoDetect, None).unwrap();
/// assert_eq!(loaded.compression(), Compression::GZip);
/// assert_eq!(loaded.root().get("name").unwrap().unwrap().string_value().unwrap(), "Bananrama");
/// ```
pub struct NbtFile {
    root: Tag,
    file_name: Option<PathBuf>,
    compression: Compression,
    endianness: Endianness,
    buffer_size: usize,
}

impl Default for NbtFile {
    fn default() -> Self {
        Self::new()
    }
}

impl NbtFile {
    /// A document with an empty root compound named `""`.
    pub fn new() -> Self {
        Self {
            root: Tag::named_compound(""),
            file_name: None,
            compression: Compression::None,
            endianness: Endianness::Big,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_root(root: Tag) -> Result<Self> {
        let mut file = Self::new();
        file.set_root(root)?;
        Ok(file)
    }

    /// A handle to the root compound.
    pub fn root(&self) -> Tag {
        self.root.share()
    }

    /// Replaces the root. It must be a named compound without a parent.
    pub fn set_root(&mut self, root: Tag) -> Result<()> {
        if root.kind() != TagKind::Compound {
            return Err(Error::argument(format!(
                "the root tag must be a TAG_Compound, not a {}",
                root.kind()
            )));
        }
        if !root.has_name() {
            return Err(Error::argument("the root tag must be named"));
        }
        if root.parent().is_some() {
            return Err(Error::argument("the root tag cannot have a parent"));
        }
        self.root = root;
        Ok(())
    }

    /// Path of the last file loaded or saved.
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Compression used by the last load or save, with auto-detection
    /// resolved.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Size of the buffers wrapped around files and streams; `0` disables
    /// buffering.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size;
    }

    /// Loads a document from a file, replacing the root. Returns the number
    /// of uncompressed bytes read.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let read = if self.buffer_size > 0 {
            self.load_buffered(
                BufReader::with_capacity(self.buffer_size, file),
                compression,
                selector,
            )?
        } else {
            let compression = match compression {
                Compression::AutoDetect => compression::detect_seekable(&mut file)?,
                resolved => resolved,
            };
            self.load_resolved(file, compression, selector)?
        };
        self.file_name = Some(path.to_path_buf());
        Ok(read)
    }

    /// Loads a document from memory, replacing the root.
    pub fn load_from_buffer(
        &mut self,
        buffer: &[u8],
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        self.load_buffered(buffer, compression, selector)
    }

    /// Loads a document from a stream, replacing the root.
    ///
    /// Auto-detection peeks at the first byte, which needs buffering: with
    /// a buffer size of `0` it fails with [`Error::InvalidOperation`].
    pub fn load_from_reader<R: Read>(
        &mut self,
        reader: R,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        if self.buffer_size > 0 {
            let reader = BufReader::with_capacity(self.buffer_size, reader);
            self.load_buffered(reader, compression, selector)
        } else if compression == Compression::AutoDetect {
            Err(Error::invalid_operation(
                "cannot auto-detect compression on an unbuffered stream",
            ))
        } else {
            self.load_resolved(reader, compression, selector)
        }
    }

    fn load_buffered<R: std::io::BufRead>(
        &mut self,
        mut reader: R,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        let compression = match compression {
            Compression::AutoDetect => compression::detect_buffered(&mut reader)?,
            resolved => resolved,
        };
        self.load_resolved(reader, compression, selector)
    }

    fn load_resolved<R: Read>(
        &mut self,
        reader: R,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        let stream = compression::decoder(reader, compression)?;
        let mut reader = NbtBinaryReader::new(stream, self.endianness);
        let mut tree = TreeReader::new(selector);
        self.root = tree.read_root(&mut reader)?;
        self.compression = compression;
        let root_name = self.root.name().unwrap_or_default();
        debug!(
            ?compression,
            bytes = reader.position(),
            tags = tree.tags_read,
            root = %root_name,
            "loaded NBT document"
        );
        Ok(reader.position())
    }

    /// Saves the document to a file. Returns the number of uncompressed
    /// bytes written.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>, compression: Compression) -> Result<u64> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let written = if self.buffer_size > 0 {
            let mut sink = BufWriter::with_capacity(self.buffer_size, file);
            let written = self.save_to_writer(&mut sink, compression)?;
            sink.flush()?;
            written
        } else {
            self.save_to_writer(file, compression)?
        };
        self.file_name = Some(path.to_path_buf());
        Ok(written)
    }

    pub fn save_to_buffer(&mut self, compression: Compression) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save_to_writer(&mut buffer, compression)?;
        Ok(buffer)
    }

    /// Saves the document to a stream. [`Compression::AutoDetect`] is
    /// rejected with [`Error::Argument`].
    pub fn save_to_writer<W: Write>(&mut self, writer: W, compression: Compression) -> Result<u64> {
        let encoder = Encoder::new(writer, compression)?;
        let mut writer = NbtBinaryWriter::new(encoder, self.endianness);
        codec::write_named(&mut writer, &self.root)?;
        let written = writer.position();
        writer.into_inner().finish()?.flush()?;
        self.compression = compression;
        debug!(?compression, bytes = written, "saved NBT document");
        Ok(written)
    }

    /// Reads just the root tag's name from a file without decoding the
    /// rest of the document.
    pub fn read_root_tag_name(
        path: impl AsRef<Path>,
        compression: Compression,
        endianness: Endianness,
        buffer_size: usize,
    ) -> Result<String> {
        let mut file = File::open(path)?;
        if buffer_size > 0 {
            let reader = BufReader::with_capacity(buffer_size, file);
            return Self::read_root_tag_name_from_buffered(reader, compression, endianness);
        }
        let compression = match compression {
            Compression::AutoDetect => compression::detect_seekable(&mut file)?,
            resolved => resolved,
        };
        read_root_name(compression::decoder(file, compression)?, endianness)
    }

    pub fn read_root_tag_name_from_buffer(
        buffer: &[u8],
        compression: Compression,
        endianness: Endianness,
    ) -> Result<String> {
        Self::read_root_tag_name_from_buffered(buffer, compression, endianness)
    }

    /// Stream variant of [`NbtFile::read_root_tag_name`]; auto-detection
    /// requires `buffer_size > 0`.
    pub fn read_root_tag_name_from_reader<R: Read>(
        reader: R,
        compression: Compression,
        endianness: Endianness,
        buffer_size: usize,
    ) -> Result<String> {
        if buffer_size > 0 {
            let reader = BufReader::with_capacity(buffer_size, reader);
            Self::read_root_tag_name_from_buffered(reader, compression, endianness)
        } else if compression == Compression::AutoDetect {
            Err(Error::invalid_operation(
                "cannot auto-detect compression on an unbuffered stream",
            ))
        } else {
            read_root_name(compression::decoder(reader, compression)?, endianness)
        }
    }

    fn read_root_tag_name_from_buffered<R: std::io::BufRead>(
        reader: R,
        compression: Compression,
        endianness: Endianness,
    ) -> Result<String> {
        let (stream, _) = compression::decompress(reader, compression)?;
        read_root_name(stream, endianness)
    }
}

fn read_root_name<R: Read>(stream: R, endianness: Endianness) -> Result<String> {
    let mut reader = NbtBinaryReader::new(stream, endianness);
    let kind = reader.read_tag_kind()?;
    if kind != TagKind::Compound {
        return Err(Error::format(format!(
            "root tag must be a TAG_Compound, found {kind}"
        )));
    }
    reader.read_string()
}

impl fmt::Display for NbtFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

impl fmt::Debug for NbtFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NbtFile")
            .field("root", &self.root.name())
            .field("file_name", &self.file_name)
            .field("compression", &self.compression)
            .field("endianness", &self.endianness)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
