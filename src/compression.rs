//! Stream compression around NBT data.
//!
//! Files are usually GZip-compressed, network and region data ZLib, and
//! some tools write raw NBT. Because an uncompressed NBT document always
//! starts with the Compound type byte `0x0A`, the first byte is enough to
//! tell the three apart.

use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
};

use crate::{Error, Result};

/// Compression applied to a whole NBT document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Raw NBT.
    None,
    /// RFC 1952 GZip.
    GZip,
    /// RFC 1950 ZLib.
    ZLib,
    /// Only valid when loading: pick one of the above from the first byte.
    AutoDetect,
}

#[cfg(feature = "serde")]
impl serde::Serialize for Compression {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (index, name) = match self {
            Compression::None => (0, "None"),
            Compression::GZip => (1, "GZip"),
            Compression::ZLib => (2, "ZLib"),
            Compression::AutoDetect => (3, "AutoDetect"),
        };
        serializer.serialize_unit_variant("Compression", index, name)
    }
}

const GZIP_MAGIC: u8 = 0x1F;
const ZLIB_MAGIC: u8 = 0x78;
const COMPOUND_ID: u8 = 0x0A;

/// Guesses the compression from the first byte of a stream.
pub fn classify(first: u8) -> Result<Compression> {
    match first {
        COMPOUND_ID => Ok(Compression::None),
        GZIP_MAGIC => Ok(Compression::GZip),
        ZLIB_MAGIC => Ok(Compression::ZLib),
        other => Err(Error::format(format!(
            "could not auto-detect compression from first byte {other:#04x}"
        ))),
    }
}

/// Peeks at the first byte of a buffered stream without consuming it.
pub fn detect_buffered<R: BufRead + ?Sized>(reader: &mut R) -> Result<Compression> {
    match reader.fill_buf()?.first() {
        Some(first) => classify(*first),
        None => Err(Error::EndOfStream),
    }
}

/// Reads the first byte of a seekable stream and seeks back over it.
pub fn detect_seekable<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<Compression> {
    let mut first = [0u8; 1];
    reader.read_exact(&mut first)?;
    reader.seek(SeekFrom::Current(-1))?;
    classify(first[0])
}

/// Wraps `reader` in the decoder for an already resolved compression.
pub fn decoder<'a, R: Read + 'a>(reader: R, compression: Compression) -> Result<Box<dyn Read + 'a>> {
    Ok(match compression {
        Compression::None => Box::new(reader),
        Compression::GZip => Box::new(GzDecoder::new(reader)),
        Compression::ZLib => Box::new(ZlibDecoder::new(reader)),
        Compression::AutoDetect => {
            return Err(Error::invalid_operation(
                "compression must be resolved before a decoder is built",
            ));
        }
    })
}

/// Resolves [`Compression::AutoDetect`] on a buffered stream and wraps it in
/// the matching decoder. Returns the compression actually used.
pub fn decompress<'a, R: BufRead + 'a>(
    mut reader: R,
    compression: Compression,
) -> Result<(Box<dyn Read + 'a>, Compression)> {
    let compression = match compression {
        Compression::AutoDetect => detect_buffered(&mut reader)?,
        resolved => resolved,
    };
    Ok((decoder(reader, compression)?, compression))
}

/// A sink that compresses what is written to it.
pub enum Encoder<W: Write> {
    Plain(W),
    GZip(GzEncoder<W>),
    ZLib(ZlibEncoder<W>),
}

impl<W: Write> Encoder<W> {
    pub fn new(inner: W, compression: Compression) -> Result<Self> {
        let level = flate2::Compression::default();
        match compression {
            Compression::None => Ok(Encoder::Plain(inner)),
            Compression::GZip => Ok(Encoder::GZip(GzEncoder::new(inner, level))),
            Compression::ZLib => Ok(Encoder::ZLib(ZlibEncoder::new(inner, level))),
            Compression::AutoDetect => Err(Error::argument(
                "AutoDetect is not a valid compression for saving",
            )),
        }
    }

    /// Writes any trailer and returns the underlying sink.
    pub fn finish(self) -> Result<W> {
        Ok(match self {
            Encoder::Plain(inner) => inner,
            Encoder::GZip(encoder) => encoder.finish()?,
            Encoder::ZLib(encoder) => encoder.finish()?,
        })
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(inner) => inner.write(buf),
            Encoder::GZip(encoder) => encoder.write(buf),
            Encoder::ZLib(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(inner) => inner.flush(),
            Encoder::GZip(encoder) => encoder.flush(),
            Encoder::ZLib(encoder) => encoder.flush(),
        }
    }
}
