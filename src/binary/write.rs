use std::io::{self, Read, Write};

use crate::{Endianness, Error, Result, TagKind};

/// Largest slice handed to the underlying writer in one call.
pub(crate) const MAX_WRITE_CHUNK: usize = 4 * 1024 * 1024;

/// Writes NBT primitives to a byte sink, counting the bytes produced.
pub struct NbtBinaryWriter<W> {
    inner: W,
    endianness: Endianness,
    position: u64,
}

impl<W: Write> NbtBinaryWriter<W> {
    pub fn new(inner: W, endianness: Endianness) -> Self {
        Self {
            inner,
            endianness,
            position: 0,
        }
    }

    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Number of bytes handed to the underlying sink.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    #[inline]
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    pub fn write_tag_kind(&mut self, kind: TagKind) -> Result<()> {
        self.write_u8(kind as u8)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.put(&self.endianness.encode_i16(value))
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.put(&self.endianness.encode_i32(value))
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.put(&self.endianness.encode_i64(value))
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.put(&self.endianness.encode_f32(value))
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.put(&self.endianness.encode_f64(value))
    }

    /// Writes an array or list length as a signed 32-bit integer.
    pub fn write_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::argument(format!("length {len} does not fit in an i32")))?;
        self.write_i32(len)
    }

    /// Writes a `u16`-prefixed modified UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let encoded = simd_cesu8::mutf8::encode(value);
        let len = u16::try_from(encoded.len()).map_err(|_| {
            Error::argument(format!(
                "string of {} encoded bytes exceeds the 65535 byte limit",
                encoded.len()
            ))
        })?;
        self.put(&self.endianness.encode_u16(len))?;
        self.put(&encoded)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in bytes.chunks(MAX_WRITE_CHUNK) {
            self.put(chunk)?;
        }
        Ok(())
    }

    pub fn write_i32_slice(&mut self, values: &[i32]) -> Result<()> {
        let mut buf = Vec::with_capacity((values.len() * 4).min(MAX_WRITE_CHUNK));
        for chunk in values.chunks(MAX_WRITE_CHUNK / 4) {
            buf.clear();
            for value in chunk {
                buf.extend_from_slice(&self.endianness.encode_i32(*value));
            }
            self.put(&buf)?;
        }
        Ok(())
    }

    pub fn write_i64_slice(&mut self, values: &[i64]) -> Result<()> {
        let mut buf = Vec::with_capacity((values.len() * 8).min(MAX_WRITE_CHUNK));
        for chunk in values.chunks(MAX_WRITE_CHUNK / 8) {
            buf.clear();
            for value in chunk {
                buf.extend_from_slice(&self.endianness.encode_i64(*value));
            }
            self.put(&buf)?;
        }
        Ok(())
    }

    /// Copies exactly `count` bytes from `source`, staging them through
    /// `buffer`.
    pub fn write_from_reader<S: Read + ?Sized>(
        &mut self,
        source: &mut S,
        count: usize,
        buffer: &mut [u8],
    ) -> Result<()> {
        if buffer.is_empty() && count > 0 {
            return Err(Error::argument("copy buffer must not be empty"));
        }
        let mut remaining = count;
        while remaining > 0 {
            let want = remaining.min(buffer.len());
            let read = match source.read(&mut buffer[..want]) {
                Ok(0) => return Err(Error::EndOfStream),
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.put(&buffer[..read])?;
            remaining -= read;
        }
        Ok(())
    }
}
