use std::io::{self, Read};

use crate::{Endianness, Error, Result, TagKind};

/// Reads NBT primitives from a byte stream, counting the bytes consumed.
pub struct NbtBinaryReader<R> {
    inner: R,
    endianness: Endianness,
    position: u64,
}

impl<R: Read> NbtBinaryReader<R> {
    pub fn new(inner: R, endianness: Endianness) -> Self {
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

    /// Number of bytes consumed from the underlying stream.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    #[inline]
    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.fill::<1>()?[0])
    }

    pub fn read_tag_kind(&mut self) -> Result<TagKind> {
        TagKind::try_from(self.read_u8()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.fill()?;
        Ok(self.endianness.decode_i16(bytes))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.fill()?;
        Ok(self.endianness.decode_i32(bytes))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.fill()?;
        Ok(self.endianness.decode_i64(bytes))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.fill()?;
        Ok(self.endianness.decode_f32(bytes))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.fill()?;
        Ok(self.endianness.decode_f64(bytes))
    }

    /// Reads a signed 32-bit array or list length.
    pub fn read_length(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| Error::NegativeLength(len))
    }

    /// Reads a `u16`-prefixed modified UTF-8 string. Invalid sequences are
    /// replaced rather than rejected.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.fill()?;
        let len = self.endianness.decode_u16(bytes) as usize;
        let raw = self.read_bytes(len)?;
        Ok(simd_cesu8::mutf8::decode_lossy(&raw).into_owned())
    }

    pub fn skip_string(&mut self) -> Result<()> {
        let bytes = self.fill()?;
        let len = self.endianness.decode_u16(bytes);
        self.skip(u64::from(len))
    }

    /// Reads exactly `len` bytes.
    ///
    /// The buffer grows with the data actually received, so a corrupt
    /// length cannot trigger a huge allocation up front.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.position += read as u64;
        if read < len {
            return Err(Error::EndOfStream);
        }
        Ok(buf)
    }

    pub fn read_i32_array(&mut self, len: usize) -> Result<Vec<i32>> {
        let raw = self.read_bytes(array_bytes(len, 4)?)?;
        Ok(raw
            .chunks_exact(4)
            .map(|chunk| self.endianness.decode_i32([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    pub fn read_i64_array(&mut self, len: usize) -> Result<Vec<i64>> {
        let raw = self.read_bytes(array_bytes(len, 8)?)?;
        Ok(raw
            .chunks_exact(8)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                self.endianness.decode_i64(bytes)
            })
            .collect())
    }

    /// Discards exactly `count` bytes.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        self.position += skipped;
        if skipped < count {
            return Err(Error::EndOfStream);
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn array_bytes(len: usize, element_size: usize) -> Result<usize> {
    len.checked_mul(element_size)
        .ok_or_else(|| Error::format(format!("array of {len} elements is too large")))
}
