//! Bounds-checked little-endian reading over an in-memory buffer.

use byteorder::{ReadBytesExt, LE};
use std::io::{self, Cursor};

use crate::error::ThingkitError;

/// Reads little-endian values, turning running off the end into
/// [`ThingkitError::Truncated`] tagged with what was being read.
pub(crate) struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            cursor: Cursor::new(data),
            context,
        }
    }

    /// A reader positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize, context: &'static str) -> Result<Self, ThingkitError> {
        let mut reader = Self::new(data, context);
        reader.seek(offset)?;
        Ok(reader)
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn seek(&mut self, offset: usize) -> Result<(), ThingkitError> {
        if offset > self.len() {
            return Err(ThingkitError::Truncated {
                context: self.context,
                offset,
            });
        }
        self.cursor.set_position(offset as u64);
        Ok(())
    }

    /// A format error in this reader's context.
    pub fn invalid(&self, message: impl Into<String>) -> ThingkitError {
        ThingkitError::Format {
            context: self.context,
            message: message.into(),
        }
    }

    fn read<T>(
        &mut self,
        f: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T, ThingkitError> {
        let offset = self.position();
        f(&mut self.cursor).map_err(|_| {
            self.cursor.set_position(offset as u64);
            ThingkitError::Truncated {
                context: self.context,
                offset,
            }
        })
    }

    pub fn u8(&mut self) -> Result<u8, ThingkitError> {
        self.read(|c| c.read_u8())
    }

    pub fn i8(&mut self) -> Result<i8, ThingkitError> {
        self.read(|c| c.read_i8())
    }

    pub fn u16(&mut self) -> Result<u16, ThingkitError> {
        self.read(|c| c.read_u16::<LE>())
    }

    pub fn i16(&mut self) -> Result<i16, ThingkitError> {
        self.read(|c| c.read_i16::<LE>())
    }

    pub fn u32(&mut self) -> Result<u32, ThingkitError> {
        self.read(|c| c.read_u32::<LE>())
    }

    pub fn i32(&mut self) -> Result<i32, ThingkitError> {
        self.read(|c| c.read_i32::<LE>())
    }

    /// Borrows the next `len` bytes.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], ThingkitError> {
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        let end = start
            .checked_add(len)
            .filter(|end| *end <= data.len())
            .ok_or(ThingkitError::Truncated {
                context: self.context,
                offset: start,
            })?;
        self.cursor.set_position(end as u64);
        Ok(&data[start..end])
    }
}
