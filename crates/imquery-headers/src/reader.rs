//! Byte-order aware reader for header parsing

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use imquery_core::{ImqError, ImqResult};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Byte order of multi-byte header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Reads fixed-width integers in a byte order chosen at runtime.
///
/// Running out of input is reported as a corrupt header rather than an I/O error.
pub struct HeaderReader<R> {
    reader: R,
    endian: Endian,
}

impl<R: Read> HeaderReader<R> {
    pub fn new(reader: R, endian: Endian) -> Self {
        Self { reader, endian }
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn read_u8(&mut self) -> ImqResult<u8> {
        self.reader.read_u8().map_err(truncated)
    }

    pub fn read_u16(&mut self) -> ImqResult<u16> {
        match self.endian {
            Endian::Little => self.reader.read_u16::<LittleEndian>(),
            Endian::Big => self.reader.read_u16::<BigEndian>(),
        }
        .map_err(truncated)
    }

    pub fn read_u32(&mut self) -> ImqResult<u32> {
        match self.endian {
            Endian::Little => self.reader.read_u32::<LittleEndian>(),
            Endian::Big => self.reader.read_u32::<BigEndian>(),
        }
        .map_err(truncated)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> ImqResult<()> {
        self.reader.read_exact(buf).map_err(truncated)
    }

    /// Decode a u16 from bytes already read, using this reader's byte order
    pub fn u16_from(&self, bytes: [u8; 2]) -> u16 {
        match self.endian {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Decode a u32 from bytes already read, using this reader's byte order
    pub fn u32_from(&self, bytes: [u8; 4]) -> u32 {
        match self.endian {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }
}

impl<R: Read + Seek> HeaderReader<R> {
    pub fn seek_to(&mut self, offset: u64) -> ImqResult<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn skip(&mut self, count: i64) -> ImqResult<()> {
        self.reader.seek(SeekFrom::Current(count))?;
        Ok(())
    }
}

fn truncated(err: std::io::Error) -> ImqError {
    if err.kind() == ErrorKind::UnexpectedEof {
        ImqError::CorruptHeader("unexpected end of header data".to_string())
    } else {
        ImqError::IoError(err)
    }
}
