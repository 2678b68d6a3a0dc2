//! EXIF orientation lookup
//!
//! EXIF blocks are small TIFF structures. Only IFD0 is read, looking for the
//! Orientation tag; a block that cannot be parsed is treated as carrying none.

use crate::reader::{Endian, HeaderReader};
use imquery_core::*;
use std::io::Cursor;

/// JPEG APP1 payloads start with this identifier before the TIFF structure
pub const EXIF_IDENTIFIER: &[u8; 6] = b"Exif\0\0";

pub const TAG_ORIENTATION: u16 = 0x0112;

const TYPE_SHORT: u16 = 3;
const IFD_ENTRY_LEN: i64 = 12;

/// Orientation (1..=8) from a TIFF-structured EXIF block
pub fn orientation(exif: &[u8]) -> Option<u8> {
    read_orientation(exif).ok().flatten()
}

/// Orientation from a JPEG APP1 payload, which is EXIF only after the identifier
pub fn app1_orientation(payload: &[u8]) -> Option<u8> {
    payload
        .strip_prefix(EXIF_IDENTIFIER.as_slice())
        .and_then(orientation)
}

fn read_orientation(exif: &[u8]) -> ImqResult<Option<u8>> {
    let mut reader = HeaderReader::new(Cursor::new(exif), Endian::Little);

    let mut order = [0u8; 2];
    reader.read_exact(&mut order)?;
    match &order {
        b"II" => {}
        b"MM" => reader.set_endian(Endian::Big),
        _ => return Ok(None),
    }
    if reader.read_u16()? != 42 {
        return Ok(None);
    }

    let ifd0 = reader.read_u32()?;
    reader.seek_to(ifd0 as u64)?;
    let count = reader.read_u16()?;

    for _ in 0..count {
        let tag = reader.read_u16()?;
        if tag != TAG_ORIENTATION {
            reader.skip(IFD_ENTRY_LEN - 2)?;
            continue;
        }

        let field_type = reader.read_u16()?;
        let _count = reader.read_u32()?;
        let value = reader.read_u16()?;
        if field_type != TYPE_SHORT || !(1..=8).contains(&value) {
            return Ok(None);
        }
        return Ok(Some(value as u8));
    }

    Ok(None)
}
