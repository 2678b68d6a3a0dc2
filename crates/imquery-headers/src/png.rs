//! PNG and APNG chunk walk
//!
//! Chunks are read up to the first `IDAT`. An `acTL` chunk before that point marks an
//! animated PNG whose frames are exposed as pages at the canvas size.

use crate::exif;
use crate::reader::{Endian, HeaderReader};
use crate::signature::PNG_SIGNATURE;
use imquery_core::consts::{MAX_IMAGE_DIMENSION, MAX_PAGES};
use imquery_core::*;
use std::io::{Read, Seek};
use tracing::{debug, warn};

const IHDR: &[u8; 4] = b"IHDR";
const ACTL: &[u8; 4] = b"acTL";
const EXIF_CHUNK: &[u8; 4] = b"eXIf";
const IDAT: &[u8; 4] = b"IDAT";
const IEND: &[u8; 4] = b"IEND";

const IHDR_LEN: u32 = 13;
const ACTL_LEN: u32 = 8;

/// Parse a PNG stream, returning `Png` or `Apng` and one descriptor per page
pub fn parse_png<R: Read + Seek>(reader: R) -> ImqResult<(ContainerFormat, Vec<PageDescriptor>)> {
    let mut reader = HeaderReader::new(reader, Endian::Big);

    let mut signature = [0u8; 8];
    reader.read_exact(&mut signature)?;
    if signature != PNG_SIGNATURE {
        return Err(ImqError::CorruptHeader("invalid PNG signature".to_string()));
    }

    let (length, chunk_type) = read_chunk_header(&mut reader)?;
    if &chunk_type != IHDR || length != IHDR_LEN {
        return Err(ImqError::CorruptHeader(
            "PNG does not start with IHDR".to_string(),
        ));
    }
    let ihdr = read_checked_payload(&mut reader, &chunk_type, length)?;

    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    let bit_depth = ihdr[8];
    let color_type = ihdr[9];

    if width == 0 || height == 0 || width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(ImqError::CorruptHeader(format!(
            "invalid PNG dimensions {}x{}",
            width, height
        )));
    }

    let channels = match color_type {
        0 => ColorChannels::Gray,
        2 | 3 => ColorChannels::RGB,
        4 => ColorChannels::GrayAlpha,
        6 => ColorChannels::RGBA,
        other => {
            return Err(ImqError::CorruptHeader(format!(
                "invalid PNG color type {}",
                other
            )))
        }
    };

    let mut frames = None;
    let mut orientation = None;
    loop {
        let (length, chunk_type) = read_chunk_header(&mut reader)?;
        match &chunk_type {
            IDAT | IEND => break,
            ACTL => {
                if length != ACTL_LEN {
                    return Err(ImqError::CorruptHeader("malformed acTL chunk".to_string()));
                }
                let actl = read_checked_payload(&mut reader, &chunk_type, length)?;
                let num_frames = u32::from_be_bytes([actl[0], actl[1], actl[2], actl[3]]);
                if num_frames == 0 {
                    return Err(ImqError::CorruptHeader(
                        "acTL declares zero frames".to_string(),
                    ));
                }
                frames = Some(num_frames as usize);
            }
            EXIF_CHUNK => {
                let payload = read_checked_payload(&mut reader, &chunk_type, length)?;
                orientation = exif::orientation(&payload);
            }
            _ => reader.skip(length as i64 + 4)?,
        }
    }

    let template = PageDescriptor {
        index: 0,
        dimensions: Dimensions::new(width, height),
        channels: Some(channels),
        bits_per_sample: Some(bit_depth),
        orientation: None,
    };

    match frames {
        Some(count) => {
            if count > MAX_PAGES {
                warn!(count, limit = MAX_PAGES, "APNG frame count truncated");
            }
            let count = count.min(MAX_PAGES);
            debug!(count, width, height, "parsed APNG header");
            let pages = (0..count)
                .map(|index| PageDescriptor { index, ..template })
                .collect();
            Ok((ContainerFormat::Apng, pages))
        }
        None => {
            // Orientation applies to still images only
            let mut page = PageDescriptor {
                orientation,
                ..template
            };
            if page.is_transposed() {
                page.dimensions = page.dimensions.transposed();
            }
            debug!(width, height, ?orientation, "parsed PNG header");
            Ok((ContainerFormat::Png, vec![page]))
        }
    }
}

fn read_chunk_header<R: Read>(reader: &mut HeaderReader<R>) -> ImqResult<(u32, [u8; 4])> {
    let length = reader.read_u32()?;
    let mut chunk_type = [0u8; 4];
    reader.read_exact(&mut chunk_type)?;
    Ok((length, chunk_type))
}

fn read_checked_payload<R: Read>(
    reader: &mut HeaderReader<R>,
    chunk_type: &[u8; 4],
    length: u32,
) -> ImqResult<Vec<u8>> {
    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload)?;
    let stored = reader.read_u32()?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(&payload);
    if hasher.finalize() != stored {
        return Err(ImqError::CorruptHeader(format!(
            "CRC mismatch in {} chunk",
            String::from_utf8_lossy(chunk_type)
        )));
    }

    Ok(payload)
}
