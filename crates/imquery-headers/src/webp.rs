//! WebP RIFF chunk walk
//!
//! Animated WebP files carry a `VP8X` header with the animation flag set, followed by
//! one `ANMF` chunk per frame. Frames are counted from chunk headers alone; frame
//! payloads are skipped. Still WebP files are left to the generic probe.

use crate::reader::{Endian, HeaderReader};
use imquery_core::consts::{MAX_IMAGE_DIMENSION, MAX_PAGES};
use imquery_core::*;
use std::io::{Read, Seek};
use tracing::{debug, warn};

pub const RIFF_TAG: &[u8; 4] = b"RIFF";
pub const WEBP_TAG: &[u8; 4] = b"WEBP";

const VP8X: &[u8; 4] = b"VP8X";
const ANMF: &[u8; 4] = b"ANMF";

const VP8X_LEN: u32 = 10;
const FLAG_ANIMATION: u8 = 0x02;
const FLAG_ALPHA: u8 = 0x10;

/// Describe the frames of an animated WebP.
///
/// Returns `Ok(None)` for a still image.
pub fn parse_webp<R: Read + Seek>(reader: R) -> ImqResult<Option<Vec<PageDescriptor>>> {
    let mut reader = HeaderReader::new(reader, Endian::Little);

    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    let riff_size = reader.read_u32()?;
    let mut form = [0u8; 4];
    reader.read_exact(&mut form)?;
    if &tag != RIFF_TAG || &form != WEBP_TAG {
        return Err(ImqError::CorruptHeader("invalid WebP RIFF header".to_string()));
    }

    let (fourcc, length) = read_chunk_header(&mut reader)?;
    if &fourcc != VP8X {
        return Ok(None);
    }
    if length < VP8X_LEN {
        return Err(ImqError::CorruptHeader("malformed VP8X chunk".to_string()));
    }

    let mut vp8x = [0u8; VP8X_LEN as usize];
    reader.read_exact(&mut vp8x)?;
    let flags = vp8x[0];
    if flags & FLAG_ANIMATION == 0 {
        return Ok(None);
    }

    let width = 1 + u24(&vp8x[4..7]);
    let height = 1 + u24(&vp8x[7..10]);
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(ImqError::CorruptHeader(format!(
            "invalid WebP canvas {}x{}",
            width, height
        )));
    }
    reader.skip(padded(length) as i64 - VP8X_LEN as i64)?;

    // Offset of the next chunk, counted from the start of the file
    let end = 8 + riff_size as u64;
    let mut offset = 12 + 8 + padded(length) as u64;
    let mut frames = 0usize;

    while offset + 8 <= end {
        let (fourcc, length) = read_chunk_header(&mut reader)?;
        if &fourcc == ANMF {
            frames += 1;
            if frames > MAX_PAGES {
                warn!(limit = MAX_PAGES, "animated WebP frame count truncated");
                frames = MAX_PAGES;
                break;
            }
        }
        reader.skip(padded(length) as i64)?;
        offset += 8 + padded(length) as u64;
    }

    if frames == 0 {
        return Err(ImqError::CorruptHeader(
            "animated WebP without frames".to_string(),
        ));
    }

    let channels = if flags & FLAG_ALPHA != 0 {
        ColorChannels::RGBA
    } else {
        ColorChannels::RGB
    };
    debug!(frames, width, height, "parsed animated WebP header");

    Ok(Some(
        (0..frames)
            .map(|index| PageDescriptor {
                index,
                dimensions: Dimensions::new(width, height),
                channels: Some(channels),
                bits_per_sample: Some(8),
                orientation: None,
            })
            .collect(),
    ))
}

fn read_chunk_header<R: Read>(reader: &mut HeaderReader<R>) -> ImqResult<([u8; 4], u32)> {
    let mut fourcc = [0u8; 4];
    reader.read_exact(&mut fourcc)?;
    let length = reader.read_u32()?;
    Ok((fourcc, length))
}

/// Chunk payloads are padded to an even length
fn padded(length: u32) -> u32 {
    length + (length & 1)
}

fn u24(bytes: &[u8]) -> u32 {
    bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
}
