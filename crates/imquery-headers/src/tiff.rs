//! TIFF image file directory walk
//!
//! Only the file header and the IFD chain are read. Strip and tile data are never
//! touched, so enumerating a large multi-page file costs a few small reads per page.

use crate::reader::{Endian, HeaderReader};
use imquery_core::consts::{MAX_IMAGE_DIMENSION, MAX_PAGES};
use imquery_core::*;
use std::collections::HashSet;
use std::io::{Read, Seek};
use tracing::{debug, warn};

pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_ORIENTATION: u16 = 274;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;

const TYPE_BYTE: u16 = 1;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

/// Classic TIFF version number
const TIFF_VERSION: u16 = 42;
const BIGTIFF_VERSION: u16 = 43;

/// One 12-byte directory entry, value field kept raw
#[derive(Debug, Clone, Copy)]
struct IfdEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    value: [u8; 4],
}

/// Walk the IFD chain and describe every page in it
pub fn parse_tiff<R: Read + Seek>(reader: R) -> ImqResult<Vec<PageDescriptor>> {
    let mut reader = HeaderReader::new(reader, Endian::Little);

    let mut order = [0u8; 2];
    reader.read_exact(&mut order)?;
    let endian = match &order {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        _ => {
            return Err(ImqError::CorruptHeader(
                "invalid TIFF byte order mark".to_string(),
            ))
        }
    };
    reader.set_endian(endian);

    match reader.read_u16()? {
        TIFF_VERSION => {}
        BIGTIFF_VERSION => return Err(ImqError::UnsupportedFeature("BigTIFF".to_string())),
        version => {
            return Err(ImqError::CorruptHeader(format!(
                "unexpected TIFF version {}",
                version
            )))
        }
    }

    let mut offset = reader.read_u32()?;
    let mut visited = HashSet::new();
    let mut pages = Vec::new();

    while offset != 0 {
        if pages.len() >= MAX_PAGES {
            warn!(limit = MAX_PAGES, "TIFF page limit reached, ignoring remaining IFDs");
            break;
        }
        if !visited.insert(offset) {
            return Err(ImqError::CorruptHeader(format!(
                "IFD chain loops back to offset {}",
                offset
            )));
        }

        reader.seek_to(offset as u64)?;
        let (entries, next) = read_ifd(&mut reader)?;
        let page = describe_page(&mut reader, pages.len(), &entries)?;
        debug!(
            index = page.index,
            width = page.width(),
            height = page.height(),
            offset,
            "parsed TIFF directory"
        );

        pages.push(page);
        offset = next;
    }

    Ok(pages)
}

fn read_ifd<R: Read + Seek>(reader: &mut HeaderReader<R>) -> ImqResult<(Vec<IfdEntry>, u32)> {
    let count = reader.read_u16()?;
    if count == 0 {
        return Err(ImqError::CorruptHeader("empty IFD".to_string()));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let tag = reader.read_u16()?;
        let field_type = reader.read_u16()?;
        let count = reader.read_u32()?;
        let mut value = [0u8; 4];
        reader.read_exact(&mut value)?;
        entries.push(IfdEntry {
            tag,
            field_type,
            count,
            value,
        });
    }

    let next = reader.read_u32()?;
    Ok((entries, next))
}

fn describe_page<R: Read + Seek>(
    reader: &mut HeaderReader<R>,
    index: usize,
    entries: &[IfdEntry],
) -> ImqResult<PageDescriptor> {
    let width = required_tag(reader, entries, TAG_IMAGE_WIDTH, "ImageWidth")?;
    let height = required_tag(reader, entries, TAG_IMAGE_LENGTH, "ImageLength")?;

    if width == 0 || height == 0 || width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(ImqError::CorruptHeader(format!(
            "page {} has invalid dimensions {}x{}",
            index, width, height
        )));
    }

    // Baseline defaults when the tags are absent
    let samples = optional_tag(reader, entries, TAG_SAMPLES_PER_PIXEL)?.unwrap_or(1);
    let bits = optional_tag(reader, entries, TAG_BITS_PER_SAMPLE)?.unwrap_or(1);

    let orientation = optional_tag(reader, entries, TAG_ORIENTATION)?
        .filter(|value| (1..=8).contains(value))
        .map(|value| value as u8);

    let mut page = PageDescriptor {
        index,
        dimensions: Dimensions::new(width, height),
        channels: ColorChannels::from_count(samples as usize),
        bits_per_sample: u8::try_from(bits).ok(),
        orientation,
    };
    if page.is_transposed() {
        page.dimensions = page.dimensions.transposed();
    }
    Ok(page)
}

fn required_tag<R: Read + Seek>(
    reader: &mut HeaderReader<R>,
    entries: &[IfdEntry],
    tag: u16,
    name: &str,
) -> ImqResult<u32> {
    optional_tag(reader, entries, tag)?
        .ok_or_else(|| ImqError::CorruptHeader(format!("missing {} tag", name)))
}

fn optional_tag<R: Read + Seek>(
    reader: &mut HeaderReader<R>,
    entries: &[IfdEntry],
    tag: u16,
) -> ImqResult<Option<u32>> {
    match entries.iter().find(|e| e.tag == tag) {
        Some(entry) => first_value(reader, entry),
        None => Ok(None),
    }
}

/// First value of an integer entry; values wider than four bytes live at an offset
fn first_value<R: Read + Seek>(
    reader: &mut HeaderReader<R>,
    entry: &IfdEntry,
) -> ImqResult<Option<u32>> {
    if entry.count == 0 {
        return Ok(None);
    }

    let size: usize = match entry.field_type {
        TYPE_BYTE => 1,
        TYPE_SHORT => 2,
        TYPE_LONG => 4,
        _ => return Ok(None),
    };

    let bytes = if size as u64 * entry.count as u64 <= 4 {
        entry.value
    } else {
        reader.seek_to(reader.u32_from(entry.value) as u64)?;
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf[..size])?;
        buf
    };

    Ok(Some(match entry.field_type {
        TYPE_BYTE => bytes[0] as u32,
        TYPE_SHORT => reader.u16_from([bytes[0], bytes[1]]) as u32,
        _ => reader.u32_from(bytes),
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    const IFD_BLOCK: u32 = 2 + 4 * 12 + 4 + 8;

    fn put_u16(out: &mut Vec<u8>, endian: Endian, v: u16) {
        match endian {
            Endian::Little => out.extend_from_slice(&v.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_u32(out: &mut Vec<u8>, endian: Endian, v: u32) {
        match endian {
            Endian::Little => out.extend_from_slice(&v.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_entry(out: &mut Vec<u8>, endian: Endian, tag: u16, ty: u16, count: u32, value: u32) {
        put_u16(out, endian, tag);
        put_u16(out, endian, ty);
        put_u32(out, endian, count);
        if ty == TYPE_SHORT && count <= 2 {
            put_u16(out, endian, value as u16);
            put_u16(out, endian, 0);
        } else {
            put_u32(out, endian, value);
        }
    }

    /// Minimal TIFF with one IFD per `(width, height, samples)` page.
    ///
    /// When `loop_back` is set the last IFD links back to the first one.
    pub(crate) fn tiff_bytes(endian: Endian, pages: &[(u32, u32, u16)], loop_back: bool) -> Vec<u8> {
        let mut out = Vec::new();
        match endian {
            Endian::Little => out.extend_from_slice(b"II"),
            Endian::Big => out.extend_from_slice(b"MM"),
        }
        put_u16(&mut out, endian, 42);
        put_u32(&mut out, endian, if pages.is_empty() { 0 } else { 8 });

        for (i, &(width, height, samples)) in pages.iter().enumerate() {
            let block = 8 + IFD_BLOCK * i as u32;
            let bps_offset = block + 2 + 4 * 12 + 4;

            put_u16(&mut out, endian, 4);
            put_entry(&mut out, endian, TAG_IMAGE_WIDTH, TYPE_LONG, 1, width);
            put_entry(&mut out, endian, TAG_IMAGE_LENGTH, TYPE_SHORT, 1, height);
            if samples > 2 {
                put_entry(&mut out, endian, TAG_BITS_PER_SAMPLE, TYPE_SHORT, samples as u32, bps_offset);
            } else {
                put_entry(&mut out, endian, TAG_BITS_PER_SAMPLE, TYPE_SHORT, samples as u32, 8);
            }
            put_entry(&mut out, endian, TAG_SAMPLES_PER_PIXEL, TYPE_SHORT, 1, samples as u32);

            let next = if i + 1 < pages.len() {
                block + IFD_BLOCK
            } else if loop_back {
                8
            } else {
                0
            };
            put_u32(&mut out, endian, next);

            // Out-of-line BitsPerSample values, padded to the block size
            for _ in 0..4 {
                put_u16(&mut out, endian, 8);
            }
        }
        out
    }

    fn inline_short(tag: u16, value: u16) -> IfdEntry {
        let mut bytes = [0u8; 4];
        bytes[..2].copy_from_slice(&value.to_le_bytes());
        IfdEntry {
            tag,
            field_type: TYPE_SHORT,
            count: 1,
            value: bytes,
        }
    }

    #[test]
    fn test_orientation_tag() {
        let mut reader = HeaderReader::new(Cursor::new(Vec::new()), Endian::Little);
        let mut entries = vec![
            inline_short(TAG_IMAGE_WIDTH, 30),
            inline_short(TAG_IMAGE_LENGTH, 10),
            inline_short(TAG_ORIENTATION, 8),
        ];

        let page = describe_page(&mut reader, 0, &entries).unwrap();
        assert_eq!(page.orientation, Some(8));
        assert_eq!(page.dimensions, Dimensions::new(10, 30));

        entries[2] = inline_short(TAG_ORIENTATION, 2);
        let page = describe_page(&mut reader, 0, &entries).unwrap();
        assert_eq!(page.dimensions, Dimensions::new(30, 10));

        entries[2] = inline_short(TAG_ORIENTATION, 42);
        let page = describe_page(&mut reader, 0, &entries).unwrap();
        assert_eq!(page.orientation, None);
    }

    #[test]
    fn test_multi_page_little_endian() {
        let bytes = tiff_bytes(Endian::Little, &[(320, 240, 3), (17, 1000, 1)], false);
        let pages = parse_tiff(Cursor::new(bytes)).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].dimensions, Dimensions::new(320, 240));
        assert_eq!(pages[0].channels, Some(ColorChannels::RGB));
        assert_eq!(pages[0].bits_per_sample, Some(8));
        assert_eq!(pages[1].index, 1);
        assert_eq!(pages[1].dimensions, Dimensions::new(17, 1000));
        assert_eq!(pages[1].channels, Some(ColorChannels::Gray));
    }

    #[test]
    fn test_big_endian() {
        let bytes = tiff_bytes(Endian::Big, &[(640, 480, 4)], false);
        let pages = parse_tiff(Cursor::new(bytes)).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].dimensions, Dimensions::new(640, 480));
        assert_eq!(pages[0].channels, Some(ColorChannels::RGBA));
    }

    #[test]
    fn test_ifd_loop_is_corrupt() {
        let bytes = tiff_bytes(Endian::Little, &[(10, 10, 1), (20, 20, 1)], true);
        assert!(matches!(
            parse_tiff(Cursor::new(bytes)),
            Err(ImqError::CorruptHeader(_))
        ));
    }

    #[test]
    fn test_no_ifd_means_no_pages() {
        let bytes = tiff_bytes(Endian::Little, &[], false);
        assert!(parse_tiff(Cursor::new(bytes)).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_ifd() {
        let mut bytes = tiff_bytes(Endian::Little, &[(10, 10, 1)], false);
        bytes.truncate(20);
        assert!(matches!(
            parse_tiff(Cursor::new(bytes)),
            Err(ImqError::CorruptHeader(_))
        ));
    }

    #[test]
    fn test_bigtiff_unsupported() {
        let bytes = vec![0x49, 0x49, 0x2B, 0x00, 0x08, 0x00, 0x00, 0x00];
        assert!(matches!(
            parse_tiff(Cursor::new(bytes)),
            Err(ImqError::UnsupportedFeature(_))
        ));
    }
}
