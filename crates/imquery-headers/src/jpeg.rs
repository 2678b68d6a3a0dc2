//! JPEG marker scan for the frame header

use crate::exif;
use crate::reader::{Endian, HeaderReader};
use imquery_core::*;
use std::io::{Read, Seek};
use tracing::debug;

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP1: u8 = 0xE1;
const TEM: u8 = 0x01;

/// Start-of-frame markers: C0..=CF except DHT (C4), JPG (C8) and DAC (CC)
fn is_sof(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Markers that stand alone without a length field
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0xD0..=0xD7) || marker == TEM
}

/// Scan markers up to the frame header and describe the single page
pub fn parse_jpeg<R: Read + Seek>(reader: R) -> ImqResult<PageDescriptor> {
    let mut reader = HeaderReader::new(reader, Endian::Big);

    if reader.read_u8()? != MARKER_PREFIX || reader.read_u8()? != SOI {
        return Err(ImqError::CorruptHeader("missing JPEG SOI marker".to_string()));
    }

    let mut orientation = None;
    loop {
        if reader.read_u8()? != MARKER_PREFIX {
            return Err(ImqError::CorruptHeader(
                "expected JPEG marker prefix".to_string(),
            ));
        }

        let mut marker = reader.read_u8()?;
        while marker == MARKER_PREFIX {
            marker = reader.read_u8()?;
        }

        if is_standalone(marker) {
            continue;
        }
        if marker == SOS || marker == EOI {
            return Err(ImqError::CorruptHeader(
                "JPEG has no frame header before scan data".to_string(),
            ));
        }

        let length = reader.read_u16()?;
        if length < 2 {
            return Err(ImqError::CorruptHeader(format!(
                "invalid JPEG segment length {}",
                length
            )));
        }

        if is_sof(marker) {
            let precision = reader.read_u8()?;
            let height = reader.read_u16()? as u32;
            let width = reader.read_u16()? as u32;
            let components = reader.read_u8()?;

            // Height 0 defers to a DNL marker after the first scan
            if width == 0 || height == 0 {
                return Err(ImqError::UnsupportedFeature(
                    "JPEG frame without explicit dimensions".to_string(),
                ));
            }

            let channels = match components {
                1 => ColorChannels::Gray,
                3 | 4 => ColorChannels::RGB,
                n => {
                    return Err(ImqError::UnsupportedFeature(format!(
                        "JPEG with {} components",
                        n
                    )))
                }
            };

            let mut page = PageDescriptor {
                index: 0,
                dimensions: Dimensions::new(width, height),
                channels: Some(channels),
                bits_per_sample: Some(precision),
                orientation,
            };
            if page.is_transposed() {
                page.dimensions = page.dimensions.transposed();
            }

            debug!(marker, width, height, components, ?orientation, "parsed JPEG frame header");
            return Ok(page);
        }

        if marker == APP1 && orientation.is_none() {
            let mut payload = vec![0u8; length as usize - 2];
            reader.read_exact(&mut payload)?;
            orientation = exif::app1_orientation(&payload);
            continue;
        }

        reader.skip(length as i64 - 2)?;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) fn jpeg_bytes(width: u16, height: u16, components: u8) -> Vec<u8> {
        jpeg_with_orientation(width, height, components, None)
    }

    pub(crate) fn jpeg_with_orientation(
        width: u16,
        height: u16,
        components: u8,
        orientation: Option<u16>,
    ) -> Vec<u8> {
        let mut out = vec![0xFF, SOI];
        // APP0 JFIF
        out.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        out.extend_from_slice(b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
        if let Some(value) = orientation {
            let mut payload = exif::EXIF_IDENTIFIER.to_vec();
            payload.extend_from_slice(&exif::tests::exif_block(Endian::Big, value));
            out.extend_from_slice(&[0xFF, APP1]);
            out.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
            out.extend_from_slice(&payload);
        }
        // DQT with padding bytes before the marker
        out.extend_from_slice(&[0xFF, 0xFF, 0xDB, 0x00, 0x04, 0x00, 0x01]);
        // SOF0
        out.extend_from_slice(&[0xFF, 0xC0]);
        out.extend_from_slice(&(8 + 3 * components as u16).to_be_bytes());
        out.push(8);
        out.extend_from_slice(&height.to_be_bytes());
        out.extend_from_slice(&width.to_be_bytes());
        out.push(components);
        for id in 0..components {
            out.extend_from_slice(&[id + 1, 0x11, 0]);
        }
        out.extend_from_slice(&[0xFF, SOS, 0x00, 0x02]);
        out.extend_from_slice(&[0xFF, EOI]);
        out
    }

    #[test]
    fn test_frame_header() {
        let page = parse_jpeg(Cursor::new(jpeg_bytes(1024, 768, 3))).unwrap();
        assert_eq!(page.dimensions, Dimensions::new(1024, 768));
        assert_eq!(page.channels, Some(ColorChannels::RGB));
        assert_eq!(page.bits_per_sample, Some(8));
    }

    #[test]
    fn test_exif_orientation_swaps_axes() {
        let page = parse_jpeg(Cursor::new(jpeg_with_orientation(640, 480, 3, Some(6)))).unwrap();
        assert_eq!(page.orientation, Some(6));
        assert_eq!(page.dimensions, Dimensions::new(480, 640));

        let page = parse_jpeg(Cursor::new(jpeg_with_orientation(640, 480, 3, Some(3)))).unwrap();
        assert_eq!(page.orientation, Some(3));
        assert_eq!(page.dimensions, Dimensions::new(640, 480));

        let page = parse_jpeg(Cursor::new(jpeg_bytes(640, 480, 3))).unwrap();
        assert_eq!(page.orientation, None);
    }

    #[test]
    fn test_grayscale_frame() {
        let page = parse_jpeg(Cursor::new(jpeg_bytes(7, 9, 1))).unwrap();
        assert_eq!(page.channels, Some(ColorChannels::Gray));
    }

    #[test]
    fn test_scan_before_frame() {
        let bytes = vec![0xFF, SOI, 0xFF, SOS, 0x00, 0x02];
        assert!(matches!(
            parse_jpeg(Cursor::new(bytes)),
            Err(ImqError::CorruptHeader(_))
        ));
    }

    #[test]
    fn test_sof_classification() {
        assert!(is_sof(0xC0));
        assert!(is_sof(0xC2));
        assert!(!is_sof(0xC4));
        assert!(!is_sof(0xCC));
        assert!(!is_sof(0xDB));
    }
}
