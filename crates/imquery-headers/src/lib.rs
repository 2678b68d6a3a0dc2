//! Header-only parsing for image containers
//!
//! Opening a container here never decodes pixel data. The parsers read just enough of
//! each format to report the page count and per-page geometry:
//!
//! - TIFF: the IFD chain, one page per directory
//! - PNG/APNG: chunks up to the first `IDAT`, one page per animation frame
//! - JPEG: markers up to the frame header
//! - animated WebP: RIFF chunk headers, one page per `ANMF` frame
//!
//! EXIF orientation found in JPEG, PNG and TIFF headers is reported per page, and page
//! dimensions are given as displayed.
//! - anything else the `image` crate recognises: a header probe, one page

pub mod exif;
pub mod jpeg;
pub mod png;
pub mod probe;
pub mod reader;
pub mod signature;
pub mod tiff;
pub mod webp;

use imquery_core::consts::SNIFF_LEN;
use imquery_core::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek};
use std::path::Path;

pub use reader::{Endian, HeaderReader};
pub use signature::sniff;

/// Parse container metadata from a stream positioned at the start of the file
pub fn parse_container<R: BufRead + Seek>(mut reader: R) -> ImqResult<ContainerInfo> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    reader.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    reader.rewind()?;

    let (format, pages) = match sniff(&header) {
        Some(ContainerFormat::Tiff) => (ContainerFormat::Tiff, tiff::parse_tiff(reader)?),
        Some(ContainerFormat::Png) => png::parse_png(reader)?,
        Some(ContainerFormat::Jpeg) => (ContainerFormat::Jpeg, vec![jpeg::parse_jpeg(reader)?]),
        Some(ContainerFormat::WebP) => match webp::parse_webp(&mut reader)? {
            Some(frames) => (ContainerFormat::AnimatedWebP, frames),
            None => {
                reader.rewind()?;
                let (_, page) = probe::probe(reader)?;
                (ContainerFormat::WebP, vec![page])
            }
        },
        _ => {
            let (format, page) = probe::probe(reader)?;
            (format, vec![page])
        }
    };

    if pages.is_empty() {
        return Err(ImqError::NoPages);
    }

    Ok(ContainerInfo { format, pages })
}

/// Parse container metadata from a file
pub fn parse_file<P: AsRef<Path>>(path: P) -> ImqResult<ContainerInfo> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ImqError::EmptyPath);
    }

    let file = File::open(path)?;
    parse_container(BufReader::new(file))
}

/// Parse container metadata from an in-memory buffer
pub fn parse_bytes(data: &[u8]) -> ImqResult<ContainerInfo> {
    parse_container(Cursor::new(data))
}
