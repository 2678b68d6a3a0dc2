//! Format detection from leading magic bytes

use imquery_core::ContainerFormat;

/// Little-endian TIFF signature: `II*\0`
pub const TIFF_LE_SIGNATURE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];

/// Big-endian TIFF signature: `MM\0*`
pub const TIFF_BE_SIGNATURE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];

/// BigTIFF signatures (version 43), recognised so they can be rejected explicitly
pub const BIGTIFF_LE_SIGNATURE: [u8; 4] = [0x49, 0x49, 0x2B, 0x00];
pub const BIGTIFF_BE_SIGNATURE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2B];

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG start-of-image marker followed by the next marker prefix
pub const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// RIFF container tag; WebP files carry `WEBP` at offset 8
pub const RIFF_SIGNATURE: [u8; 4] = *b"RIFF";
pub const WEBP_FORM: [u8; 4] = *b"WEBP";

/// Identify the container formats parsed natively.
///
/// Returns `None` for anything else; the caller then falls back to probing through
/// the `image` crate. APNG cannot be told apart from PNG by signature alone and is
/// reported as [`ContainerFormat::Png`].
pub fn sniff(header: &[u8]) -> Option<ContainerFormat> {
    let tiff = [
        TIFF_LE_SIGNATURE,
        TIFF_BE_SIGNATURE,
        BIGTIFF_LE_SIGNATURE,
        BIGTIFF_BE_SIGNATURE,
    ];
    if tiff.iter().any(|sig| header.starts_with(sig)) {
        Some(ContainerFormat::Tiff)
    } else if header.starts_with(&PNG_SIGNATURE) {
        Some(ContainerFormat::Png)
    } else if header.starts_with(&JPEG_SIGNATURE) {
        Some(ContainerFormat::Jpeg)
    } else if header.starts_with(&RIFF_SIGNATURE) && header.get(8..12) == Some(&WEBP_FORM[..]) {
        Some(ContainerFormat::WebP)
    } else {
        None
    }
}
