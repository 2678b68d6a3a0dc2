//! Conversions between imquery images and the codec crates' pixel types
//!
//! Channel conversion and resampling are delegated to the `image` crate.

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageBuffer};
use imquery_core::*;
use tiff::decoder::{Decoder, DecodingResult};

/// How decoded pixels are mapped to channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Keep the page's own channel layout, narrowed to 8 bits
    Unchanged,
    /// Convert to single-channel luma
    Grayscale,
    /// Convert to three-channel RGB, dropping alpha
    Color,
}

/// Rotate or flip a decoded page into its displayed orientation.
///
/// `orientation` is the EXIF value from the page header; absent or invalid values
/// leave the image as stored.
pub fn orient(mut image: DynamicImage, orientation: Option<u8>) -> DynamicImage {
    if let Some(orientation) = orientation.and_then(Orientation::from_exif) {
        image.apply_orientation(orientation);
    }
    image
}

/// Downsample by `factor`, rounding each axis up. A factor of 1 is a no-op.
pub fn reduce(image: DynamicImage, factor: u32) -> DynamicImage {
    if factor <= 1 {
        return image;
    }
    let target = Dimensions::new(image.width(), image.height()).reduced(factor);
    image.resize_exact(target.width, target.height, FilterType::Triangle)
}

/// Convert a decoded image according to `mode`
pub fn to_image(image: DynamicImage, mode: ColorMode) -> ImqResult<Image> {
    let channels = match mode {
        ColorMode::Unchanged => {
            let color = image.color();
            match (color.has_color(), color.has_alpha()) {
                (false, false) => ColorChannels::Gray,
                (false, true) => ColorChannels::GrayAlpha,
                (true, false) => ColorChannels::RGB,
                (true, true) => ColorChannels::RGBA,
            }
        }
        ColorMode::Grayscale => ColorChannels::Gray,
        ColorMode::Color => ColorChannels::RGB,
    };
    to_channels(image, channels)
}

/// Convert a decoded image to an explicit 8-bit channel layout
pub fn to_channels(image: DynamicImage, channels: ColorChannels) -> ImqResult<Image> {
    let dimensions = Dimensions::new(image.width(), image.height());
    let data = match channels {
        ColorChannels::Gray => image.into_luma8().into_raw(),
        ColorChannels::GrayAlpha => image.into_luma_alpha8().into_raw(),
        ColorChannels::RGB => image.into_rgb8().into_raw(),
        ColorChannels::RGBA => image.into_rgba8().into_raw(),
    };
    Image::from_raw(dimensions, channels, data)
}

/// View an imquery image as an `image` crate buffer
pub fn to_dynamic(image: &Image) -> ImqResult<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    let data = image.data.clone();
    let dynamic = match image.channels {
        ColorChannels::Gray => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        ColorChannels::GrayAlpha => {
            ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLumaA8)
        }
        ColorChannels::RGB => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        ColorChannels::RGBA => {
            ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
        }
    };
    dynamic.ok_or(ImqError::BufferTooSmall {
        expected: image.pixel_count() * image.channel_count(),
        actual: image.data.len(),
    })
}

/// Decode the page the TIFF decoder is currently positioned on
pub fn tiff_page<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> ImqResult<DynamicImage> {
    let (width, height) = decoder.dimensions().map_err(tiff_error)?;
    let colortype = decoder.colortype().map_err(tiff_error)?;
    let result = decoder.read_image().map_err(tiff_error)?;

    let image = match (colortype, result) {
        (tiff::ColorType::Gray(8), DecodingResult::U8(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        (tiff::ColorType::Gray(16), DecodingResult::U16(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageLuma16)
        }
        (tiff::ColorType::GrayA(8), DecodingResult::U8(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8)
        }
        (tiff::ColorType::GrayA(16), DecodingResult::U16(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageLumaA16)
        }
        (tiff::ColorType::RGB(8), DecodingResult::U8(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        (tiff::ColorType::RGB(16), DecodingResult::U16(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgb16)
        }
        (tiff::ColorType::RGBA(8), DecodingResult::U8(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        (tiff::ColorType::RGBA(16), DecodingResult::U16(buf)) => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgba16)
        }
        (other, _) => {
            return Err(ImqError::UnsupportedFeature(format!(
                "TIFF color type {:?}",
                other
            )))
        }
    };

    image.ok_or_else(|| {
        ImqError::DecodingError(format!(
            "TIFF pixel data shorter than {}x{} page",
            width, height
        ))
    })
}

pub(crate) fn tiff_error(err: tiff::TiffError) -> ImqError {
    match err {
        tiff::TiffError::IoError(e) => ImqError::IoError(e),
        tiff::TiffError::UnsupportedError(e) => ImqError::UnsupportedFeature(e.to_string()),
        other => ImqError::DecodingError(other.to_string()),
    }
}

pub(crate) fn image_error(err: image::ImageError) -> ImqError {
    match err {
        image::ImageError::IoError(e) => ImqError::IoError(e),
        image::ImageError::Unsupported(e) => ImqError::UnsupportedFeature(e.to_string()),
        other => ImqError::DecodingError(other.to_string()),
    }
}
