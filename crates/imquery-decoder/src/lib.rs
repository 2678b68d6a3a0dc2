//! Page decoding for image containers
//!
//! A [`PageDecoder`] holds the metadata gathered at open time and decodes individual
//! pages on demand. Pixel decoding is delegated to the `tiff` crate for TIFF and to the
//! `image` crate for everything else.

pub mod convert;

pub use convert::ColorMode;

use convert::{image_error, tiff_error};
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, Frames};
use imquery_core::consts::REDUCTION_FACTORS;
use imquery_core::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read options: channel handling, an integer reduction factor and EXIF orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadMode {
    pub color_mode: ColorMode,
    /// Downsample factor, one of 1, 2, 4 or 8
    pub reduction: u32,
    /// Rotate pages into their displayed orientation; pages then match the queried size
    pub apply_orientation: bool,
}

impl Default for ReadMode {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Color,
            reduction: 1,
            apply_orientation: true,
        }
    }
}

impl ReadMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unchanged() -> Self {
        Self::new().color_mode(ColorMode::Unchanged)
    }

    pub fn grayscale() -> Self {
        Self::new().color_mode(ColorMode::Grayscale)
    }

    pub fn color() -> Self {
        Self::new().color_mode(ColorMode::Color)
    }

    pub fn reduced_color(factor: u32) -> Self {
        Self::color().reduction(factor)
    }

    pub fn reduced_grayscale(factor: u32) -> Self {
        Self::grayscale().reduction(factor)
    }

    pub fn color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    /// Set the reduction factor; it is validated when a page is read
    pub fn reduction(mut self, factor: u32) -> Self {
        self.reduction = factor;
        self
    }

    pub fn apply_orientation(mut self, apply: bool) -> Self {
        self.apply_orientation = apply;
        self
    }
}

/// Reject reduction factors other than 1, 2, 4 and 8
pub fn validate_reduction(factor: u32) -> ImqResult<u32> {
    if REDUCTION_FACTORS.contains(&factor) {
        Ok(factor)
    } else {
        Err(ImqError::InvalidParameter(format!(
            "reduction factor {} not in {:?}",
            factor, REDUCTION_FACTORS
        )))
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Decodes pages of an already-queried container
#[derive(Debug, Clone)]
pub struct PageDecoder {
    source: Source,
    info: ContainerInfo,
}

impl PageDecoder {
    /// Query a file and prepare to decode its pages
    pub fn open<P: AsRef<Path>>(path: P) -> ImqResult<Self> {
        let info = imquery_headers::parse_file(path.as_ref())?;
        Ok(Self::with_info(path, info))
    }

    /// Reuse metadata from an earlier query of the same file
    pub fn with_info<P: AsRef<Path>>(path: P, info: ContainerInfo) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
            info,
        }
    }

    /// Query an in-memory container
    pub fn from_bytes<B: Into<Vec<u8>>>(data: B) -> ImqResult<Self> {
        let data = data.into();
        let info = imquery_headers::parse_bytes(&data)?;
        Ok(Self {
            source: Source::Memory(data),
            info,
        })
    }

    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    pub fn page_count(&self) -> usize {
        self.info.page_count()
    }

    /// Decode a single page
    pub fn decode(&self, page: usize, mode: ReadMode) -> ImqResult<Image> {
        self.info.page(page)?;
        self.decode_range(page..page + 1, mode)?
            .pop()
            .ok_or_else(|| ImqError::DecodingError(format!("page {} produced no image", page)))
    }

    /// Decode a contiguous run of pages. An empty range yields no images.
    pub fn decode_range(&self, range: Range<usize>, mode: ReadMode) -> ImqResult<Vec<Image>> {
        let reduction = validate_reduction(mode.reduction)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }
        if range.end > self.page_count() {
            return Err(ImqError::PageOutOfRange {
                index: range.end - 1,
                count: self.page_count(),
            });
        }

        let descriptors = &self.info.pages[range.clone()];
        self.decode_raw(range)?
            .into_iter()
            .zip(descriptors)
            .map(|(image, descriptor)| {
                let image = if mode.apply_orientation {
                    convert::orient(image, descriptor.orientation)
                } else {
                    image
                };
                convert::to_image(convert::reduce(image, reduction), mode.color_mode)
            })
            .collect()
    }

    /// Decode one page, downsampled by `reduction`, into the top-left corner of `dest`.
    ///
    /// The fit check uses header geometry only, so an undersized destination costs no
    /// decoding. Returns `(false, Rect::default())` when the reduced page does not fit,
    /// leaving `dest` untouched; otherwise `(true, rect)` with the rectangle written in
    /// parent coordinates. Pixels are converted to the destination's channel layout.
    pub fn decode_into(
        &self,
        page: usize,
        reduction: u32,
        dest: &mut RoiMut<'_>,
    ) -> ImqResult<(bool, Rect)> {
        let reduction = validate_reduction(reduction)?;
        let descriptor = *self.info.page(page)?;
        let target = descriptor.dimensions.reduced(reduction);

        if !target.fits_within(dest.dimensions()) {
            debug!(
                page,
                width = target.width,
                height = target.height,
                dest_width = dest.dimensions().width,
                dest_height = dest.dimensions().height,
                "destination too small for page"
            );
            return Ok((false, Rect::default()));
        }

        let decoded = self
            .decode_raw(page..page + 1)?
            .pop()
            .ok_or_else(|| ImqError::DecodingError(format!("page {} produced no image", page)))?;
        let decoded = convert::orient(decoded, descriptor.orientation);
        let image = convert::to_channels(convert::reduce(decoded, reduction), dest.channels())?;

        // Pixel data may disagree with the header; never write past the region
        if !image.dimensions.fits_within(dest.dimensions()) {
            return Ok((false, Rect::default()));
        }

        let rect = dest.write_image(&image)?;
        debug!(page, reduction, ?rect, "decoded page into region");
        Ok((true, rect))
    }

    fn decode_raw(&self, range: Range<usize>) -> ImqResult<Vec<DynamicImage>> {
        match &self.source {
            Source::File(path) => {
                let reader = BufReader::new(File::open(path)?);
                decode_pages(reader, &self.info.format, range)
            }
            Source::Memory(data) => decode_pages(Cursor::new(data.as_slice()), &self.info.format, range),
        }
    }
}

fn decode_pages<R: BufRead + Seek>(
    reader: R,
    format: &ContainerFormat,
    range: Range<usize>,
) -> ImqResult<Vec<DynamicImage>> {
    let expected = range.len();
    let pages = match format {
        ContainerFormat::Tiff => tiff_pages(reader, range)?,
        ContainerFormat::Apng => apng_frames(reader, range)?,
        ContainerFormat::AnimatedWebP => webp_frames(reader, range)?,
        _ => {
            let image = image::ImageReader::new(reader)
                .with_guessed_format()?
                .decode()
                .map_err(image_error)?;
            vec![image]
        }
    };

    if pages.len() != expected {
        return Err(ImqError::DecodingError(format!(
            "expected {} pages, decoded {}",
            expected,
            pages.len()
        )));
    }
    Ok(pages)
}

fn tiff_pages<R: BufRead + Seek>(reader: R, range: Range<usize>) -> ImqResult<Vec<DynamicImage>> {
    let mut decoder = tiff::decoder::Decoder::new(reader).map_err(tiff_error)?;

    let mut pages = Vec::with_capacity(range.len());
    for index in range {
        decoder.seek_to_image(index).map_err(tiff_error)?;
        let page = convert::tiff_page(&mut decoder)?;
        debug!(index, width = page.width(), height = page.height(), "decoded TIFF page");
        pages.push(page);
    }
    Ok(pages)
}

fn apng_frames<R: BufRead + Seek>(reader: R, range: Range<usize>) -> ImqResult<Vec<DynamicImage>> {
    let decoder = PngDecoder::new(reader).map_err(image_error)?;
    animation_frames(decoder.apng().map_err(image_error)?.into_frames(), range)
}

fn webp_frames<R: BufRead + Seek>(reader: R, range: Range<usize>) -> ImqResult<Vec<DynamicImage>> {
    let decoder = WebPDecoder::new(reader).map_err(image_error)?;
    animation_frames(decoder.into_frames(), range)
}

/// Composited frames in `range`, each at the full canvas size
fn animation_frames(frames: Frames<'_>, range: Range<usize>) -> ImqResult<Vec<DynamicImage>> {
    frames
        .skip(range.start)
        .take(range.len())
        .map(|frame| {
            frame
                .map(|f| DynamicImage::ImageRgba8(f.into_buffer()))
                .map_err(image_error)
        })
        .collect()
}
