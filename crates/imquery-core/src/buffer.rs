//! Pixel buffers and region-of-interest views

use crate::{ColorChannels, Dimensions, ImqError, ImqResult, Rect};

/// An 8-bit interleaved image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub dimensions: Dimensions,
    pub channels: ColorChannels,
    pub data: Vec<u8>,
}

impl Image {
    /// Create a zero-filled image
    pub fn new(dimensions: Dimensions, channels: ColorChannels) -> ImqResult<Self> {
        check_dimensions(dimensions)?;

        let data = vec![0; dimensions.pixel_count() * channels.count()];
        Ok(Self {
            dimensions,
            channels,
            data,
        })
    }

    /// Wrap an existing interleaved buffer
    pub fn from_raw(
        dimensions: Dimensions,
        channels: ColorChannels,
        data: Vec<u8>,
    ) -> ImqResult<Self> {
        check_dimensions(dimensions)?;

        let expected = dimensions.pixel_count() * channels.count();
        if data.len() != expected {
            return Err(ImqError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            dimensions,
            channels,
            data,
        })
    }

    /// Create an image with every pixel set to `pixel`
    pub fn filled(dimensions: Dimensions, channels: ColorChannels, pixel: &[u8]) -> ImqResult<Self> {
        let mut image = Self::new(dimensions, channels)?;
        image.fill(pixel)?;
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn pixel_count(&self) -> usize {
        self.dimensions.pixel_count()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.count()
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width() as usize * self.channel_count()
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride();
        &self.data[start..start + self.stride()]
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let cn = self.channel_count();
        let start = y as usize * self.stride() + x as usize * cn;
        &self.data[start..start + cn]
    }

    pub fn fill(&mut self, pixel: &[u8]) -> ImqResult<()> {
        if pixel.len() != self.channel_count() {
            return Err(ImqError::InvalidParameter(format!(
                "fill value has {} samples, image has {} channels",
                pixel.len(),
                self.channel_count()
            )));
        }
        for chunk in self.data.chunks_exact_mut(pixel.len()) {
            chunk.copy_from_slice(pixel);
        }
        Ok(())
    }

    /// Copy a rectangle out into a new image
    pub fn crop(&self, rect: Rect) -> ImqResult<Image> {
        if rect.is_empty() || !rect.is_inside(self.dimensions) {
            return Err(ImqError::InvalidParameter(format!(
                "crop {:?} outside {}x{} image",
                rect,
                self.width(),
                self.height()
            )));
        }

        let cn = self.channel_count();
        let row_len = rect.width as usize * cn;
        let mut data = Vec::with_capacity(row_len * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * self.stride() + rect.x as usize * cn;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Image::from_raw(rect.dimensions(), self.channels, data)
    }

    /// Borrow a rectangle of this image for writing
    pub fn roi_mut(&mut self, rect: Rect) -> ImqResult<RoiMut<'_>> {
        if !rect.is_inside(self.dimensions) {
            return Err(ImqError::InvalidParameter(format!(
                "region {:?} outside {}x{} image",
                rect,
                self.width(),
                self.height()
            )));
        }
        Ok(RoiMut { parent: self, rect })
    }

    /// Borrow the whole image as a writable region
    pub fn as_roi_mut(&mut self) -> RoiMut<'_> {
        let rect = Rect::full(self.dimensions);
        RoiMut { parent: self, rect }
    }
}

fn check_dimensions(dimensions: Dimensions) -> ImqResult<()> {
    if dimensions.is_empty() {
        return Err(ImqError::InvalidDimensions {
            width: dimensions.width,
            height: dimensions.height,
        });
    }
    Ok(())
}

/// A writable rectangular view into a larger [`Image`].
///
/// Rows are addressed through the parent's stride, so writes land directly in the
/// parent buffer.
#[derive(Debug)]
pub struct RoiMut<'a> {
    parent: &'a mut Image,
    rect: Rect,
}

impl RoiMut<'_> {
    /// Position and size of the region in parent coordinates
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn dimensions(&self) -> Dimensions {
        self.rect.dimensions()
    }

    pub fn channels(&self) -> ColorChannels {
        self.parent.channels
    }

    /// Row `y` of the region, counted from the region's top edge
    pub fn row_mut(&mut self, y: u32) -> ImqResult<&mut [u8]> {
        if y >= self.rect.height {
            return Err(ImqError::InvalidParameter(format!(
                "row {} outside region of height {}",
                y, self.rect.height
            )));
        }
        let cn = self.parent.channel_count();
        let stride = self.parent.stride();
        let start = (self.rect.y + y) as usize * stride + self.rect.x as usize * cn;
        Ok(&mut self.parent.data[start..start + self.rect.width as usize * cn])
    }

    pub fn fill(&mut self, pixel: &[u8]) -> ImqResult<()> {
        if pixel.len() != self.parent.channel_count() {
            return Err(ImqError::InvalidParameter(format!(
                "fill value has {} samples, region has {} channels",
                pixel.len(),
                self.parent.channel_count()
            )));
        }
        for y in 0..self.rect.height {
            for chunk in self.row_mut(y)?.chunks_exact_mut(pixel.len()) {
                chunk.copy_from_slice(pixel);
            }
        }
        Ok(())
    }

    /// Copy `image` into the top-left corner of the region.
    ///
    /// Returns the rectangle written, in parent coordinates. The image must match the
    /// region's channel layout and fit inside it; otherwise nothing is written.
    pub fn write_image(&mut self, image: &Image) -> ImqResult<Rect> {
        if image.channels != self.channels() {
            return Err(ImqError::InvalidParameter(format!(
                "image has {:?} channels, region has {:?}",
                image.channels,
                self.channels()
            )));
        }
        if !image.dimensions.fits_within(self.dimensions()) {
            return Err(ImqError::BufferTooSmall {
                expected: image.pixel_count(),
                actual: self.dimensions().pixel_count(),
            });
        }

        for y in 0..image.height() {
            let src = image.row(y);
            self.row_mut(y)?[..src.len()].copy_from_slice(src);
        }

        Ok(Rect::new(
            self.rect.x,
            self.rect.y,
            image.width(),
            image.height(),
        ))
    }
}
