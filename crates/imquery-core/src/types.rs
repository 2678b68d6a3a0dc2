//! Core types for imquery

use num_integer::Integer;

/// Number of interleaved 8-bit channels in a pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorChannels {
    /// Grayscale
    Gray = 1,
    /// Grayscale + Alpha
    GrayAlpha = 2,
    /// RGB
    RGB = 3,
    /// RGBA
    RGBA = 4,
}

impl ColorChannels {
    pub fn count(&self) -> usize {
        *self as usize
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorChannels::GrayAlpha | ColorChannels::RGBA)
    }

    pub fn has_color(&self) -> bool {
        matches!(self, ColorChannels::RGB | ColorChannels::RGBA)
    }

    /// Layout for a given number of interleaved samples per pixel
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ColorChannels::Gray),
            2 => Some(ColorChannels::GrayAlpha),
            3 => Some(ColorChannels::RGB),
            4 => Some(ColorChannels::RGBA),
            _ => None,
        }
    }
}

/// Image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Dimensions after downsampling by `factor`, rounding up on each axis.
    ///
    /// A factor of 0 is treated as 1.
    pub fn reduced(&self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            width: Integer::div_ceil(&self.width, &factor),
            height: Integer::div_ceil(&self.height, &factor),
        }
    }

    /// Width and height swapped
    pub fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Whether `self` fits inside `outer` on both axes
    pub fn fits_within(&self, outer: Dimensions) -> bool {
        self.width <= outer.width && self.height <= outer.height
    }
}

/// Rectangle in pixel coordinates of a parent buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole buffer of the given dimensions
    pub fn full(dimensions: Dimensions) -> Self {
        Self::new(0, 0, dimensions.width, dimensions.height)
    }

    /// Rectangle of size `inner` centred inside `outer`, or `None` if it does not fit
    pub fn centered(outer: Dimensions, inner: Dimensions) -> Option<Self> {
        if !inner.fits_within(outer) {
            return None;
        }
        Some(Self::new(
            (outer.width - inner.width) / 2,
            (outer.height - inner.height) / 2,
            inner.width,
            inner.height,
        ))
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Whether the rectangle lies entirely inside a buffer of the given dimensions
    pub fn is_inside(&self, dimensions: Dimensions) -> bool {
        self.right() <= dimensions.width as u64 && self.bottom() <= dimensions.height as u64
    }
}

/// Status of the most recent open attempt.
///
/// | code | meaning |
/// |------|---------|
/// | 0 | container opened and at least one page enumerated |
/// | 1 | path was empty |
/// | 2 | file does not exist |
/// | 3 | permission denied |
/// | 4 | other I/O failure |
/// | 5 | format not recognised or not supported |
/// | 6 | header or directory chain malformed or truncated |
/// | 7 | container parsed but holds no pages |
/// | 8 | never opened |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    EmptyPath = 1,
    NotFound = 2,
    PermissionDenied = 3,
    Io = 4,
    UnsupportedFormat = 5,
    CorruptHeader = 6,
    NoPages = 7,
    #[default]
    Unopened = 8,
}

impl ResultCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        *self == ResultCode::Success
    }
}
