//! Container and page metadata

use crate::{ColorChannels, Dimensions, ImqError, ImqResult};

/// Container format recognised by the header parsers
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerFormat {
    /// Baseline TIFF, possibly multi-page
    Tiff,
    /// Single-frame PNG
    Png,
    /// Animated PNG; each animation frame is a page
    Apng,
    /// JPEG/JFIF
    Jpeg,
    /// Still WebP
    WebP,
    /// Animated WebP; each animation frame is a page
    AnimatedWebP,
    /// Any other single-page format known to the `image` crate
    Other(String),
}

impl ContainerFormat {
    pub fn is_multi_page(&self) -> bool {
        matches!(
            self,
            ContainerFormat::Tiff | ContainerFormat::Apng | ContainerFormat::AnimatedWebP
        )
    }
}

/// Geometry of one page, read from headers without decoding pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageDescriptor {
    /// 0-based position in the container
    pub index: usize,
    /// Size as displayed, after any EXIF orientation is applied
    pub dimensions: Dimensions,
    /// Channel layout when the header states it
    pub channels: Option<ColorChannels>,
    /// Bits per sample of the first channel when the header states it
    pub bits_per_sample: Option<u8>,
    /// EXIF orientation (1..=8) when the header carries one
    pub orientation: Option<u8>,
}

impl PageDescriptor {
    pub fn new(index: usize, dimensions: Dimensions) -> Self {
        Self {
            index,
            dimensions,
            channels: None,
            bits_per_sample: None,
            orientation: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Whether the stored pixels are transposed relative to the displayed page
    pub fn is_transposed(&self) -> bool {
        matches!(self.orientation, Some(5..=8))
    }
}

/// Everything learned about a container at open time
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerInfo {
    pub format: ContainerFormat,
    pub pages: Vec<PageDescriptor>,
}

impl ContainerInfo {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page descriptor at `index`, or [`ImqError::PageOutOfRange`]
    pub fn page(&self, index: usize) -> ImqResult<&PageDescriptor> {
        self.pages.get(index).ok_or(ImqError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_lookup() {
        let info = ContainerInfo {
            format: ContainerFormat::Tiff,
            pages: vec![
                PageDescriptor::new(0, Dimensions::new(10, 20)),
                PageDescriptor::new(1, Dimensions::new(30, 40)),
            ],
        };

        assert_eq!(info.page(1).unwrap().width(), 30);
        assert!(matches!(
            info.page(2),
            Err(ImqError::PageOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_orientation_transposes() {
        let mut page = PageDescriptor::new(0, Dimensions::new(4, 8));
        assert!(!page.is_transposed());
        page.orientation = Some(3);
        assert!(!page.is_transposed());
        page.orientation = Some(6);
        assert!(page.is_transposed());
        assert!(ContainerFormat::AnimatedWebP.is_multi_page());
        assert!(!ContainerFormat::WebP.is_multi_page());
    }
}
