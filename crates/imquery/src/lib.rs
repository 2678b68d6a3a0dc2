//! # imquery
//!
//! Query how many pages an image container holds, and each page's size, without
//! decoding pixel data. Then extract single pages, optionally downsampled, straight
//! into a region of a larger buffer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use imquery::{Dimensions, ColorChannels, Image, Inspector, Rect};
//!
//! let background = Inspector::open("background.jpg");
//! let pages = Inspector::open("pages.tif");
//!
//! if background.page_count() > 0 && pages.page_count() > 0 {
//!     let canvas_size = background.size().unwrap();
//!     let mut canvas = Image::new(canvas_size, ColorChannels::RGB).unwrap();
//!
//!     for i in 0..pages.page_count() {
//!         let page = pages.dimensions(i).unwrap();
//!         if let Some(rect) = Rect::centered(canvas_size, page) {
//!             let mut roi = canvas.roi_mut(rect).unwrap();
//!             let (ok, written) = pages.extract(&mut roi, 2, i).unwrap();
//!             println!("page {}: {} {:?}", i, ok, written);
//!         }
//!     }
//! } else {
//!     println!(
//!         "problem opening files: {}, {}",
//!         background.result_code(),
//!         pages.result_code()
//!     );
//! }
//! ```
//!
//! ## Supported containers
//!
//! - TIFF, one page per image file directory
//! - APNG, one page per animation frame
//! - PNG, JPEG and every other format the `image` crate reads, as a single page

mod inspector;

pub use inspector::Inspector;

// Re-export core types
pub use imquery_core::{
    consts, ColorChannels, ContainerFormat, ContainerInfo, Dimensions, Image, ImqError,
    ImqResult, PageDescriptor, Rect, ResultCode, RoiMut,
};

// Re-export decoder
pub use imquery_decoder::{ColorMode, PageDecoder, ReadMode};

// Re-export encoder
pub use imquery_encoder::{write, write_pages, Compression, MultiPageWriter, WriterOptions};

use std::ops::Range;
use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of pages in a container, or 0 if it cannot be opened
pub fn count_pages<P: AsRef<Path>>(path: P) -> usize {
    Inspector::open(path).page_count()
}

/// Decode the first page of a container
pub fn read<P: AsRef<Path>>(path: P, mode: ReadMode) -> ImqResult<Image> {
    PageDecoder::open(path)?.decode(0, mode)
}

/// Decode the pages in `range`
pub fn read_pages<P: AsRef<Path>>(
    path: P,
    range: Range<usize>,
    mode: ReadMode,
) -> ImqResult<Vec<Image>> {
    PageDecoder::open(path)?.decode_range(range, mode)
}

/// Decode every page of a container
pub fn read_all<P: AsRef<Path>>(path: P, mode: ReadMode) -> ImqResult<Vec<Image>> {
    let decoder = PageDecoder::open(path)?;
    decoder.decode_range(0..decoder.page_count(), mode)
}

/// Read one page of the container at `path` into `destination`.
///
/// The page is reduced by `downsample` (1, 2, 4 or 8), giving `ceil(dim / downsample)`
/// on each axis, then written into the top-left corner of `destination`. Its pixels are
/// converted to the destination's channel layout.
///
/// Returns `Ok((true, rect))` with the rectangle written, in the coordinates of the
/// image `destination` borrows from. If the reduced page is larger than the
/// destination, nothing is written and `Ok((false, Rect::default()))` is returned.
/// An invalid page index is [`ImqError::PageOutOfRange`].
pub fn extract<P: AsRef<Path>>(
    path: P,
    destination: &mut RoiMut<'_>,
    downsample: u32,
    page: usize,
) -> ImqResult<(bool, Rect)> {
    PageDecoder::open(path)?.decode_into(page, downsample, destination)
}
