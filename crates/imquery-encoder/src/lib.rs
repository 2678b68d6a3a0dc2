//! Multi-page TIFF and single-image writers

use imquery_core::*;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::compression::{Deflate, Lzw, Packbits, Uncompressed};
use tiff::encoder::TiffEncoder;
use tracing::debug;

/// Strip compression for written TIFF pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Lzw,
    Deflate,
    PackBits,
}

/// Writer options
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    pub compression: Compression,
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Appends pages to a multi-page TIFF.
///
/// Each call to [`append`](Self::append) writes one complete directory, so the
/// output is a valid container after every page. Pages may differ in size and
/// channel layout. Gray+alpha pages are stored as RGBA.
pub struct MultiPageWriter<W: Write + Seek> {
    encoder: TiffEncoder<W>,
    options: WriterOptions,
    pages: usize,
}

impl MultiPageWriter<File> {
    /// Create (or truncate) a TIFF file
    pub fn create<P: AsRef<Path>>(path: P, options: WriterOptions) -> ImqResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ImqError::EmptyPath);
        }
        Self::new(File::create(path)?, options)
    }
}

impl<W: Write + Seek> MultiPageWriter<W> {
    pub fn new(writer: W, options: WriterOptions) -> ImqResult<Self> {
        let encoder = TiffEncoder::new(writer).map_err(tiff_error)?;
        Ok(Self {
            encoder,
            options,
            pages: 0,
        })
    }

    /// Number of pages written so far
    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn append(&mut self, image: &Image) -> ImqResult<()> {
        let (width, height) = (image.width(), image.height());
        match image.channels {
            ColorChannels::Gray => self.write_page::<colortype::Gray8>(width, height, &image.data)?,
            ColorChannels::RGB => self.write_page::<colortype::RGB8>(width, height, &image.data)?,
            ColorChannels::RGBA => self.write_page::<colortype::RGBA8>(width, height, &image.data)?,
            ColorChannels::GrayAlpha => {
                let rgba = expand_gray_alpha(&image.data);
                self.write_page::<colortype::RGBA8>(width, height, &rgba)?
            }
        }

        debug!(
            index = self.pages,
            width,
            height,
            channels = ?image.channels,
            "appended TIFF page"
        );
        self.pages += 1;
        Ok(())
    }

    /// Finish writing and return the number of pages
    pub fn finish(self) -> ImqResult<usize> {
        if self.pages == 0 {
            return Err(ImqError::InvalidParameter(
                "multi-page container needs at least one page".to_string(),
            ));
        }
        Ok(self.pages)
    }

    fn write_page<C: ColorType<Inner = u8>>(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> ImqResult<()> {
        let result = match self.options.compression {
            Compression::None => {
                self.encoder
                    .write_image_with_compression::<C, _>(width, height, Uncompressed, data)
            }
            Compression::Lzw => {
                self.encoder
                    .write_image_with_compression::<C, _>(width, height, Lzw::default(), data)
            }
            Compression::Deflate => {
                self.encoder
                    .write_image_with_compression::<C, _>(width, height, Deflate::default(), data)
            }
            Compression::PackBits => {
                self.encoder
                    .write_image_with_compression::<C, _>(width, height, Packbits::default(), data)
            }
        };
        result.map_err(tiff_error)
    }
}

fn expand_gray_alpha(data: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(data.len() * 2);
    for px in data.chunks_exact(2) {
        rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
    }
    rgba
}

fn tiff_error(err: tiff::TiffError) -> ImqError {
    match err {
        tiff::TiffError::IoError(e) => ImqError::IoError(e),
        other => ImqError::EncodingError(other.to_string()),
    }
}

/// Write every image as one page of a new multi-page TIFF
pub fn write_pages<P: AsRef<Path>>(
    path: P,
    images: &[Image],
    options: WriterOptions,
) -> ImqResult<usize> {
    if images.is_empty() {
        return Err(ImqError::InvalidParameter(
            "no pages to write".to_string(),
        ));
    }

    let mut writer = MultiPageWriter::create(path, options)?;
    for image in images {
        writer.append(image)?;
    }
    writer.finish()
}

/// Write a single image; the format follows the file extension
pub fn write<P: AsRef<Path>>(path: P, image: &Image) -> ImqResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ImqError::EmptyPath);
    }

    let color = match image.channels {
        ColorChannels::Gray => image::ExtendedColorType::L8,
        ColorChannels::GrayAlpha => image::ExtendedColorType::La8,
        ColorChannels::RGB => image::ExtendedColorType::Rgb8,
        ColorChannels::RGBA => image::ExtendedColorType::Rgba8,
    };

    image::save_buffer(path, &image.data, image.width(), image.height(), color).map_err(
        |err| match err {
            image::ImageError::IoError(e) => ImqError::IoError(e),
            image::ImageError::Unsupported(e) => ImqError::UnsupportedFormat(e.to_string()),
            other => ImqError::EncodingError(other.to_string()),
        },
    )?;

    debug!(path = %path.display(), width = image.width(), height = image.height(), "wrote image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn solid(width: u32, height: u32, channels: ColorChannels, value: u8) -> Image {
        let pixel = vec![value; channels.count()];
        Image::filled(Dimensions::new(width, height), channels, &pixel).unwrap()
    }

    #[test]
    fn test_mixed_pages_in_memory() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = MultiPageWriter::new(&mut cursor, WriterOptions::default()).unwrap();
            writer.append(&solid(30, 20, ColorChannels::RGB, 1)).unwrap();
            writer.append(&solid(7, 9, ColorChannels::Gray, 2)).unwrap();
            writer.append(&solid(4, 4, ColorChannels::GrayAlpha, 3)).unwrap();
            writer.append(&solid(5, 6, ColorChannels::RGBA, 4)).unwrap();
            assert_eq!(writer.finish().unwrap(), 4);
        }

        let info = imquery_headers::parse_bytes(cursor.get_ref()).unwrap();
        assert_eq!(info.format, ContainerFormat::Tiff);
        assert_eq!(info.page_count(), 4);
        assert_eq!(info.pages[0].dimensions, Dimensions::new(30, 20));
        assert_eq!(info.pages[0].channels, Some(ColorChannels::RGB));
        assert_eq!(info.pages[1].channels, Some(ColorChannels::Gray));
        assert_eq!(info.pages[2].channels, Some(ColorChannels::RGBA));
        assert_eq!(info.pages[3].dimensions, Dimensions::new(5, 6));
    }

    #[test]
    fn test_every_compression() {
        for compression in [
            Compression::None,
            Compression::Lzw,
            Compression::Deflate,
            Compression::PackBits,
        ] {
            let mut cursor = Cursor::new(Vec::new());
            {
                let options = WriterOptions::new().compression(compression);
                let mut writer = MultiPageWriter::new(&mut cursor, options).unwrap();
                writer.append(&solid(16, 8, ColorChannels::RGB, 9)).unwrap();
                writer.append(&solid(8, 16, ColorChannels::Gray, 9)).unwrap();
            }
            let info = imquery_headers::parse_bytes(cursor.get_ref()).unwrap();
            assert_eq!(info.page_count(), 2, "{:?}", compression);
        }
    }

    #[test]
    fn test_empty_page_list_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_pages(dir.path().join("none.tif"), &[], WriterOptions::default());
        assert!(matches!(result, Err(ImqError::InvalidParameter(_))));
    }

    #[test]
    fn test_write_pages_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.tif");
        let images = vec![
            solid(12, 10, ColorChannels::RGB, 100),
            solid(10, 12, ColorChannels::Gray, 50),
        ];

        assert_eq!(write_pages(&path, &images, WriterOptions::default()).unwrap(), 2);
        let info = imquery_headers::parse_file(&path).unwrap();
        assert_eq!(info.page_count(), 2);
        assert_eq!(info.pages[1].dimensions, Dimensions::new(10, 12));
    }

    #[test]
    fn test_write_single_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.png");
        write(&path, &solid(11, 13, ColorChannels::RGBA, 7)).unwrap();

        let info = imquery_headers::parse_file(&path).unwrap();
        assert_eq!(info.format, ContainerFormat::Png);
        assert_eq!(info.pages[0].dimensions, Dimensions::new(11, 13));
    }

    #[test]
    fn test_gray_alpha_expansion() {
        assert_eq!(expand_gray_alpha(&[10, 20, 30, 40]), vec![10, 10, 10, 20, 30, 30, 30, 40]);
    }
}
