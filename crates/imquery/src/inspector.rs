//! Open-once container inspector

use imquery_core::*;
use imquery_decoder::PageDecoder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Page count and geometry of one container, gathered at open time.
///
/// Opening never fails outright: problems are recorded in [`result_code`](Self::result_code)
/// and leave the inspector with zero pages, so several opens can be checked together
/// in one condition. Per-page accessors return [`ImqError::PageOutOfRange`] for indices
/// outside `0..page_count()`.
#[derive(Debug, Default)]
pub struct Inspector {
    path: PathBuf,
    status: ResultCode,
    info: Option<ContainerInfo>,
    error: Option<ImqError>,
}

impl Inspector {
    /// Read the container's headers. Pixel data is not decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::from_result(path.to_path_buf(), imquery_headers::parse_file(path))
    }

    /// Inspect a container held in memory
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_result(PathBuf::new(), imquery_headers::parse_bytes(data))
    }

    fn from_result(path: PathBuf, result: ImqResult<ContainerInfo>) -> Self {
        match result {
            Ok(info) => {
                debug!(
                    path = %path.display(),
                    format = ?info.format,
                    pages = info.page_count(),
                    "opened container"
                );
                Self {
                    path,
                    status: ResultCode::Success,
                    info: Some(info),
                    error: None,
                }
            }
            Err(err) => {
                let status = err.result_code();
                warn!(
                    path = %path.display(),
                    code = status.code(),
                    error = %err,
                    "failed to open container"
                );
                Self {
                    path,
                    status,
                    info: None,
                    error: Some(err),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages; 0 if the open failed
    pub fn page_count(&self) -> usize {
        self.info.as_ref().map_or(0, ContainerInfo::page_count)
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Status of the open attempt as an integer, 0 on success
    pub fn result_code(&self) -> i32 {
        self.status.code()
    }

    pub fn status(&self) -> ResultCode {
        self.status
    }

    /// The error behind a non-zero result code
    pub fn error(&self) -> Option<&ImqError> {
        self.error.as_ref()
    }

    pub fn format(&self) -> Option<&ContainerFormat> {
        self.info.as_ref().map(|info| &info.format)
    }

    pub fn info(&self) -> Option<&ContainerInfo> {
        self.info.as_ref()
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        self.info
            .as_ref()
            .map(|info| info.pages.as_slice())
            .unwrap_or_default()
    }

    pub fn page(&self, index: usize) -> ImqResult<&PageDescriptor> {
        self.pages().get(index).ok_or(ImqError::PageOutOfRange {
            index,
            count: self.page_count(),
        })
    }

    pub fn width(&self, page: usize) -> ImqResult<u32> {
        Ok(self.page(page)?.width())
    }

    pub fn height(&self, page: usize) -> ImqResult<u32> {
        Ok(self.page(page)?.height())
    }

    pub fn dimensions(&self, page: usize) -> ImqResult<Dimensions> {
        Ok(self.page(page)?.dimensions)
    }

    /// Dimensions of the first page, if the container opened
    pub fn size(&self) -> Option<Dimensions> {
        self.pages().first().map(|page| page.dimensions)
    }

    /// Decoder for this container that reuses the metadata already read
    pub fn decoder(&self) -> ImqResult<PageDecoder> {
        match &self.info {
            Some(info) if !self.path.as_os_str().is_empty() => {
                Ok(PageDecoder::with_info(&self.path, info.clone()))
            }
            Some(_) => Err(ImqError::InvalidParameter(
                "inspector was built from memory; decode with PageDecoder::from_bytes".to_string(),
            )),
            None => Err(ImqError::NoPages),
        }
    }

    /// Extract `page`, reduced by `downsample`, into the top-left corner of `dest`.
    ///
    /// See [`crate::extract`] for the fitting rules.
    pub fn extract(
        &self,
        dest: &mut RoiMut<'_>,
        downsample: u32,
        page: usize,
    ) -> ImqResult<(bool, Rect)> {
        self.page(page)?;
        self.decoder()?.decode_into(page, downsample, dest)
    }
}
