//! Header probe for formats without a native parser

use imquery_core::*;
use std::io::{BufRead, Seek};
use tracing::debug;

/// Ask the `image` crate for format and dimensions; only the header is read
pub fn probe<R: BufRead + Seek>(reader: R) -> ImqResult<(ContainerFormat, PageDescriptor)> {
    let reader = image::ImageReader::new(reader).with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        ImqError::UnsupportedFormat("signature not recognised".to_string())
    })?;

    let (width, height) = reader.into_dimensions().map_err(probe_error)?;
    if width == 0 || height == 0 {
        return Err(ImqError::CorruptHeader(format!(
            "invalid dimensions {}x{}",
            width, height
        )));
    }

    debug!(?format, width, height, "probed single-page header");
    Ok((
        ContainerFormat::Other(format!("{:?}", format)),
        PageDescriptor::new(0, Dimensions::new(width, height)),
    ))
}

fn probe_error(err: image::ImageError) -> ImqError {
    match err {
        image::ImageError::IoError(e) => ImqError::IoError(e),
        image::ImageError::Unsupported(e) => ImqError::UnsupportedFormat(e.to_string()),
        image::ImageError::Limits(e) => ImqError::UnsupportedFeature(e.to_string()),
        other => ImqError::CorruptHeader(other.to_string()),
    }
}
