use std::io::Write;

use crate::foundation::config::{OutputFormat, OutputGeometry};
use crate::foundation::core::{CHANNELS, ImageBuffer};
use crate::foundation::error::{PanoError, PanoResult};

/// Compressed thumbnail ready to be written as a response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// MIME type matching `bytes`.
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Keep rows `band_top..band_top + band_height` of `image`.
pub fn crop_band(image: &ImageBuffer, geometry: &OutputGeometry) -> PanoResult<ImageBuffer> {
    let band_end = u64::from(geometry.band_top) + u64::from(geometry.band_height);
    if geometry.band_height == 0 || band_end > u64::from(image.height()) {
        return Err(PanoError::validation(format!(
            "crop band rows {}..{band_end} do not fit an image of height {}",
            geometry.band_top,
            image.height()
        )));
    }
    let stride = image.stride();
    let start = geometry.band_top as usize * stride;
    let end = band_end as usize * stride;
    ImageBuffer::from_rgba8(
        image.width(),
        geometry.band_height,
        image.as_bytes()[start..end].to_vec(),
    )
}

/// Compress `image` to `format`.
pub fn encode(image: &ImageBuffer, format: OutputFormat) -> PanoResult<EncodedImage> {
    let mut bytes = Vec::new();
    encode_into(image, format, &mut bytes)?;
    let (width, height) = (image.width(), image.height());
    tracing::debug!(
        width,
        height,
        len = bytes.len(),
        content_type = format.content_type(),
        "encoded thumbnail"
    );
    Ok(EncodedImage {
        bytes,
        format,
        width,
        height,
    })
}

/// Compress `image` to `format`, streaming into `writer`.
pub fn encode_into<W: Write>(
    image: &ImageBuffer,
    format: OutputFormat,
    mut writer: W,
) -> PanoResult<()> {
    format.validate()?;
    let (width, height) = (image.width(), image.height());

    match format {
        OutputFormat::Jpeg {
            quality,
            background,
        } => {
            let rgb = flatten_over_background(image.as_bytes(), background);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality)
                .encode(&rgb, width, height, image::ExtendedColorType::Rgb8)
                .map_err(|e| PanoError::encode(format!("jpeg {width}x{height}: {e}")))?;
        }
        OutputFormat::WebpLossless => {
            image::codecs::webp::WebPEncoder::new_lossless(&mut writer)
                .encode(image.as_bytes(), width, height, image::ExtendedColorType::Rgba8)
                .map_err(|e| PanoError::encode(format!("webp {width}x{height}: {e}")))?;
        }
    }
    Ok(())
}

/// Composite straight-alpha RGBA8 over an opaque `bg`, returning tightly packed RGB8.
pub(crate) fn flatten_over_background(rgba: &[u8], bg: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / CHANNELS * 3);
    for px in rgba.chunks_exact(CHANNELS) {
        let a = u16::from(px[3]);
        let inv = 255 - a;
        for (c, b) in px[..3].iter().zip(bg) {
            out.push(((u16::from(*c) * a + u16::from(b) * inv + 127) / 255) as u8);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/output.rs"]
mod tests;
