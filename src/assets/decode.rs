use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{PanoError, PanoResult};

/// Decode an encoded image into straight RGBA8.
///
/// Any format the `image` crate recognizes is accepted. Sources without an alpha channel come out
/// fully opaque.
pub fn decode_image(bytes: &[u8]) -> PanoResult<ImageBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PanoError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageBuffer::from_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
