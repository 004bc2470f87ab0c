use crate::foundation::error::{PanoError, PanoResult};

/// Bytes per pixel for every buffer in the pipeline (RGBA8).
pub const CHANNELS: usize = 4;

/// Tightly packed, row-major RGBA8 pixels.
///
/// Buffers are produced once and then only read or replaced, never edited in place by a later
/// stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap raw RGBA8 bytes, checking that the length matches the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> PanoResult<Self> {
        if width == 0 || height == 0 {
            return Err(PanoError::validation(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(PanoError::validation(format!(
                "rgba8 buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> PanoResult<Self> {
        let mut data = Vec::with_capacity(byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::from_rgba8(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        CHANNELS
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Byte length of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Read the pixel at `(x, y)`; `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

pub(crate) fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
