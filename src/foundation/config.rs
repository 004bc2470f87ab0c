use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{PanoError, PanoResult};

/// Virtual camera placed at the center of the panorama sphere.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraParameters {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f64,
    /// Second rotation applied to the view. Rotates about the same axis as `pitch_degrees`.
    pub yaw_degrees: f64,
    /// First rotation applied to the view.
    pub pitch_degrees: f64,
    /// Near clip plane distance.
    pub near: f64,
    /// Far clip plane distance.
    pub far: f64,
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            fov_y_degrees: 90.0,
            yaw_degrees: 180.0,
            pitch_degrees: 0.0,
            near: 0.05,
            far: 10.0,
        }
    }
}

impl CameraParameters {
    pub fn validate(&self) -> PanoResult<()> {
        let all_finite = [
            self.fov_y_degrees,
            self.yaw_degrees,
            self.pitch_degrees,
            self.near,
            self.far,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(PanoError::validation("camera parameters must be finite"));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(PanoError::validation(format!(
                "camera fov_y_degrees must be in (0, 180), got {}",
                self.fov_y_degrees
            )));
        }
        if self.near <= 0.0 || self.far <= self.near {
            return Err(PanoError::validation(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// Size of the render target and the horizontal band kept from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputGeometry {
    pub width: u32,
    pub height: u32,
    /// Rows kept by the crop.
    pub band_height: u32,
    /// First row kept by the crop.
    pub band_top: u32,
}

impl Default for OutputGeometry {
    fn default() -> Self {
        Self::centered_half(750, 750)
    }
}

impl OutputGeometry {
    /// The vertically centered half of a `width x height` target.
    pub fn centered_half(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            band_height: height / 2,
            band_top: height / 4,
        }
    }

    /// Destination aspect ratio fed to the projection.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn validate(&self) -> PanoResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PanoError::validation(format!(
                "output size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.band_height == 0 {
            return Err(PanoError::validation("output band_height must be > 0"));
        }
        let band_end = u64::from(self.band_top) + u64::from(self.band_height);
        if band_end > u64::from(self.height) {
            return Err(PanoError::validation(format!(
                "output band rows {}..{band_end} exceed height {}",
                self.band_top, self.height
            )));
        }
        Ok(())
    }
}

/// Compressed delivery format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutputFormat {
    /// Lossy JPEG. Pixels are flattened over `background` since JPEG carries no alpha.
    Jpeg {
        quality: u8,
        #[serde(default = "default_jpeg_background")]
        background: [u8; 3],
    },
    /// Lossless WebP with alpha.
    WebpLossless,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::jpeg(82)
    }
}

fn default_jpeg_background() -> [u8; 3] {
    [0, 0, 0]
}

impl OutputFormat {
    /// JPEG at `quality`, flattened over the default black background.
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg {
            quality,
            background: default_jpeg_background(),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::WebpLossless => "image/webp",
        }
    }

    pub fn validate(self) -> PanoResult<()> {
        if let Self::Jpeg { quality, .. } = self
            && !(1..=100).contains(&quality)
        {
            return Err(PanoError::validation(format!(
                "jpeg quality must be in 1..=100, got {quality}"
            )));
        }
        Ok(())
    }
}

/// Threading and chunking controls for the per-pixel loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderThreading {
    /// Split destination rows across a rayon pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Destination rows handed to a worker at a time.
    pub rows_per_chunk: usize,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            rows_per_chunk: 16,
        }
    }
}

impl RenderThreading {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> PanoResult<()> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(PanoError::validation(
                "render threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Everything a thumbnail invocation needs besides the source image.
///
/// Defaults reproduce the production constants: a 750x750 target, the 375-row band starting at
/// row 187, and a 90 degree camera looking forward.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub camera: CameraParameters,
    pub output: OutputGeometry,
    pub format: OutputFormat,
    pub threading: RenderThreading,
}

impl ThumbnailConfig {
    /// Parse a config from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> PanoResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| PanoError::validation(format!("parse thumbnail config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PanoResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PanoError::validation(format!("open thumbnail config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> PanoResult<()> {
        self.camera.validate()?;
        self.output.validate()?;
        self.format.validate()?;
        self.threading.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
