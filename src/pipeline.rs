use crate::assets::fetch::{HttpTransport, fetch_image};
use crate::encode::output::{EncodedImage, crop_band, encode};
use crate::foundation::config::ThumbnailConfig;
use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{PanoError, PanoResult};
use crate::projection::camera::CameraRig;
use crate::render::resample::reproject;

/// Reproject, crop and encode an already decoded equirectangular image.
///
/// Pipeline:
/// 1. [`CameraRig::new`] for the configured camera and target aspect
/// 2. [`reproject`] into the square target
/// 3. [`crop_band`] down to the configured band
/// 4. [`encode`] to the configured format
///
/// Synchronous and CPU-bound; async callers should go through [`Thumbnailer`] or run this on a
/// blocking thread.
#[tracing::instrument(skip(source, config), fields(src_w = source.width(), src_h = source.height()))]
pub fn render_thumbnail(source: &ImageBuffer, config: &ThumbnailConfig) -> PanoResult<EncodedImage> {
    config.validate()?;
    let geometry = &config.output;
    let rig = CameraRig::new(&config.camera, geometry.aspect());
    let full = reproject(
        source,
        &rig,
        geometry.width,
        geometry.height,
        &config.threading,
    )?;
    let band = crop_band(&full, geometry)?;
    encode(&band, config.format)
}

/// Result of [`Thumbnailer::thumbnail`].
#[derive(Clone, Debug)]
pub enum ThumbnailOutcome {
    /// The source changed (or no tag was supplied) and a new thumbnail was produced.
    Fresh {
        image: EncodedImage,
        etag: Option<String>,
    },
    /// The source still carries the supplied tag; keep serving the previous output.
    Unchanged { etag: Option<String> },
}

impl ThumbnailOutcome {
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Fresh { etag, .. } | Self::Unchanged { etag } => etag.as_deref(),
        }
    }
}

/// Fetch-and-render front end for request handlers.
///
/// The fetch runs on the caller's async task; decoding and the per-pixel work run on tokio's
/// blocking pool so request dispatch is never stalled.
#[derive(Debug)]
pub struct Thumbnailer<T> {
    transport: T,
    config: ThumbnailConfig,
}

impl<T: HttpTransport> Thumbnailer<T> {
    pub fn new(transport: T, config: ThumbnailConfig) -> PanoResult<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Produce the thumbnail for `url` unless `etag` still matches the source.
    ///
    /// Non-success statuses surface as [`PanoError::FetchFailed`]; the caller decides on a
    /// fallback asset.
    #[tracing::instrument(skip(self))]
    pub async fn thumbnail(&self, url: &str, etag: Option<&str>) -> PanoResult<ThumbnailOutcome> {
        let fetched = fetch_image(&self.transport, url, etag).await?;
        if !fetched.ok {
            tracing::info!(status = fetched.http_status, "source fetch failed");
            return Err(PanoError::FetchFailed(fetched.http_status));
        }
        let Some(source) = fetched.image else {
            tracing::debug!("source unchanged; skipping render");
            return Ok(ThumbnailOutcome::Unchanged {
                etag: fetched.etag,
            });
        };

        let config = self.config.clone();
        let image = tokio::task::spawn_blocking(move || render_thumbnail(&source, &config))
            .await
            .map_err(|e| PanoError::render(format!("render task failed: {e}")))??;
        tracing::info!(
            bytes = image.bytes.len(),
            content_type = image.content_type(),
            "thumbnail rendered"
        );
        Ok(ThumbnailOutcome::Fresh {
            image,
            etag: fetched.etag,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
