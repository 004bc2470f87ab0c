//! panothumb turns a 360° equirectangular panorama into a fixed "straight ahead" thumbnail.
//!
//! # Pipeline overview
//!
//! 1. **Fetch**: conditional GET of the source image, skipped decode when the freshness tag
//!    still matches ([`fetch_image`])
//! 2. **Camera**: projection and view matrices for the fixed virtual camera ([`CameraRig`])
//! 3. **Map**: destination pixel -> view ray -> sphere -> source pixel ([`SphereMapper`])
//! 4. **Resample**: nearest-neighbor copy, row-parallel ([`reproject`])
//! 5. **Encode**: crop the centered band and compress it ([`crop_band`], [`encode`])
//!
//! [`render_thumbnail`] runs steps 2-5 on a decoded image; [`Thumbnailer`] runs the whole chain
//! from a URL.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: identical source bytes and config give identical output bytes, whatever
//!   the thread count.
//! - **No shared state**: every buffer is created per invocation; configuration is injected.
#![forbid(unsafe_code)]

mod assets;
mod encode;
mod foundation;
mod pipeline;
mod projection;
mod render;

pub use assets::decode::decode_image;
pub use assets::fetch::{
    FetchResult, HttpResponse, HttpTransport, ReqwestTransport, ResponseBody, ResponseHead,
    StaticTransport, fetch_image,
};
pub use encode::output::{EncodedImage, crop_band, encode, encode_into};
pub use foundation::config::{
    CameraParameters, OutputFormat, OutputGeometry, RenderThreading, ThumbnailConfig,
};
pub use foundation::core::{CHANNELS, ImageBuffer};
pub use foundation::error::{PanoError, PanoResult};
pub use pipeline::{ThumbnailOutcome, Thumbnailer, render_thumbnail};
pub use projection::camera::CameraRig;
pub use projection::sphere::{SphereMapper, Uv, direction_to_uv, uv_to_pixel};
pub use render::resample::reproject;
