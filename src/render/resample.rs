use rayon::prelude::*;

use crate::foundation::config::RenderThreading;
use crate::foundation::core::{CHANNELS, ImageBuffer, byte_len};
use crate::foundation::error::{PanoError, PanoResult};
use crate::projection::camera::CameraRig;
use crate::projection::sphere::SphereMapper;

/// Resample `source` into a `dest_width x dest_height` perspective view.
///
/// Nearest-neighbor only. Each destination pixel is written exactly once, so the parallel and
/// sequential paths produce identical bytes.
#[tracing::instrument(skip(source, rig), fields(src_w = source.width(), src_h = source.height()))]
pub fn reproject(
    source: &ImageBuffer,
    rig: &CameraRig,
    dest_width: u32,
    dest_height: u32,
    threading: &RenderThreading,
) -> PanoResult<ImageBuffer> {
    if dest_width == 0 || dest_height == 0 {
        return Err(PanoError::validation(format!(
            "reprojection target must be non-zero, got {dest_width}x{dest_height}"
        )));
    }
    threading.validate()?;

    let mapper = SphereMapper::new(
        *rig,
        dest_width,
        dest_height,
        source.width(),
        source.height(),
    );
    let stride = dest_width as usize * CHANNELS;
    let mut out = vec![0u8; byte_len(dest_width, dest_height)];

    if threading.parallel {
        let rows = normalized_rows_per_chunk(threading.rows_per_chunk);
        let run = |out: &mut [u8]| {
            out.par_chunks_mut(stride * rows)
                .enumerate()
                .for_each(|(chunk_idx, chunk)| {
                    let first_row = chunk_idx * rows;
                    for (i, row) in chunk.chunks_exact_mut(stride).enumerate() {
                        resample_row(&mapper, source, (first_row + i) as u32, row);
                    }
                });
        };
        match threading.threads {
            Some(n) => build_thread_pool(n)?.install(|| run(&mut out)),
            None => run(&mut out),
        }
    } else {
        for (y, row) in out.chunks_exact_mut(stride).enumerate() {
            resample_row(&mapper, source, y as u32, row);
        }
    }

    tracing::debug!(dest_width, dest_height, "reprojected");
    ImageBuffer::from_rgba8(dest_width, dest_height, out)
}

fn resample_row(mapper: &SphereMapper, source: &ImageBuffer, y: u32, row: &mut [u8]) {
    let src = source.as_bytes();
    let src_width = source.width() as usize;
    for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
        let (src_x, src_y) = mapper.map(x as u32, y);
        let i = (src_y as usize * src_width + src_x as usize) * CHANNELS;
        px.copy_from_slice(&src[i..i + CHANNELS]);
    }
}

fn build_thread_pool(threads: usize) -> PanoResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| PanoError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_rows_per_chunk(rows: usize) -> usize {
    rows.max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/resample.rs"]
mod tests;
