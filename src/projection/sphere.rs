use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::projection::camera::CameraRig;

/// Texture coordinate on the equirectangular source, nominally in [0, 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

/// Maps destination pixels to source pixels for one (destination, source) size pair.
#[derive(Clone, Copy, Debug)]
pub struct SphereMapper {
    rig: CameraRig,
    dest_width: u32,
    dest_height: u32,
    src_width: u32,
    src_height: u32,
}

impl SphereMapper {
    pub fn new(
        rig: CameraRig,
        dest_width: u32,
        dest_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> Self {
        Self {
            rig,
            dest_width,
            dest_height,
            src_width,
            src_height,
        }
    }

    /// Unit view direction for destination pixel `(x, y)`.
    pub fn direction(&self, x: u32, y: u32) -> DVec3 {
        let nx = (f64::from(x) / f64::from(self.dest_width)) * 2.0 - 1.0;
        let ny = (f64::from(y) / f64::from(self.dest_height)) * 2.0 - 1.0;
        self.rig
            .transform_ray(DVec3::new(nx, ny, -1.0))
            .normalize_or_zero()
    }

    pub fn uv(&self, x: u32, y: u32) -> Uv {
        direction_to_uv(self.direction(x, y))
    }

    /// Source pixel sampled by destination pixel `(x, y)`. Always in bounds.
    #[inline]
    pub fn map(&self, x: u32, y: u32) -> (u32, u32) {
        uv_to_pixel(self.uv(x, y), self.src_width, self.src_height)
    }
}

/// Longitude/latitude of a unit direction, expressed as equirectangular UV.
///
/// Longitude is measured from -Z towards +X; latitude is positive towards +Y (up in the source).
pub fn direction_to_uv(dir: DVec3) -> Uv {
    let longitude = dir.x.atan2(-dir.z);
    let latitude = dir.y.clamp(-1.0, 1.0).asin();
    Uv {
        u: 0.5 + longitude / TAU,
        v: 0.5 - latitude / PI,
    }
}

/// Turn UV into a pixel index of a `width x height` source.
///
/// Horizontal overflow wraps around the seam; vertical overflow clamps at the poles. Non-finite
/// coordinates land on 0.
pub fn uv_to_pixel(uv: Uv, width: u32, height: u32) -> (u32, u32) {
    (wrap_index(uv.u, width), clamp_index(uv.v, height))
}

fn wrap_index(t: f64, n: u32) -> u32 {
    if !t.is_finite() || n == 0 {
        return 0;
    }
    let i = (t * f64::from(n)).floor() as i64;
    i.rem_euclid(i64::from(n)) as u32
}

fn clamp_index(t: f64, n: u32) -> u32 {
    if !t.is_finite() || n == 0 {
        return 0;
    }
    let i = (t * f64::from(n)).floor() as i64;
    i.clamp(0, i64::from(n) - 1) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/projection/sphere.rs"]
mod tests;
