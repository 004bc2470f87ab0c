use glam::{DMat4, DVec3};

use crate::foundation::config::CameraParameters;

/// Projection and view transforms for one invocation.
///
/// Matrices are column-major and use OpenGL clip space (depth in -1..1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub projection: DMat4,
    pub view: DMat4,
}

impl CameraRig {
    /// Derive the rig for a destination with the given `aspect` (width / height).
    ///
    /// The view applies pitch and then yaw, both about the X axis. Yaw does not turn the camera
    /// about the vertical axis; 180 degrees flips the view upside down and back to front.
    pub fn new(params: &CameraParameters, aspect: f64) -> Self {
        let projection = DMat4::perspective_rh_gl(
            params.fov_y_degrees.to_radians(),
            aspect,
            params.near,
            params.far,
        );
        let view = DMat4::IDENTITY
            * DMat4::from_rotation_x(params.pitch_degrees.to_radians())
            * DMat4::from_rotation_x(params.yaw_degrees.to_radians());
        Self { projection, view }
    }

    /// Push a view ray through the projection, then the view.
    pub fn transform_ray(&self, ray: DVec3) -> DVec3 {
        transform_point(&self.view, transform_point(&self.projection, ray))
    }
}

/// Homogeneous point transform with perspective divide; `w == 0` is treated as 1.
pub(crate) fn transform_point(m: &DMat4, p: DVec3) -> DVec3 {
    let v = *m * p.extend(1.0);
    let w = if v.w == 0.0 { 1.0 } else { v.w };
    v.truncate() / w
}

#[cfg(test)]
#[path = "../../tests/unit/projection/camera.rs"]
mod tests;
