//! Virtual camera and the destination-pixel to source-pixel mapping.

pub mod camera;
pub mod sphere;
