//! Cropping and compression of the reprojected target.

pub mod output;
