//! Per-pixel resampling from the equirectangular source into the square target.

pub mod resample;
