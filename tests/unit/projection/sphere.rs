use super::*;
use crate::foundation::config::CameraParameters;

fn default_mapper(src_w: u32, src_h: u32) -> SphereMapper {
    let rig = CameraRig::new(&CameraParameters::default(), 1.0);
    SphereMapper::new(rig, 750, 750, src_w, src_h)
}

#[test]
fn cardinal_directions_map_to_expected_uv() {
    let fwd = direction_to_uv(DVec3::NEG_Z);
    assert_eq!(fwd, Uv { u: 0.5, v: 0.5 });

    let right = direction_to_uv(DVec3::X);
    assert!((right.u - 0.75).abs() < 1e-12);
    assert!((right.v - 0.5).abs() < 1e-12);

    let up = direction_to_uv(DVec3::Y);
    assert!(up.v.abs() < 1e-12);
    let down = direction_to_uv(DVec3::NEG_Y);
    assert!((down.v - 1.0).abs() < 1e-12);
}

#[test]
fn out_of_range_uv_wraps_horizontally_and_clamps_vertically() {
    assert_eq!(uv_to_pixel(Uv { u: 1.0, v: 1.0 }, 64, 32), (0, 31));
    assert_eq!(uv_to_pixel(Uv { u: -0.001, v: -0.5 }, 64, 32), (63, 0));
    assert_eq!(uv_to_pixel(Uv { u: 2.25, v: 0.5 }, 64, 32), (16, 16));
    assert_eq!(uv_to_pixel(Uv { u: f64::NAN, v: f64::INFINITY }, 64, 32), (0, 0));
}

#[test]
fn center_pixel_hits_source_center() {
    let mapper = default_mapper(64, 32);
    assert_eq!(mapper.map(375, 375), (32, 16));
    let dir = mapper.direction(375, 375);
    assert!((dir.length() - 1.0).abs() < 1e-12);
}

#[test]
fn orientation_is_upright_and_unmirrored() {
    let mapper = default_mapper(64, 32);
    let (_, top_y) = mapper.map(375, 0);
    let (_, bottom_y) = mapper.map(375, 749);
    assert!(top_y < 16, "top row sampled row {top_y}");
    assert!(bottom_y > 16, "bottom row sampled row {bottom_y}");

    let (left_x, _) = mapper.map(0, 375);
    let (right_x, _) = mapper.map(749, 375);
    assert!(left_x < 32, "left column sampled column {left_x}");
    assert!(right_x > 32, "right column sampled column {right_x}");
}

#[test]
fn every_mapped_index_is_in_bounds() {
    let cameras = [
        CameraParameters::default(),
        CameraParameters {
            fov_y_degrees: 179.0,
            pitch_degrees: 90.0,
            yaw_degrees: 0.0,
            ..CameraParameters::default()
        },
        CameraParameters {
            fov_y_degrees: 150.0,
            pitch_degrees: -45.0,
            yaw_degrees: 270.0,
            ..CameraParameters::default()
        },
    ];
    for params in cameras {
        for (src_w, src_h) in [(1, 1), (7, 3), (64, 32), (101, 50)] {
            let rig = CameraRig::new(&params, 48.0 / 40.0);
            let mapper = SphereMapper::new(rig, 48, 40, src_w, src_h);
            for y in 0..40 {
                for x in 0..48 {
                    let (sx, sy) = mapper.map(x, y);
                    assert!(sx < src_w && sy < src_h, "({x},{y}) -> ({sx},{sy})");
                }
            }
        }
    }
}
