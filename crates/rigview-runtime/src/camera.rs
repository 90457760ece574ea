//! Camera pose math for navigation
//!
//! Camera convention: local +x looks forward, +y points left, +z points up.
//! Yaw `a` turns left, positive pitch `b` looks down. The ground is the plane
//! z = 0.
//!
//! Drag deltas are previous minus current pointer position, so dragging the
//! pointer right gives a negative `dx` and dragging it up a positive `dy`.

use crate::config::NavigationConfig;
use rigview_core::{Point3, Rotation3, Transformation};
use std::f64::consts::{FRAC_PI_2, PI};

/// Lengths below this are treated as zero
const DEGENERATE: f64 = 1e-9;

/// Pitch range and ground clearance shared by all camera moves
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraLimits {
    pub min_tilt: f64,
    pub max_tilt: f64,
    pub floor: f64,
}

impl CameraLimits {
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            min_tilt: config.min_tilt(),
            max_tilt: config.max_tilt(),
            floor: config.floor_clearance,
        }
    }

    pub fn clamp_tilt(&self, b: f64) -> f64 {
        b.clamp(self.min_tilt, self.max_tilt)
    }
}

/// Turn the camera in place: yaw by `dx`, pitch by `dy`, roll reset
pub fn rotate_camera(camera: &Transformation, dx: f64, dy: f64, angular_speed: f64, limits: &CameraLimits) -> Transformation {
    let a = camera.a() + dx * angular_speed;
    let b = limits.clamp_tilt(camera.b() - dy * angular_speed);
    Transformation::new(camera.position, Rotation3::from_angles(a, b, 0.0))
}

/// Keep the position, look at `target`
pub fn orient_camera_to_point(camera: &Transformation, target: Point3, limits: &CameraLimits) -> Transformation {
    let d = target - camera.position;
    let length = d.length();
    if length < DEGENERATE {
        return Transformation::new(camera.position, Rotation3::from_angles(camera.a(), 0.0, 0.0));
    }
    let a = d.y.atan2(d.x);
    let b = limits.clamp_tilt((d.z / length).clamp(-1.0, 1.0).acos() - FRAC_PI_2);
    Transformation::new(camera.position, Rotation3::from_angles(a, b, 0.0))
}

/// Orbit the camera around `pivot`.
///
/// `dx` yaws around the vertical axis through the pivot, `dy` tilts the camera
/// over the pivot. The tilt is limited twice: the resulting pitch stays inside
/// the tilt range, and the camera may not sink below the floor. For the
/// latter, in the pivot's yaw-aligned frame the camera sits at radius `r` and
/// elevation `phi` in the x/z plane, so its height after a tilt `t` is
/// `pivot.z + r * sin(t + phi)`; solving that against the floor bounds `t`.
pub fn rotate_around_point(
    camera: &Transformation,
    dx: f64,
    dy: f64,
    pivot: Point3,
    angular_speed: f64,
    limits: &CameraLimits,
) -> Transformation {
    let origin_to_pivot = Transformation::new(pivot, Rotation3::from_angles(camera.a(), 0.0, 0.0));
    let pivot_to_camera = origin_to_pivot.invert().compose(camera);

    let old_tilt = pivot_to_camera.b();
    let new_tilt = limits.clamp_tilt(old_tilt - dy * angular_speed);
    let mut tilt_delta = new_tilt - old_tilt;

    let rel = pivot_to_camera.position;
    let radius = (rel.x * rel.x + rel.z * rel.z).sqrt();
    if radius > DEGENERATE {
        let elevation = rel.z.atan2(-rel.x);
        let lowest = ((limits.floor - pivot.z) / radius).clamp(-1.0, 1.0).asin();
        let min_delta = lowest - elevation;
        let max_delta = PI - lowest - elevation;
        tilt_delta = tilt_delta.clamp(min_delta.min(max_delta), max_delta.max(min_delta));
    }

    let turn = Transformation::from_rotation(Rotation3::from_angles(dx * angular_speed, tilt_delta, 0.0));
    let mut result = origin_to_pivot.compose(&turn).compose(&pivot_to_camera);
    result.position.z = result.position.z.max(limits.floor);
    result
}

/// Move along the camera's forward axis
pub fn zoom(camera: &Transformation, distance: f64, limits: &CameraLimits) -> Transformation {
    let mut result = camera.translate_local(Point3::new(distance, 0.0, 0.0));
    result.position.z = result.position.z.max(limits.floor);
    result
}

/// Shift camera and pivot together: `dy` moves both vertically, `dx` along the
/// camera's lateral axis. Vertical motion stops at the floor.
pub fn pan(
    camera: &Transformation,
    pivot: Point3,
    dx: f64,
    dy: f64,
    speed: f64,
    limits: &CameraLimits,
) -> (Transformation, Point3) {
    let dz = (dy * speed).max(limits.floor - camera.z());
    let lateral = camera.rotation.apply(Point3::new(0.0, dx * speed, 0.0));
    let offset = Point3::new(lateral.x, lateral.y, lateral.z + dz);
    let moved = Transformation::new(camera.position + offset, camera.rotation);
    (moved, pivot + offset)
}

/// Translate along the local axes, then enforce floor, pitch range and zero roll
pub fn fly(camera: &Transformation, local: Point3, limits: &CameraLimits) -> Transformation {
    let moved = camera.translate_local(local);
    Transformation::from_xyzabc(
        moved.x(),
        moved.y(),
        moved.z().max(limits.floor),
        moved.a(),
        limits.clamp_tilt(moved.b()),
        0.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn limits(floor: f64) -> CameraLimits {
        CameraLimits {
            min_tilt: (-89f64).to_radians(),
            max_tilt: 89f64.to_radians(),
            floor,
        }
    }

    #[test]
    fn test_rotate_camera_clamps_pitch() {
        let camera = Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.3);
        let turned = rotate_camera(&camera, 100.0, 0.0, 0.003, &limits(0.1));
        assert!((turned.a() - 0.3).abs() < EPS);
        assert!(turned.c().abs() < EPS);

        let up = rotate_camera(&camera, 0.0, 10_000.0, 0.003, &limits(0.1));
        assert!((up.b() - (-89f64).to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_orient_towards_point_below() {
        let camera = Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0);
        let oriented = orient_camera_to_point(&camera, Point3::new(0.0, 1.0, 0.0), &limits(0.1));
        assert!((oriented.a() - FRAC_PI_2).abs() < 1e-6);
        assert!((oriented.b() - std::f64::consts::FRAC_PI_4).abs() < 1e-6);
        assert!(oriented.position.approx_eq(&camera.position, EPS));

        // Forward axis now points at the target.
        let forward = oriented.rotation.apply(Point3::new(1.0, 0.0, 0.0));
        let expected = Point3::new(0.0, 1.0, -1.0) * (1.0 / 2f64.sqrt());
        assert!(forward.approx_eq(&expected, 1e-6));
    }

    #[test]
    fn test_orient_degenerate_target_keeps_yaw() {
        let camera = Transformation::from_xyzabc(1.0, 2.0, 3.0, 0.7, 0.2, 0.0);
        let oriented = orient_camera_to_point(&camera, camera.position, &limits(0.1));
        assert!((oriented.a() - 0.7).abs() < 1e-6);
        assert!(oriented.b().abs() < EPS);
    }

    #[test]
    fn test_orbit_keeps_distance_to_pivot() {
        let pivot = Point3::new(1.0, 1.0, 0.5);
        let camera = orient_camera_to_point(
            &Transformation::from_xyzabc(-2.0, 0.5, 2.0, 0.0, 0.0, 0.0),
            pivot,
            &limits(0.1),
        );
        let distance = (camera.position - pivot).length();

        let orbited = rotate_around_point(&camera, 120.0, -40.0, pivot, 0.003, &limits(0.1));
        assert!(((orbited.position - pivot).length() - distance).abs() < 1e-9);
        assert!((orbited.a() - camera.a() - 0.36).abs() < 1e-9);
    }

    #[test]
    fn test_orbit_never_crosses_floor() {
        let floor = 0.1;
        for start in [
            Transformation::from_xyzabc(-2.0, 0.0, 1.0, 0.0, 0.0, 0.0),
            Transformation::from_xyzabc(-2.0, 0.7, 1.0, 0.0, 0.0, 0.0),
            Transformation::from_xyzabc(3.0, -1.0, 0.4, 0.0, 0.0, 0.0),
        ] {
            let pivot = Point3::ZERO;
            let mut camera = orient_camera_to_point(&start, pivot, &limits(floor));
            let mut camera_yawed = camera;
            for _ in 0..200 {
                camera = rotate_around_point(&camera, 0.0, 200.0, pivot, 0.003, &limits(floor));
                assert!(camera.z() >= floor - EPS, "z = {}", camera.z());
                camera_yawed = rotate_around_point(&camera_yawed, 35.0, 150.0, pivot, 0.003, &limits(floor));
                assert!(camera_yawed.z() >= floor - EPS, "z = {}", camera_yawed.z());
            }
            // The camera settles on the floor rather than stopping early.
            assert!((camera.z() - floor).abs() < 1e-6);
        }
    }

    #[test]
    fn test_orbit_upward_respects_tilt_range() {
        let pivot = Point3::ZERO;
        let mut camera = orient_camera_to_point(
            &Transformation::from_xyzabc(-2.0, 0.0, 1.0, 0.0, 0.0, 0.0),
            pivot,
            &limits(0.1),
        );
        for _ in 0..100 {
            camera = rotate_around_point(&camera, 0.0, -200.0, pivot, 0.003, &limits(0.1));
        }
        assert!(camera.b() <= 89f64.to_radians() + 1e-9);
        assert!(camera.z() > 2.0);
    }

    #[test]
    fn test_zoom_moves_forward() {
        let camera = Transformation::from_xyzabc(0.0, 0.0, 1.0, FRAC_PI_2, 0.0, 0.0);
        let zoomed = zoom(&camera, 0.25, &limits(0.1));
        assert!(zoomed.position.approx_eq(&Point3::new(0.0, 0.25, 1.0), 1e-9));
    }

    #[test]
    fn test_pan_moves_camera_and_pivot_together() {
        let camera = Transformation::from_xyzabc(0.0, 0.0, 0.5, 0.0, 0.3, 0.0);
        let pivot = Point3::new(2.0, 0.0, 0.0);
        let (moved, moved_pivot) = pan(&camera, pivot, 100.0, 50.0, 0.003, &limits(0.1));

        let shift = moved.position - camera.position;
        assert!(shift.approx_eq(&Point3::new(0.0, 0.3, 0.15), 1e-9));
        assert!((moved_pivot - pivot).approx_eq(&shift, 1e-12));

        let (low, _) = pan(&camera, pivot, 0.0, -1000.0, 0.003, &limits(0.1));
        assert!((low.z() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_fly_enforces_floor_and_zero_roll() {
        let camera = Transformation::from_xyzabc(0.0, 0.0, 0.2, 0.0, 0.5, 0.1);
        let moved = fly(&camera, Point3::new(1.0, 0.0, -1.0), &limits(0.12));
        assert!(moved.z() >= 0.12);
        assert!(moved.c().abs() < EPS);
        assert!(moved.x() > 0.0);
    }
}
