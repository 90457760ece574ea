//! Navigation states
//!
//! Exactly one state is active at a time. States keep no data of their own;
//! everything they need lives in the [`NavSession`] handed to them together
//! with the view and configuration.

use crate::camera::{self, CameraLimits};
use crate::config::NavigationConfig;
use crate::input::{Button, MouseButton};
use crate::session::NavSession;
use crate::visualization::Visualization;
use rigview_core::Point3;

/// Everything a state handler may read or change
pub struct NavContext<'a> {
    pub session: &'a mut NavSession,
    pub view: &'a mut dyn Visualization,
    pub config: &'a NavigationConfig,
}

impl NavContext<'_> {
    fn limits(&self) -> CameraLimits {
        CameraLimits::from_config(self.config)
    }

    fn held(&self, button: Button) -> bool {
        self.session.is_pressed(button)
    }

    fn set_pivot(&mut self, pivot: Option<Point3>) {
        self.session.pivot = pivot;
        self.view.draw_pivot_marker(pivot);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavState {
    /// Camera flies freely; held movement keys integrate every tick
    FreeFlight,
    /// Camera orbits a fixed pivot, usually the selected object
    ObjectOrbit,
}

impl NavState {
    /// Whether the tick loop should run while this state is active
    pub fn needs_tick(self) -> bool {
        matches!(self, NavState::FreeFlight)
    }

    /// Enter the state. `target` is the orbit pivot for `ObjectOrbit`.
    pub fn activate(self, ctx: &mut NavContext<'_>, target: Option<Point3>) {
        match self {
            NavState::FreeFlight => ctx.session.pivot = None,
            NavState::ObjectOrbit => {
                let pivot = target.unwrap_or(Point3::ZERO);
                let camera = camera::orient_camera_to_point(&ctx.view.camera(), pivot, &ctx.limits());
                ctx.view.set_camera(camera);
                ctx.set_pivot(Some(pivot));
            }
        }
    }

    pub fn deactivate(self, ctx: &mut NavContext<'_>) {
        if ctx.session.pivot.is_some() {
            ctx.set_pivot(None);
        }
    }

    /// One integration step from the held movement keys
    pub fn tick(self, ctx: &mut NavContext<'_>) {
        if self != NavState::FreeFlight {
            return;
        }
        let movement = ctx.session.movement(ctx.config);
        let camera = camera::fly(&ctx.view.camera(), movement, &ctx.limits());
        ctx.view.set_camera(camera);
    }

    pub fn on_pointer_down(self, ctx: &mut NavContext<'_>, button: MouseButton, x: f64, y: f64) {
        if self == NavState::FreeFlight && Button::Mouse(button) == ctx.config.bindings.rotate_orbit {
            let pivot = ctx.view.first_collision_point(x, y, true);
            ctx.set_pivot(pivot);
        }
    }

    pub fn on_pointer_up(self, ctx: &mut NavContext<'_>, button: MouseButton, _x: f64, _y: f64) {
        if self == NavState::FreeFlight && Button::Mouse(button) == ctx.config.bindings.rotate_orbit {
            ctx.set_pivot(None);
        }
    }

    /// `dx`/`dy` are the pointer movement in pixels, y growing downwards
    pub fn on_pointer_move(self, ctx: &mut NavContext<'_>, dx: f64, dy: f64) {
        // Drag deltas run against the pointer motion.
        let (drag_x, drag_y) = (-dx, -dy);
        let bindings = &ctx.config.bindings;
        let rotating = ctx.held(bindings.rotate_look) || ctx.held(bindings.rotate_orbit);
        let panning = ctx.held(bindings.pan);
        let limits = ctx.limits();
        let angular = ctx.config.angular_speed;
        let camera = ctx.view.camera();

        match (self, ctx.session.pivot) {
            (_, Some(pivot)) if rotating => {
                let moved = camera::rotate_around_point(&camera, drag_x, drag_y, pivot, angular, &limits);
                ctx.view.set_camera(moved);
            }
            (NavState::FreeFlight, None) if rotating => {
                ctx.view.set_camera(camera::rotate_camera(&camera, drag_x, drag_y, angular, &limits));
            }
            (NavState::ObjectOrbit, Some(pivot)) if panning => {
                let (moved, pivot) = camera::pan(&camera, pivot, drag_x, drag_y, angular, &limits);
                ctx.view.set_camera(moved);
                ctx.set_pivot(Some(pivot));
            }
            _ => {}
        }
    }

    pub fn on_wheel(self, ctx: &mut NavContext<'_>, direction: i32) {
        let distance = direction as f64 * ctx.config.zoom_speed;
        let camera = camera::zoom(&ctx.view.camera(), distance, &ctx.limits());
        ctx.view.set_camera(camera);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::input::KeyButton;
    use crate::visualization::ObjectRef;
    use rigview_core::Transformation;
    use std::sync::{Arc, Mutex};

    /// What a [`RecordingView`] has been asked to do
    #[derive(Default, Debug)]
    pub(crate) struct ViewLog {
        pub camera: Transformation,
        pub markers: Vec<Option<Point3>>,
        pub highlights: Vec<(u64, bool)>,
        pub hit_point: Option<Point3>,
        pub hit_object: Option<ObjectRef>,
        pub camera_sets: usize,
    }

    /// Test double that records calls into a shared log
    #[derive(Clone, Default)]
    pub(crate) struct RecordingView {
        pub log: Arc<Mutex<ViewLog>>,
    }

    impl RecordingView {
        pub fn at(camera: Transformation) -> Self {
            let view = Self::default();
            view.log.lock().unwrap().camera = camera;
            view
        }
    }

    impl Visualization for RecordingView {
        fn camera(&self) -> Transformation {
            self.log.lock().unwrap().camera
        }

        fn set_camera(&mut self, camera: Transformation) {
            let mut log = self.log.lock().unwrap();
            log.camera = camera;
            log.camera_sets += 1;
        }

        fn first_collision_point(&self, _x: f64, _y: f64, _include_ground: bool) -> Option<Point3> {
            self.log.lock().unwrap().hit_point
        }

        fn first_collision_object(&self, _x: f64, _y: f64) -> Option<ObjectRef> {
            self.log.lock().unwrap().hit_object.clone()
        }

        fn draw_pivot_marker(&mut self, point: Option<Point3>) {
            self.log.lock().unwrap().markers.push(point);
        }

        fn set_highlighted(&mut self, object: &ObjectRef, highlighted: bool) {
            self.log.lock().unwrap().highlights.push((object.id, highlighted));
        }
    }

    struct Fixture {
        config: NavigationConfig,
        session: NavSession,
        view: RecordingView,
    }

    impl Fixture {
        fn new(camera: Transformation) -> Self {
            let config = NavigationConfig::default();
            Self {
                session: NavSession::new(&config),
                config,
                view: RecordingView::at(camera),
            }
        }

        fn ctx(&mut self) -> NavContext<'_> {
            NavContext {
                session: &mut self.session,
                view: &mut self.view,
                config: &self.config,
            }
        }

        fn camera(&self) -> Transformation {
            self.view.log.lock().unwrap().camera
        }
    }

    #[test]
    fn test_free_flight_tick_moves_forward() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        fx.session.press(KeyButton::W.into());
        NavState::FreeFlight.tick(&mut fx.ctx());
        NavState::FreeFlight.tick(&mut fx.ctx());
        assert!((fx.camera().x() - 0.14).abs() < 1e-9);

        // ObjectOrbit does not integrate.
        NavState::ObjectOrbit.tick(&mut fx.ctx());
        assert!((fx.camera().x() - 0.14).abs() < 1e-9);
    }

    #[test]
    fn test_free_flight_tick_stops_at_floor() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(0.0, 0.0, 0.2, 0.0, 0.0, 0.0));
        fx.session.press(KeyButton::E.into());
        for _ in 0..10 {
            NavState::FreeFlight.tick(&mut fx.ctx());
        }
        assert!((fx.camera().z() - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_look_drag_turns_camera() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        fx.session.press(MouseButton::Primary.into());
        // Pointer moves right by 100px: camera turns right.
        NavState::FreeFlight.on_pointer_move(&mut fx.ctx(), 100.0, 0.0);
        assert!((fx.camera().a() + 0.3).abs() < 1e-9);

        // Without a held button nothing happens.
        fx.session.release(MouseButton::Primary.into());
        NavState::FreeFlight.on_pointer_move(&mut fx.ctx(), 100.0, 0.0);
        assert!((fx.camera().a() + 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_orbit_drag_picks_and_clears_pivot() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(-2.0, 0.0, 1.0, 0.0, 0.4, 0.0));
        fx.view.log.lock().unwrap().hit_point = Some(Point3::new(0.0, 0.0, 0.0));

        fx.session.press(MouseButton::Secondary.into());
        NavState::FreeFlight.on_pointer_down(&mut fx.ctx(), MouseButton::Secondary, 10.0, 10.0);
        assert_eq!(fx.session.pivot, Some(Point3::ZERO));

        let before = (fx.camera().position - Point3::ZERO).length();
        NavState::FreeFlight.on_pointer_move(&mut fx.ctx(), 50.0, 0.0);
        let after = (fx.camera().position - Point3::ZERO).length();
        assert!((before - after).abs() < 1e-9);

        fx.session.release(MouseButton::Secondary.into());
        NavState::FreeFlight.on_pointer_up(&mut fx.ctx(), MouseButton::Secondary, 10.0, 10.0);
        assert_eq!(fx.session.pivot, None);
        assert_eq!(
            fx.view.log.lock().unwrap().markers,
            vec![Some(Point3::ZERO), None]
        );
    }

    #[test]
    fn test_orbit_drag_without_hit_falls_back_to_look() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        fx.session.press(MouseButton::Secondary.into());
        NavState::FreeFlight.on_pointer_down(&mut fx.ctx(), MouseButton::Secondary, 0.0, 0.0);
        NavState::FreeFlight.on_pointer_move(&mut fx.ctx(), 0.0, 0.0);
        NavState::FreeFlight.on_pointer_move(&mut fx.ctx(), -10.0, 0.0);
        assert!(fx.camera().position.approx_eq(&Point3::new(0.0, 0.0, 1.0), 1e-12));
        assert!((fx.camera().a() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_object_orbit_activation_faces_pivot() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(-2.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        let pivot = Point3::new(0.0, 2.0, 0.0);
        NavState::ObjectOrbit.activate(&mut fx.ctx(), Some(pivot));
        assert!((fx.camera().a() - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
        assert_eq!(fx.session.pivot, Some(pivot));

        NavState::ObjectOrbit.deactivate(&mut fx.ctx());
        assert_eq!(fx.session.pivot, None);
        assert_eq!(fx.view.log.lock().unwrap().markers, vec![Some(pivot), None]);
    }

    #[test]
    fn test_object_orbit_pan_moves_pivot() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(-2.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        NavState::ObjectOrbit.activate(&mut fx.ctx(), Some(Point3::ZERO));
        fx.session.press(MouseButton::Middle.into());

        // Pointer moves up: both rise.
        NavState::ObjectOrbit.on_pointer_move(&mut fx.ctx(), 0.0, -100.0);
        let pivot = fx.session.pivot.unwrap();
        assert!((pivot.z - 0.3).abs() < 1e-9);
        assert!((fx.camera().z() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_object_orbit_drag_circles_pivot() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(-2.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        let pivot = Point3::new(0.0, 0.0, 0.5);
        NavState::ObjectOrbit.activate(&mut fx.ctx(), Some(pivot));
        let before = fx.camera();
        fx.session.press(MouseButton::Primary.into());

        NavState::ObjectOrbit.on_pointer_move(&mut fx.ctx(), 40.0, -20.0);
        let after = fx.camera();
        let distance = |camera: &Transformation| {
            let d = Point3::new(
                camera.x() - pivot.x,
                camera.y() - pivot.y,
                camera.z() - pivot.z,
            );
            (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
        };
        assert!((distance(&after) - distance(&before)).abs() < 1e-9);
        assert!(!after.position.approx_eq(&before.position, 1e-6));
        assert!(after.z() >= fx.config.floor_clearance);
        assert_eq!(fx.session.pivot, Some(pivot));
    }

    #[test]
    fn test_wheel_zooms_in_both_states() {
        let mut fx = Fixture::new(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        NavState::FreeFlight.on_wheel(&mut fx.ctx(), 2);
        assert!((fx.camera().x() - 0.5).abs() < 1e-9);
        NavState::ObjectOrbit.on_wheel(&mut fx.ctx(), -1);
        assert!((fx.camera().x() - 0.25).abs() < 1e-9);
    }
}
