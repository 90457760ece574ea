//! Navigation session data shared by all states

use crate::config::{KeyBindings, NavigationConfig};
use crate::input::Button;
use rigview_core::Point3;
use std::collections::HashSet;

/// Input and pivot state carried across state switches
#[derive(Debug, Clone)]
pub struct NavSession {
    pressed: HashSet<Button>,
    /// Last known pointer position in window pixels
    pub pointer: (f64, f64),
    /// Point the camera currently orbits around
    pub pivot: Option<Point3>,
    /// Factor applied by the speed modifier keys, never below 1
    pub speed_step: f64,
}

impl NavSession {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            pressed: HashSet::new(),
            pointer: (0.0, 0.0),
            pivot: None,
            speed_step: config.speed_step.max(1.0),
        }
    }

    /// Returns false if the button was already held (key repeat)
    pub fn press(&mut self, button: Button) -> bool {
        self.pressed.insert(button)
    }

    pub fn release(&mut self, button: Button) -> bool {
        self.pressed.remove(&button)
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    pub fn pressed(&self) -> impl Iterator<Item = &Button> {
        self.pressed.iter()
    }

    pub fn increase_step(&mut self) {
        self.speed_step += 1.0;
    }

    pub fn decrease_step(&mut self) {
        self.speed_step = (self.speed_step - 1.0).max(1.0);
    }

    /// Movement per tick after the held speed modifiers are applied
    pub fn movement_speed(&self, config: &NavigationConfig) -> f64 {
        let mut speed = config.movement_speed;
        if self.is_pressed(config.bindings.speed_up) {
            speed *= self.speed_step;
        }
        if self.is_pressed(config.bindings.slow_down) {
            speed /= self.speed_step;
        }
        speed
    }

    /// Local-axis translation for one tick from the held movement keys
    pub fn movement(&self, config: &NavigationConfig) -> Point3 {
        let b: &KeyBindings = &config.bindings;
        let axis = |plus, minus| {
            (self.is_pressed(plus) as i32 - self.is_pressed(minus) as i32) as f64
        };
        let speed = self.movement_speed(config);
        Point3::new(
            axis(b.move_forward, b.move_backward) * speed,
            axis(b.move_left, b.move_right) * speed,
            axis(b.move_up, b.move_down) * speed,
        )
    }
}
