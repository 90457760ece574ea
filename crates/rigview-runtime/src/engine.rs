//! NavigationEngine - owns the active state and the fixed-rate tick thread
//!
//! Input handlers and the tick loop share one lock, so a state switch never
//! interleaves with a half-applied event or tick. The tick thread only runs
//! while the active state integrates (FreeFlight); otherwise it parks on a
//! condition variable until the next state change or shutdown.

use crate::config::NavigationConfig;
use crate::input::{Button, InputEvent, InputSink, KeyButton, MouseButton};
use crate::session::NavSession;
use crate::state::{NavContext, NavState};
use crate::visualization::{ObjectRef, SelectionListener, Visualization};
use rigview_core::{Point3, Result, Transformation};
use rigview_graph::Scene;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Handle returned when registering a selection listener
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct SelectionListenerId(u64);

struct Inner {
    state: NavState,
    session: NavSession,
    view: Box<dyn Visualization>,
    config: NavigationConfig,
    scene: Option<Scene>,
    selected: Option<ObjectRef>,
    listeners: Vec<(SelectionListenerId, Box<dyn SelectionListener>)>,
    next_listener: u64,
    ticks: u64,
    shutdown: bool,
}

impl Inner {
    fn context(&mut self) -> (NavState, NavContext<'_>) {
        (
            self.state,
            NavContext {
                session: &mut self.session,
                view: self.view.as_mut(),
                config: &self.config,
            },
        )
    }

    fn tick(&mut self) {
        let (state, mut ctx) = self.context();
        state.tick(&mut ctx);
        self.ticks += 1;
    }

    /// Apply one event. Returns true when the active state changed.
    fn dispatch(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::KeyDown(key) => {
                if !self.session.press(Button::Key(key)) {
                    return false;
                }
                self.key_pressed(key)
            }
            InputEvent::KeyUp(key) => {
                self.session.release(Button::Key(key));
                false
            }
            InputEvent::PointerDown { button, x, y } => {
                self.session.pointer = (x, y);
                self.session.press(Button::Mouse(button));
                let (state, mut ctx) = self.context();
                state.on_pointer_down(&mut ctx, button, x, y);
                if state == NavState::FreeFlight && Button::Mouse(button) == self.config.bindings.select {
                    let picked = self.view.first_collision_object(x, y);
                    self.select(picked, true);
                }
                false
            }
            InputEvent::PointerUp { button, x, y } => {
                self.session.pointer = (x, y);
                self.session.release(Button::Mouse(button));
                let (state, mut ctx) = self.context();
                state.on_pointer_up(&mut ctx, button, x, y);
                false
            }
            InputEvent::PointerMove { dx, dy } => {
                let (px, py) = self.session.pointer;
                self.session.pointer = (px + dx, py + dy);
                let (state, mut ctx) = self.context();
                state.on_pointer_move(&mut ctx, dx, dy);
                false
            }
            InputEvent::Wheel { direction } => {
                let (state, mut ctx) = self.context();
                state.on_wheel(&mut ctx, direction);
                false
            }
        }
    }

    fn key_pressed(&mut self, key: KeyButton) -> bool {
        match key {
            KeyButton::Plus => self.session.increase_step(),
            KeyButton::Minus => self.session.decrease_step(),
            _ => {}
        }

        let button = Button::Key(key);
        let bindings = &self.config.bindings;
        if button == bindings.leave_orbit {
            if self.state == NavState::ObjectOrbit {
                self.switch_to(NavState::FreeFlight, None);
                return true;
            }
            if self.selected.is_some() {
                self.select(None, true);
            }
        } else if button == bindings.enter_orbit && self.state == NavState::FreeFlight {
            if let Some(object) = self.selected.clone() {
                let pivot = self.pivot_of(&object);
                self.switch_to(NavState::ObjectOrbit, Some(pivot));
                return true;
            }
        }
        false
    }

    /// World position of the object's frame, or its reported centre when the
    /// frame is unknown or unanchored
    fn pivot_of(&self, object: &ObjectRef) -> Point3 {
        object
            .frame
            .zip(self.scene.as_ref())
            .and_then(|(frame, scene)| scene.world_transform(frame))
            .map(|world| world.position)
            .unwrap_or(object.center)
    }

    fn switch_to(&mut self, next: NavState, target: Option<Point3>) {
        let (current, mut ctx) = self.context();
        current.deactivate(&mut ctx);
        next.activate(&mut ctx, target);
        self.state = next;
        debug!(from = ?current, to = ?next, "navigation state changed");
    }

    fn select(&mut self, object: Option<ObjectRef>, notify: bool) {
        if let Some(old) = &self.selected {
            self.view.set_highlighted(old, false);
        }
        if let Some(new) = &object {
            self.view.set_highlighted(new, true);
        }
        let changed = self.selected.as_ref().map(|o| o.id) != object.as_ref().map(|o| o.id);
        self.selected = object;
        if changed && notify {
            trace!(selected = ?self.selected.as_ref().map(|o| o.id), "selection changed");
            for (_, listener) in self.listeners.iter_mut() {
                listener.selection_changed(self.selected.as_ref());
            }
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Camera navigation driven by normalized input
pub struct NavigationEngine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl NavigationEngine {
    /// Start in FreeFlight with the tick thread running. `scene` is used to
    /// locate the frames of selected objects. Fails with `ConfigError` when
    /// `config` does not validate.
    pub fn new(
        view: Box<dyn Visualization>,
        config: NavigationConfig,
        scene: Option<Scene>,
    ) -> Result<Self> {
        config.validate()?;
        let interval = config.tick_interval();
        let mut inner = Inner {
            state: NavState::FreeFlight,
            session: NavSession::new(&config),
            view,
            config,
            scene,
            selected: None,
            listeners: Vec::new(),
            next_listener: 1,
            ticks: 0,
            shutdown: false,
        };
        let (state, mut ctx) = inner.context();
        state.activate(&mut ctx, None);

        let shared = Arc::new(Shared {
            inner: Mutex::new(inner),
            wake: Condvar::new(),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("rigview-navigation".into())
                .spawn(move || run_ticks(&shared, interval))
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(error = %err, "could not start navigation tick thread");
                None
            }
        };

        Ok(Self { shared, worker })
    }

    /// Apply one input event
    pub fn handle(&self, event: InputEvent) {
        let mut inner = self.shared.lock();
        if inner.shutdown {
            return;
        }
        if inner.dispatch(event) {
            self.shared.wake.notify_all();
        }
    }

    pub fn key_down(&self, key: KeyButton) {
        self.handle(InputEvent::KeyDown(key));
    }

    pub fn key_up(&self, key: KeyButton) {
        self.handle(InputEvent::KeyUp(key));
    }

    pub fn pointer_down(&self, button: MouseButton, x: f64, y: f64) {
        self.handle(InputEvent::PointerDown { button, x, y });
    }

    pub fn pointer_up(&self, button: MouseButton, x: f64, y: f64) {
        self.handle(InputEvent::PointerUp { button, x, y });
    }

    pub fn pointer_move(&self, dx: f64, dy: f64) {
        self.handle(InputEvent::PointerMove { dx, dy });
    }

    pub fn wheel(&self, direction: i32) {
        self.handle(InputEvent::Wheel { direction });
    }

    pub fn state(&self) -> NavState {
        self.shared.lock().state
    }

    pub fn camera(&self) -> Transformation {
        self.shared.lock().view.camera()
    }

    pub fn pivot(&self) -> Option<Point3> {
        self.shared.lock().session.pivot
    }

    pub fn speed_step(&self) -> f64 {
        self.shared.lock().session.speed_step
    }

    pub fn selected(&self) -> Option<ObjectRef> {
        self.shared.lock().selected.clone()
    }

    /// Change the selection and its highlighting without notifying listeners
    pub fn set_selected(&self, object: Option<ObjectRef>) {
        self.shared.lock().select(object, false);
    }

    /// Number of integration steps run so far
    pub fn tick_count(&self) -> u64 {
        self.shared.lock().ticks
    }

    pub fn add_selection_listener(&self, listener: Box<dyn SelectionListener>) -> SelectionListenerId {
        let mut inner = self.shared.lock();
        let id = SelectionListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, listener));
        id
    }

    pub fn remove_selection_listener(&self, id: SelectionListenerId) -> bool {
        let mut inner = self.shared.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(l, _)| *l != id);
        inner.listeners.len() != before
    }

    /// Stop the tick thread and wait for it to exit. Later input is ignored.
    pub fn dispose(&mut self) {
        {
            let mut inner = self.shared.lock();
            if !inner.shutdown {
                inner.shutdown = true;
                let (state, mut ctx) = inner.context();
                state.deactivate(&mut ctx);
            }
        }
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("navigation tick thread panicked");
            }
            debug!("navigation engine disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().shutdown
    }
}

impl InputSink for NavigationEngine {
    fn handle_input(&mut self, event: InputEvent) {
        self.handle(event);
    }
}

impl Drop for NavigationEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn run_ticks(shared: &Shared, interval: Duration) {
    debug!(interval_ms = interval.as_millis() as u64, "navigation tick thread started");
    let mut inner = shared.lock();
    loop {
        if inner.shutdown {
            break;
        }
        if !inner.state.needs_tick() {
            inner = shared.wake.wait(inner).unwrap_or_else(PoisonError::into_inner);
            continue;
        }

        inner.tick();

        let deadline = Instant::now() + interval;
        while !inner.shutdown {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            inner = shared
                .wake
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
    debug!("navigation tick thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::RecordingView;
    use rigview_core::{FrameId, RigviewError};
    use rigview_graph::RelationParams;

    fn engine_with(view: &RecordingView, scene: Option<Scene>) -> NavigationEngine {
        NavigationEngine::new(Box::new(view.clone()), NavigationConfig::default(), scene).unwrap()
    }

    fn object(id: u64, frame: Option<FrameId>, center: Point3) -> ObjectRef {
        ObjectRef { id, frame, center }
    }

    struct RecordingSelection(Arc<Mutex<Vec<Option<u64>>>>);

    impl SelectionListener for RecordingSelection {
        fn selection_changed(&mut self, selected: Option<&ObjectRef>) {
            self.0.lock().unwrap().push(selected.map(|o| o.id));
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_tick_thread_moves_camera_while_key_held() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("rigview_runtime=debug")
            .with_test_writer()
            .try_init();

        let view = RecordingView::at(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        let mut engine = engine_with(&view, None);
        engine.key_down(KeyButton::W);
        assert!(wait_for(|| engine.camera().x() > 0.2));
        engine.key_up(KeyButton::W);

        engine.dispose();
        assert!(engine.is_disposed());
        let ticks = engine.tick_count();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(engine.tick_count(), ticks);

        // Input after disposal is ignored.
        let parked = engine.camera();
        engine.key_down(KeyButton::W);
        engine.wheel(3);
        assert_eq!(engine.camera(), parked);
    }

    #[test]
    fn test_select_and_orbit_round_trip() {
        let view = RecordingView::at(Transformation::from_xyzabc(-3.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        view.log.lock().unwrap().hit_object = Some(object(5, None, Point3::new(0.0, 0.0, 0.5)));
        let mut engine = engine_with(&view, None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        engine.add_selection_listener(Box::new(RecordingSelection(Arc::clone(&seen))));

        // Space without a selection does nothing.
        engine.key_down(KeyButton::Space);
        engine.key_up(KeyButton::Space);
        assert_eq!(engine.state(), NavState::FreeFlight);

        engine.pointer_down(MouseButton::Middle, 100.0, 100.0);
        engine.pointer_up(MouseButton::Middle, 100.0, 100.0);
        assert_eq!(engine.selected().map(|o| o.id), Some(5));

        engine.key_down(KeyButton::Space);
        assert_eq!(engine.state(), NavState::ObjectOrbit);
        assert_eq!(engine.pivot(), Some(Point3::new(0.0, 0.0, 0.5)));

        // Escape leaves the orbit but keeps the selection.
        engine.key_down(KeyButton::Escape);
        engine.key_up(KeyButton::Escape);
        assert_eq!(engine.state(), NavState::FreeFlight);
        assert_eq!(engine.pivot(), None);
        assert!(engine.selected().is_some());

        // A second Escape clears it.
        engine.key_down(KeyButton::Escape);
        assert!(engine.selected().is_none());

        assert_eq!(*seen.lock().unwrap(), vec![Some(5), None]);
        let log = view.log.lock().unwrap();
        assert_eq!(log.highlights, vec![(5, true), (5, false)]);
        engine.dispose();
    }

    #[test]
    fn test_reselecting_same_object_does_not_notify() {
        let view = RecordingView::at(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        view.log.lock().unwrap().hit_object = Some(object(2, None, Point3::ZERO));
        let engine = engine_with(&view, None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let id = engine.add_selection_listener(Box::new(RecordingSelection(Arc::clone(&seen))));

        engine.pointer_down(MouseButton::Middle, 0.0, 0.0);
        engine.pointer_up(MouseButton::Middle, 0.0, 0.0);
        engine.pointer_down(MouseButton::Middle, 0.0, 0.0);
        assert_eq!(*seen.lock().unwrap(), vec![Some(2)]);

        assert!(engine.remove_selection_listener(id));
        assert!(!engine.remove_selection_listener(id));
    }

    #[test]
    fn test_orbit_pivot_follows_scene_frame() {
        let scene = Scene::new("robot");
        let tool = scene.add_frame("tool").unwrap();
        scene.add_relation(FrameId::ROOT, tool, RelationParams::new(1.0, 2.0, 0.3, 0.0, 0.0, 0.0));

        let view = RecordingView::at(Transformation::from_xyzabc(-3.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        let engine = engine_with(&view, Some(scene.clone()));
        engine.set_selected(Some(object(9, Some(tool), Point3::new(7.0, 7.0, 7.0))));
        engine.key_down(KeyButton::Space);
        assert_eq!(engine.pivot(), Some(Point3::new(1.0, 2.0, 0.3)));
        engine.key_down(KeyButton::Escape);

        // Unanchored frame: fall back to the reported centre.
        scene.remove_relation(FrameId::ROOT, tool);
        engine.key_up(KeyButton::Space);
        engine.key_down(KeyButton::Space);
        assert_eq!(engine.pivot(), Some(Point3::new(7.0, 7.0, 7.0)));
    }

    #[test]
    fn test_tick_thread_parks_in_orbit() {
        let view = RecordingView::at(Transformation::from_xyzabc(-3.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        let engine = engine_with(&view, None);
        engine.set_selected(Some(object(1, None, Point3::ZERO)));
        engine.key_down(KeyButton::Space);
        assert_eq!(engine.state(), NavState::ObjectOrbit);

        // Let any tick already past the state check finish.
        thread::sleep(Duration::from_millis(50));
        let ticks = engine.tick_count();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(engine.tick_count(), ticks);

        engine.key_down(KeyButton::Escape);
        assert!(wait_for(|| engine.tick_count() > ticks));
    }

    #[test]
    fn test_speed_step_keys() {
        let view = RecordingView::default();
        let engine = engine_with(&view, None);
        engine.key_down(KeyButton::Plus);
        engine.key_up(KeyButton::Plus);
        engine.key_down(KeyButton::Plus);
        assert!((engine.speed_step() - 4.0).abs() < 1e-12);
        // Held key repeats do not count again.
        engine.key_down(KeyButton::Plus);
        assert!((engine.speed_step() - 4.0).abs() < 1e-12);

        for _ in 0..5 {
            engine.key_down(KeyButton::Minus);
            engine.key_up(KeyButton::Minus);
        }
        assert!((engine.speed_step() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_input_channel_feeds_engine() {
        use crate::input::InputChannel;
        let view = RecordingView::at(Transformation::from_xyzabc(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        let mut channel = InputChannel::new(engine_with(&view, None));
        channel.send(InputEvent::Wheel { direction: 4 });
        assert!((channel.sink().camera().x() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let view = RecordingView::at(Transformation::IDENTITY);
        let inverted = NavigationConfig {
            min_tilt_deg: 10.0,
            max_tilt_deg: 5.0,
            ..NavigationConfig::default()
        };
        assert!(matches!(
            NavigationEngine::new(Box::new(view.clone()), inverted, None),
            Err(RigviewError::ConfigError(_))
        ));

        let no_tilt = NavigationConfig {
            max_tilt_deg: f64::NAN,
            ..NavigationConfig::default()
        };
        assert!(NavigationEngine::new(Box::new(view.clone()), no_tilt, None).is_err());
        assert_eq!(view.log.lock().unwrap().camera_sets, 0);
    }
}
