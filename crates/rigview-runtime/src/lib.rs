//! Rigview Runtime - camera navigation for the scene viewer
//!
//! Provides:
//! - `InputEvent` / `InputChannel` - host window events normalized for navigation
//! - `NavigationConfig` - speeds, limits and key bindings loaded from TOML
//! - `NavState` - FreeFlight and ObjectOrbit behaviour over a shared `NavSession`
//! - `NavigationEngine` - state switching, selection and the fixed-rate tick thread
//! - `Visualization` - the renderer-side interface the engine drives

pub mod camera;
mod config;
mod engine;
mod input;
mod session;
mod state;
mod visualization;

pub use camera::CameraLimits;
pub use config::{KeyBindings, NavigationConfig};
pub use engine::{NavigationEngine, SelectionListenerId};
pub use input::{Button, InputChannel, InputEvent, InputSink, KeyButton, MouseButton};
pub use session::NavSession;
pub use state::{NavContext, NavState};
pub use visualization::{ObjectRef, SelectionListener, Visualization};
