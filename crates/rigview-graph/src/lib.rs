//! Rigview Graph - the live frame graph behind a remote scene
//!
//! - `FrameGraph` - arena of frames and relations that keeps exactly one
//!   anchoring path per frame back to the world root
//! - `FrameListener` / `FrameEvent` - notifications on anchoring changes
//! - `Scene` - thread-safe, disposable handle used by producers and readers
//! - `RenderBridge` - applies frame chains to visual nodes once per render tick

mod bridge;
mod frame;
mod graph;
mod listener;
mod relation;
mod scene;

pub use bridge::{NodeHandle, NodeUpdate, Placement, RenderBridge};
pub use frame::{Frame, FrameInfo, ROOT_FRAME_NAME};
pub use graph::FrameGraph;
pub use listener::{ChannelListener, FrameEvent, FrameListener, ListenerId};
pub use relation::{Relation, RelationParams};
pub use scene::Scene;
