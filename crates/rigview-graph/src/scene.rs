//! Scene - shared, disposable handle around a frame graph
//!
//! Producers (remote robot updates) and readers (render loop, UI) hold clones
//! of the same `Scene`. Every call takes the scene lock, so a producer
//! mutation and its whole anchoring cascade are atomic with respect to
//! `chain_to_root` and `tick`.

use crate::frame::FrameInfo;
use crate::graph::FrameGraph;
use crate::listener::{ChannelListener, FrameEvent, FrameListener, ListenerId};
use crate::relation::RelationParams;
use crossbeam::channel::Receiver;
use rigview_core::{FrameId, RelationId, Result, RigviewError, Transformation};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct SceneInner {
    name: String,
    graph: Mutex<Option<FrameGraph>>,
}

/// Thread-safe scene handle. Cloning shares the same graph.
#[derive(Clone)]
pub struct Scene {
    inner: Arc<SceneInner>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SceneInner {
                name: name.into(),
                graph: Mutex::new(Some(FrameGraph::new())),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn lock(&self) -> MutexGuard<'_, Option<FrameGraph>> {
        self.inner
            .graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn with_graph<T>(&self, f: impl FnOnce(&mut FrameGraph) -> Result<T>) -> Result<T> {
        match self.lock().as_mut() {
            Some(graph) => f(graph),
            None => Err(RigviewError::SceneDisposed),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&FrameGraph) -> Option<T>) -> Option<T> {
        self.lock().as_ref().and_then(f)
    }

    fn ignore<T>(&self, op: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(scene = self.name(), op, error = %err, "ignored scene update");
                None
            }
        }
    }

    // --- Producer API: invalid requests are ignored ---

    /// Create a disconnected frame. Returns `None` once the scene is disposed.
    pub fn add_frame(&self, name: impl Into<String>) -> Option<FrameId> {
        let result = self.try_add_frame(name);
        self.ignore("add_frame", result)
    }

    pub fn remove_frame(&self, id: FrameId) {
        let result = self.try_remove_frame(id);
        self.ignore("remove_frame", result);
    }

    pub fn add_relation(&self, from: FrameId, to: FrameId, params: RelationParams) {
        let result = self.try_add_relation(from, to, params);
        self.ignore("add_relation", result);
    }

    pub fn remove_relation(&self, a: FrameId, b: FrameId) {
        let result = self.try_remove_relation(a, b);
        self.ignore("remove_relation", result);
    }

    pub fn update_relation_transform(&self, from: FrameId, to: FrameId, params: RelationParams) {
        let result = self.try_update_relation_transform(from, to, params);
        self.ignore("update_relation_transform", result);
    }

    // --- Checked variants ---

    pub fn try_add_frame(&self, name: impl Into<String>) -> Result<FrameId> {
        self.with_graph(|graph| Ok(graph.add_frame(name)))
    }

    pub fn try_remove_frame(&self, id: FrameId) -> Result<()> {
        self.with_graph(|graph| graph.try_remove_frame(id))
    }

    pub fn try_add_relation(
        &self,
        from: FrameId,
        to: FrameId,
        params: RelationParams,
    ) -> Result<RelationId> {
        self.with_graph(|graph| graph.try_add_relation(from, to, params))
    }

    pub fn try_remove_relation(&self, a: FrameId, b: FrameId) -> Result<()> {
        self.with_graph(|graph| graph.try_remove_relation(a, b))
    }

    pub fn try_update_relation_transform(
        &self,
        from: FrameId,
        to: FrameId,
        params: RelationParams,
    ) -> Result<()> {
        self.with_graph(|graph| graph.try_update_relation(from, to, params))
    }

    // --- Render cycle and queries ---

    /// Apply pending relation updates. Called once per render cycle.
    pub fn tick(&self) {
        if let Some(graph) = self.lock().as_mut() {
            graph.tick();
        }
    }

    /// Transforms from the root to `id`, root first. `None` when the frame is
    /// unanchored, unknown, or the scene is disposed.
    pub fn chain_to_root(&self, id: FrameId) -> Option<Vec<Transformation>> {
        self.read(|graph| graph.chain_to_root(id))
    }

    pub fn world_transform(&self, id: FrameId) -> Option<Transformation> {
        self.read(|graph| graph.world_transform(id))
    }

    /// Run `f` over the graph under a single lock, so every query inside it
    /// sees the same state. `None` once the scene is disposed.
    pub fn inspect<T>(&self, f: impl FnOnce(&FrameGraph) -> T) -> Option<T> {
        self.lock().as_ref().map(f)
    }

    pub fn listener_count(&self) -> usize {
        self.read(|graph| Some(graph.listener_count())).unwrap_or(0)
    }

    pub fn is_anchored(&self, id: FrameId) -> bool {
        self.read(|graph| Some(graph.is_anchored(id))).unwrap_or(false)
    }

    pub fn frame_by_name(&self, name: &str) -> Option<FrameId> {
        self.read(|graph| graph.frame_by_name(name).map(|f| f.id()))
    }

    pub fn frame(&self, id: FrameId) -> Option<FrameInfo> {
        self.read(|graph| graph.frame(id).map(|f| f.info()))
    }

    /// Snapshot of every frame, root first
    pub fn frames(&self) -> Vec<FrameInfo> {
        self.read(|graph| Some(graph.frames().map(|f| f.info()).collect()))
            .unwrap_or_default()
    }

    // --- Listeners ---

    pub fn add_listener(&self, listener: Box<dyn FrameListener>) -> Result<ListenerId> {
        self.with_graph(|graph| Ok(graph.add_listener(listener)))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.with_graph(|graph| Ok(graph.remove_listener(id)))
            .unwrap_or(false)
    }

    /// Receive frame events over a channel. The receiver first sees `Added`
    /// for every frame already in the scene.
    pub fn subscribe(&self) -> Result<(ListenerId, Receiver<FrameEvent>)> {
        let (listener, events) = ChannelListener::new();
        let id = self.add_listener(Box::new(listener))?;
        Ok((id, events))
    }

    // --- Lifecycle ---

    /// Drop the graph. Waits for any in-flight call to finish; every later
    /// call is a no-op.
    pub fn dispose(&self) {
        let graph = self.lock().take();
        if graph.is_some() {
            debug!(scene = self.name(), "scene disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().is_none()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.inner.name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
