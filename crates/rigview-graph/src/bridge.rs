//! Render bridge - maps frames onto visual scene nodes once per render tick

use crate::listener::{FrameEvent, ListenerId};
use crate::scene::Scene;
use crossbeam::channel::Receiver;
use rigview_core::{FrameId, Result, Transformation};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// Opaque handle of a node owned by the rendering backend
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeHandle(pub u64);

/// Where a bound node should be drawn this tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// World pose of the node: frame chain composed with the node offset
    Visible(Transformation),
    /// The frame has no path to the root
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeUpdate {
    pub node: NodeHandle,
    pub placement: Placement,
    /// True when the node switched between visible and hidden since the
    /// previous tick, or on its first tick
    pub visibility_changed: bool,
}

struct Binding {
    frame: FrameId,
    offset: Transformation,
    visible: Option<bool>,
}

/// Keeps visual nodes in sync with their frames
pub struct RenderBridge {
    scene: Scene,
    listener: ListenerId,
    events: Receiver<FrameEvent>,
    bindings: BTreeMap<NodeHandle, Binding>,
}

impl RenderBridge {
    /// Subscribe to the scene. Fails if the scene is already disposed.
    /// The subscription is removed when the bridge is dropped.
    pub fn new(scene: Scene) -> Result<Self> {
        let (listener, events) = scene.subscribe()?;
        Ok(Self {
            scene,
            listener,
            events,
            bindings: BTreeMap::new(),
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Attach `node` to `frame`, placed at `offset` within the frame
    pub fn bind(&mut self, node: NodeHandle, frame: FrameId, offset: Transformation) {
        self.bindings.insert(
            node,
            Binding {
                frame,
                offset,
                visible: None,
            },
        );
    }

    pub fn unbind(&mut self, node: NodeHandle) -> bool {
        self.bindings.remove(&node).is_some()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Apply pending relation updates, then compute the placement of every
    /// bound node. Nodes whose frame was removed are unbound.
    pub fn render_tick(&mut self) -> Vec<NodeUpdate> {
        self.scene.tick();

        let removed: HashSet<FrameId> = self
            .events
            .try_iter()
            .filter_map(|event| match event {
                FrameEvent::Removed { frame, .. } => Some(frame),
                _ => None,
            })
            .collect();
        if !removed.is_empty() {
            self.bindings.retain(|node, binding| {
                let keep = !removed.contains(&binding.frame);
                if !keep {
                    trace!(node = node.0, frame = %binding.frame, "unbound node of removed frame");
                }
                keep
            });
        }

        // One lock for the whole pass, so a concurrent producer cannot
        // interleave a mutation between two nodes of the same tick.
        let bindings = &self.bindings;
        let placements: Option<Vec<Placement>> = self.scene.inspect(|graph| {
            bindings
                .values()
                .map(|binding| match graph.world_transform(binding.frame) {
                    Some(world) => Placement::Visible(world.compose(&binding.offset)),
                    None => Placement::Hidden,
                })
                .collect()
        });
        let Some(placements) = placements else {
            return Vec::new();
        };

        self.bindings
            .iter_mut()
            .zip(placements)
            .map(|((node, binding), placement)| {
                let visible = matches!(placement, Placement::Visible(_));
                let visibility_changed = binding.visible != Some(visible);
                binding.visible = Some(visible);
                NodeUpdate {
                    node: *node,
                    placement,
                    visibility_changed,
                }
            })
            .collect()
    }
}

impl Drop for RenderBridge {
    fn drop(&mut self) {
        self.scene.remove_listener(self.listener);
    }
}
