//! FrameGraph - frames, relations and anchoring maintenance
//!
//! Every frame other than the root is either unanchored or holds exactly one
//! parent relation whose other endpoint is itself anchored. Following parent
//! relations from any anchored frame therefore ends at the root.
//!
//! Insertion: a relation joining an anchored and an unanchored frame becomes
//! the parent of the unanchored one, and anchoring then spreads depth-first to
//! that frame's unanchored neighbours.
//!
//! Removal: if the relation was a parent relation its child loses anchoring,
//! the loss cascades to every frame whose chain passed through it, and the
//! disconnected frames are then scanned in cascade order for a relation to a
//! still-anchored frame. The first frame that re-anchors spreads anchoring to
//! the rest of its component.
//!
//! Whenever several relations could serve as a parent, the first one in
//! insertion order wins.

use crate::frame::Frame;
use crate::listener::{FrameListener, ListenerId};
use crate::relation::{Relation, RelationParams};
use rigview_core::{FrameId, RelationId, Result, RigviewError, Transformation};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Parent relations of the frames touched by one mutation, as they were
/// before the mutation started. Kept in first-touch order.
#[derive(Default)]
struct ChangeSet {
    before: Vec<(FrameId, Option<RelationId>)>,
}

impl ChangeSet {
    fn touch(&mut self, frame: FrameId, previous: Option<RelationId>) {
        if !self.before.iter().any(|(id, _)| *id == frame) {
            self.before.push((frame, previous));
        }
    }
}

/// The frame graph of one scene
pub struct FrameGraph {
    frames: BTreeMap<FrameId, Frame>,
    relations: BTreeMap<RelationId, Relation>,
    listeners: Vec<(ListenerId, Box<dyn FrameListener>)>,
    next_frame: u64,
    next_relation: u64,
    next_listener: u64,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    /// Create a graph holding only the root frame
    pub fn new() -> Self {
        let mut frames = BTreeMap::new();
        frames.insert(FrameId::ROOT, Frame::root());
        Self {
            frames,
            relations: BTreeMap::new(),
            listeners: Vec::new(),
            next_frame: 1,
            next_relation: 1,
            next_listener: 1,
        }
    }

    // --- Mutation ---

    /// Create a disconnected, non-root frame
    pub fn add_frame(&mut self, name: impl Into<String>) -> FrameId {
        let id = FrameId(self.next_frame);
        self.next_frame += 1;

        let frame = Frame::new(id, name);
        debug!(frame = %id, name = frame.name(), "frame added");
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_frame_added(&frame);
        }
        self.frames.insert(id, frame);
        id
    }

    /// Detach every relation of the frame, then delete it
    pub fn try_remove_frame(&mut self, id: FrameId) -> Result<()> {
        if id.is_root() {
            return Err(RigviewError::RootFrame);
        }
        let incident = self
            .frames
            .get(&id)
            .map(|f| f.relations.clone())
            .ok_or(RigviewError::FrameNotFound(id))?;

        let mut changes = ChangeSet::default();
        for relation in incident {
            self.detach_relation(relation, &mut changes);
        }

        if let Some(frame) = self.frames.remove(&id) {
            debug!(frame = %id, name = frame.name(), "frame removed");
            for (_, listener) in self.listeners.iter_mut() {
                listener.on_frame_removed(&frame);
            }
        }
        self.notify_changes(changes);
        Ok(())
    }

    /// Insert a relation from `from` to `to` and propagate anchoring
    pub fn try_add_relation(
        &mut self,
        from: FrameId,
        to: FrameId,
        params: RelationParams,
    ) -> Result<RelationId> {
        self.require_frame(from)?;
        self.require_frame(to)?;
        if from == to {
            return Err(RigviewError::SelfRelation(from));
        }
        if self.find_relation(from, to).is_some() {
            return Err(RigviewError::DuplicateRelation { from, to });
        }

        let id = RelationId(self.next_relation);
        self.next_relation += 1;
        self.relations.insert(id, Relation::new(id, from, to, params));
        for endpoint in [from, to] {
            if let Some(frame) = self.frames.get_mut(&endpoint) {
                frame.relations.push(id);
            }
        }
        debug!(relation = %id, %from, %to, "relation added");

        let mut changes = ChangeSet::default();
        let from_anchored = self.is_anchored(from);
        let to_anchored = self.is_anchored(to);
        let adopter = match (from_anchored, to_anchored) {
            (true, false) => Some(to),
            (false, true) => Some(from),
            _ => None,
        };
        if let Some(frame) = adopter {
            self.set_parent(frame, Some(id), &mut changes);
            self.propagate_anchoring(frame, &mut changes);
        }
        self.notify_changes(changes);
        Ok(id)
    }

    /// Remove the relation between `a` and `b`, in whichever direction it was
    /// added, and re-derive anchoring if it carried a parent link
    pub fn try_remove_relation(&mut self, a: FrameId, b: FrameId) -> Result<()> {
        self.require_frame(a)?;
        self.require_frame(b)?;
        let id = self
            .find_relation(a, b)
            .ok_or(RigviewError::RelationNotFound { from: a, to: b })?;

        let mut changes = ChangeSet::default();
        self.detach_relation(id, &mut changes);
        self.notify_changes(changes);
        Ok(())
    }

    /// Overwrite the parameters of the `from` → `to` relation. The derived
    /// transforms follow on the next [`FrameGraph::tick`].
    pub fn try_update_relation(
        &mut self,
        from: FrameId,
        to: FrameId,
        params: RelationParams,
    ) -> Result<()> {
        let relation = self
            .find_relation(from, to)
            .and_then(|id| self.relations.get_mut(&id))
            .filter(|r| r.from() == from && r.to() == to)
            .ok_or(RigviewError::RelationNotFound { from, to })?;
        relation.set_params(params);
        Ok(())
    }

    /// Re-derive every relation's transforms from its current parameters
    pub fn tick(&mut self) {
        for relation in self.relations.values_mut() {
            relation.perform_update();
        }
    }

    // --- Listeners ---

    /// Register a listener. It immediately receives `on_frame_added` for every
    /// existing frame.
    pub fn add_listener(&mut self, mut listener: Box<dyn FrameListener>) -> ListenerId {
        for frame in self.frames.values() {
            listener.on_frame_added(frame);
        }
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregister a listener. It receives `on_frame_removed` for every
    /// existing frame on the way out.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let Some(index) = self.listeners.iter().position(|(l, _)| *l == id) else {
            return false;
        };
        let (_, mut listener) = self.listeners.remove(index);
        for frame in self.frames.values() {
            listener.on_frame_removed(frame);
        }
        true
    }

    // --- Queries ---

    pub fn root(&self) -> FrameId {
        FrameId::ROOT
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    pub fn frame_by_name(&self, name: &str) -> Option<&Frame> {
        self.frames.values().find(|f| f.name() == name)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// The relation between `a` and `b` in either direction
    pub fn relation_between(&self, a: FrameId, b: FrameId) -> Option<&Relation> {
        self.find_relation(a, b).and_then(|id| self.relations.get(&id))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains_key(&id)
    }

    /// Unknown frames count as unanchored
    pub fn is_anchored(&self, id: FrameId) -> bool {
        self.frames.get(&id).is_some_and(|f| f.is_anchored())
    }

    /// The frame at the other end of the parent relation
    pub fn parent_of(&self, id: FrameId) -> Option<FrameId> {
        let relation = self.frames.get(&id)?.parent?;
        self.relations.get(&relation).map(|r| r.other(id))
    }

    /// Transforms from the root down to `id`, outermost first, or `None` when
    /// the frame is unknown or unanchored. The root itself yields an empty chain.
    pub fn chain_to_root(&self, id: FrameId) -> Option<Vec<Transformation>> {
        let mut chain = Vec::new();
        let mut current = self.frames.get(&id)?;

        while !current.is_root() {
            // A parent chain longer than the frame count would mean a cycle.
            if chain.len() >= self.frames.len() {
                debug_assert!(false, "cycle in parent chain of frame {id}");
                return None;
            }
            let relation = self.relations.get(&current.parent?)?;
            let next = if relation.to() == current.id() {
                chain.push(*relation.transform());
                relation.from()
            } else {
                chain.push(*relation.inverse_transform());
                relation.to()
            };
            current = self.frames.get(&next)?;
        }

        chain.reverse();
        Some(chain)
    }

    /// The pose of `id` in root coordinates
    pub fn world_transform(&self, id: FrameId) -> Option<Transformation> {
        self.chain_to_root(id)
            .map(|chain| Transformation::compose_all(&chain))
    }

    // --- Internals ---

    fn require_frame(&self, id: FrameId) -> Result<()> {
        if self.frames.contains_key(&id) {
            Ok(())
        } else {
            Err(RigviewError::FrameNotFound(id))
        }
    }

    fn find_relation(&self, a: FrameId, b: FrameId) -> Option<RelationId> {
        let frame = self.frames.get(&a)?;
        frame
            .relations
            .iter()
            .copied()
            .find(|id| self.relations.get(id).is_some_and(|r| r.connects(a, b)))
    }

    fn set_parent(&mut self, id: FrameId, parent: Option<RelationId>, changes: &mut ChangeSet) {
        if let Some(frame) = self.frames.get_mut(&id) {
            changes.touch(id, frame.parent);
            frame.parent = parent;
            trace!(frame = %id, parent = ?parent, "parent relation changed");
        }
    }

    fn neighbour(&self, frame: FrameId, index: usize) -> Option<FrameId> {
        let relation = self.frames.get(&frame)?.relations.get(index)?;
        self.relations.get(relation).map(|r| r.other(frame))
    }

    /// Adopt the first relation (in insertion order) leading to an anchored
    /// frame. Returns true if the frame became anchored.
    fn adopt_parent(&mut self, id: FrameId, changes: &mut ChangeSet) -> bool {
        let Some(frame) = self.frames.get(&id) else {
            return false;
        };
        if frame.is_anchored() {
            return false;
        }
        let candidate = frame.relations.iter().copied().find(|rel| {
            self.relations
                .get(rel)
                .is_some_and(|r| self.is_anchored(r.other(id)))
        });
        match candidate {
            Some(relation) => {
                self.set_parent(id, Some(relation), changes);
                true
            }
            None => false,
        }
    }

    /// Drop the parent of `id` if the frame on the other end of it is no
    /// longer anchored. Returns true if the frame lost anchoring.
    fn drop_parent(&mut self, id: FrameId, changes: &mut ChangeSet) -> bool {
        let Some(parent) = self.frames.get(&id).and_then(|f| f.parent) else {
            return false;
        };
        let upstream = self.relations.get(&parent).map(|r| r.other(id));
        if upstream.is_some_and(|up| self.is_anchored(up)) {
            return false;
        }
        self.set_parent(id, None, changes);
        true
    }

    /// Depth-first spread of anchoring from a freshly anchored frame
    fn propagate_anchoring(&mut self, start: FrameId, changes: &mut ChangeSet) {
        let mut stack = vec![(start, 0usize)];
        while let Some((frame, index)) = stack.pop() {
            let Some(next) = self.neighbour(frame, index) else {
                continue;
            };
            stack.push((frame, index + 1));
            if self.adopt_parent(next, changes) {
                stack.push((next, 0));
            }
        }
    }

    /// Depth-first spread of anchoring loss. Every frame that loses its
    /// parent is appended to `dropped` in cascade order.
    fn propagate_loss(&mut self, start: FrameId, dropped: &mut Vec<FrameId>, changes: &mut ChangeSet) {
        let mut stack = vec![(start, 0usize)];
        while let Some((frame, index)) = stack.pop() {
            let Some(next) = self.neighbour(frame, index) else {
                continue;
            };
            stack.push((frame, index + 1));
            if self.drop_parent(next, changes) {
                dropped.push(next);
                stack.push((next, 0));
            }
        }
    }

    fn detach_relation(&mut self, id: RelationId, changes: &mut ChangeSet) {
        let Some(relation) = self.relations.remove(&id) else {
            return;
        };
        debug!(relation = %id, from = %relation.from(), to = %relation.to(), "relation removed");

        let endpoints = [relation.from(), relation.to()];
        for endpoint in endpoints {
            if let Some(frame) = self.frames.get_mut(&endpoint) {
                frame.relations.retain(|r| *r != id);
            }
        }

        for endpoint in endpoints {
            let was_parent = self
                .frames
                .get(&endpoint)
                .is_some_and(|f| f.parent == Some(id));
            if !was_parent {
                continue;
            }
            self.set_parent(endpoint, None, changes);

            let mut disconnected = vec![endpoint];
            self.propagate_loss(endpoint, &mut disconnected, changes);

            for candidate in disconnected {
                if self.adopt_parent(candidate, changes) {
                    self.propagate_anchoring(candidate, changes);
                    break;
                }
            }
        }
    }

    fn notify_changes(&mut self, changes: ChangeSet) {
        for (id, previous) in changes.before {
            let Some(frame) = self.frames.get(&id) else {
                continue;
            };
            if frame.parent == previous {
                continue;
            }
            trace!(frame = %id, anchored = frame.is_anchored(), "frame changed");
            for (_, listener) in self.listeners.iter_mut() {
                listener.on_frame_changed(frame);
            }
        }
    }
}
