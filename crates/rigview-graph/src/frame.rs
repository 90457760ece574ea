//! Frames: named nodes of the graph

use rigview_core::{FrameId, RelationId};

/// Name given to the root frame of every graph
pub const ROOT_FRAME_NAME: &str = "World Origin";

/// A node of the frame graph.
///
/// A frame keeps the ids of its incident relations in insertion order and at
/// most one parent relation leading towards the root.
#[derive(Clone, Debug)]
pub struct Frame {
    id: FrameId,
    name: String,
    root: bool,
    pub(crate) relations: Vec<RelationId>,
    pub(crate) parent: Option<RelationId>,
}

impl Frame {
    pub(crate) fn new(id: FrameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            root: false,
            relations: Vec::new(),
            parent: None,
        }
    }

    pub(crate) fn root() -> Self {
        Self {
            root: true,
            ..Self::new(FrameId::ROOT, ROOT_FRAME_NAME)
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// The root is always anchored; any other frame is anchored while it holds
    /// a parent relation.
    pub fn is_anchored(&self) -> bool {
        self.root || self.parent.is_some()
    }

    pub fn parent_relation(&self) -> Option<RelationId> {
        self.parent
    }

    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            id: self.id,
            name: self.name.clone(),
            anchored: self.is_anchored(),
            parent: self.parent,
        }
    }
}

/// An owned snapshot of a frame, handed out across the scene lock
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInfo {
    pub id: FrameId,
    pub name: String,
    pub anchored: bool,
    pub parent: Option<RelationId>,
}
