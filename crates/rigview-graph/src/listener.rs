//! Frame listeners and the events they observe

use crate::frame::Frame;
use crossbeam::channel::{self, Receiver, Sender};
use rigview_core::{FrameId, RelationId};

/// Observer of frame lifecycle and anchoring changes.
///
/// Callbacks run while the graph is locked, after a mutation has finished its
/// whole cascade. Implementations must not call back into the owning scene.
/// `on_frame_changed` fires once per frame whose anchoring or parent relation
/// changed; numeric transform updates never trigger it.
pub trait FrameListener: Send {
    fn on_frame_added(&mut self, _frame: &Frame) {}

    fn on_frame_removed(&mut self, _frame: &Frame) {}

    fn on_frame_changed(&mut self, _frame: &Frame) {}
}

/// Handle returned when registering a listener, used to unregister it
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct ListenerId(pub(crate) u64);

/// Owned form of a listener callback, for consumers that read events later
#[derive(Clone, Debug, PartialEq)]
pub enum FrameEvent {
    Added {
        frame: FrameId,
        name: String,
    },
    Removed {
        frame: FrameId,
        name: String,
    },
    Changed {
        frame: FrameId,
        anchored: bool,
        parent: Option<RelationId>,
    },
}

impl FrameEvent {
    pub fn frame(&self) -> FrameId {
        match self {
            FrameEvent::Added { frame, .. }
            | FrameEvent::Removed { frame, .. }
            | FrameEvent::Changed { frame, .. } => *frame,
        }
    }
}

/// A listener that forwards every callback into a channel.
///
/// Sends never block; once the receiver is gone events are discarded.
pub struct ChannelListener {
    sender: Sender<FrameEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, Receiver<FrameEvent>) {
        let (sender, receiver) = channel::unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: FrameEvent) {
        let _ = self.sender.send(event);
    }
}

impl FrameListener for ChannelListener {
    fn on_frame_added(&mut self, frame: &Frame) {
        self.send(FrameEvent::Added {
            frame: frame.id(),
            name: frame.name().to_string(),
        });
    }

    fn on_frame_removed(&mut self, frame: &Frame) {
        self.send(FrameEvent::Removed {
            frame: frame.id(),
            name: frame.name().to_string(),
        });
    }

    fn on_frame_changed(&mut self, frame: &Frame) {
        self.send(FrameEvent::Changed {
            frame: frame.id(),
            anchored: frame.is_anchored(),
            parent: frame.parent_relation(),
        });
    }
}
