//! Relations: rigid-transform edges between two frames

use rigview_core::{FrameId, RelationId, Transformation};

/// The six numeric parameters of a relation: translation (x, y, z) in metres
/// and yaw/pitch/roll (a, b, c) in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RelationParams {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl RelationParams {
    pub const fn new(x: f64, y: f64, z: f64, a: f64, b: f64, c: f64) -> Self {
        Self { x, y, z, a, b, c }
    }

    pub fn to_transformation(&self) -> Transformation {
        Transformation::from_xyzabc(self.x, self.y, self.z, self.a, self.b, self.c)
    }
}

/// An edge of the frame graph.
///
/// The parameters describe the pose of `to` expressed in `from`. Updating the
/// parameters does not touch the derived transforms; those are refreshed by
/// [`Relation::perform_update`] once per render tick.
#[derive(Clone, Debug)]
pub struct Relation {
    id: RelationId,
    from: FrameId,
    to: FrameId,
    params: RelationParams,
    transform: Transformation,
    inverse: Transformation,
}

impl Relation {
    pub(crate) fn new(id: RelationId, from: FrameId, to: FrameId, params: RelationParams) -> Self {
        let mut relation = Self {
            id,
            from,
            to,
            params,
            transform: Transformation::IDENTITY,
            inverse: Transformation::IDENTITY,
        };
        relation.perform_update();
        relation
    }

    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn from(&self) -> FrameId {
        self.from
    }

    pub fn to(&self) -> FrameId {
        self.to
    }

    pub fn params(&self) -> RelationParams {
        self.params
    }

    /// The endpoint that is not `frame`
    pub fn other(&self, frame: FrameId) -> FrameId {
        if frame == self.from {
            self.to
        } else {
            self.from
        }
    }

    pub fn connects(&self, a: FrameId, b: FrameId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    /// Logical update: store new parameters only
    pub(crate) fn set_params(&mut self, params: RelationParams) {
        self.params = params;
    }

    /// Applied update: re-derive the transforms from the stored parameters
    pub(crate) fn perform_update(&mut self) {
        self.transform = self.params.to_transformation();
        self.inverse = self.transform.invert();
    }

    /// from → to
    pub fn transform(&self) -> &Transformation {
        &self.transform
    }

    /// to → from
    pub fn inverse_transform(&self) -> &Transformation {
        &self.inverse
    }
}
