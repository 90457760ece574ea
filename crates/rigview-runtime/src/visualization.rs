//! The view the navigation engine drives

use rigview_core::{FrameId, Point3, Transformation};

/// A pickable object in the rendered scene
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRef {
    pub id: u64,
    /// Frame the object is attached to, if any
    pub frame: Option<FrameId>,
    /// Object centre in world coordinates as last rendered
    pub center: Point3,
}

/// Camera access and picking queries offered by the renderer.
///
/// Picking queries return `None` when nothing is under the cursor.
pub trait Visualization: Send {
    fn camera(&self) -> Transformation;

    fn set_camera(&mut self, camera: Transformation);

    /// First surface point under the cursor. With `include_ground` the ground
    /// plane counts as a surface.
    fn first_collision_point(&self, x: f64, y: f64, include_ground: bool) -> Option<Point3>;

    fn first_collision_object(&self, x: f64, y: f64) -> Option<ObjectRef>;

    /// Show the marker at `point`, or hide it with `None`
    fn draw_pivot_marker(&mut self, point: Option<Point3>);

    fn set_highlighted(&mut self, object: &ObjectRef, highlighted: bool);
}

/// Notified when the selected object changes
pub trait SelectionListener: Send {
    fn selection_changed(&mut self, selected: Option<&ObjectRef>);
}
