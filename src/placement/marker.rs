use std::fmt;

use glam::Vec3;

use crate::{
    error::FrameError,
    scene_graph::{ObjectId, Scene},
};

/// Index of a marker in the interactive set. Markers are never removed, so
/// ids stay valid for the controller's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub(super) usize);

impl MarkerId {
    #[allow(dead_code)]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl FrameEdge {
    pub const ALL: [FrameEdge; 4] = [
        FrameEdge::Top,
        FrameEdge::Bottom,
        FrameEdge::Left,
        FrameEdge::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FrameEdge::Top => "top",
            FrameEdge::Bottom => "bottom",
            FrameEdge::Left => "left",
            FrameEdge::Right => "right",
        }
    }
}

/// A position reference into the scene: a frame edge or a placed transom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Edge { edge: FrameEdge, object: ObjectId },
    Transom(ObjectId),
}

impl Bound {
    pub fn object(self) -> ObjectId {
        match self {
            Bound::Edge { object, .. } | Bound::Transom(object) => object,
        }
    }

    /// Current position of the referenced object, relative to the frame.
    pub fn position(self, scene: &Scene) -> Result<Vec3, FrameError> {
        let name = match self {
            Bound::Edge { edge, .. } => edge.name(),
            Bound::Transom(_) => "transom",
        };

        scene
            .object_translation(self.object())
            .ok_or(FrameError::DetachedObject { name })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Empty,
    /// A transom load was issued and has not completed yet.
    Pending,
    Inserted { transom: ObjectId },
}

#[derive(Debug, Clone)]
pub struct CenterMarker {
    pub left: Bound,
    pub right: Bound,
    /// Midpoint of the bounds when the marker was created. Not updated if
    /// the bounds move later.
    pub position: Vec3,
    /// The clickable cube standing for this marker.
    pub object: ObjectId,
    pub state: MarkerState,
}

impl CenterMarker {
    pub fn transom_inserted(&self) -> bool {
        matches!(self.state, MarkerState::Inserted { .. })
    }

    pub fn transom(&self) -> Option<ObjectId> {
        match self.state {
            MarkerState::Inserted { transom } => Some(transom),
            _ => None,
        }
    }
}
