//! Frame entity - a named node in the transform tree

use serde::{Deserialize, Serialize};

use crate::transform::{euler_from_quaternion, Transform, IDENTITY_QUATERNION};

/// Distinguished root frame name
pub const WORLD: &str = "world";

/// Default display style for new frames
pub const DEFAULT_STYLE: &str = "none";

/// One editable pose component
///
/// `X`/`Y`/`Z` address position components, `A`/`B`/`C` the fixed-axis
/// roll/pitch/yaw angles of the orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
    C,
}

impl Axis {
    /// Parse from the single-letter symbol used at the presentation edge
    pub fn from_symbol(symbol: char) -> Option<Axis> {
        match symbol {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            'a' => Some(Axis::A),
            'b' => Some(Axis::B),
            'c' => Some(Axis::C),
            _ => None,
        }
    }

    /// Whether this axis addresses the orientation part of the pose
    pub fn is_rotation(&self) -> bool {
        matches!(self, Axis::A | Axis::B | Axis::C)
    }

    /// Component index within `[x, y, z]` or `[roll, pitch, yaw]`
    pub fn index(&self) -> usize {
        match self {
            Axis::X | Axis::A => 0,
            Axis::Y | Axis::B => 1,
            Axis::Z | Axis::C => 2,
        }
    }

    /// Single-letter symbol
    pub fn symbol(&self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
            Axis::A => 'a',
            Axis::B => 'b',
            Axis::C => 'c',
        }
    }
}

/// A named coordinate frame holding a pose relative to a parent frame
///
/// The field layout doubles as the project-file record. Frames are only
/// ever mutated through commands; presentation code gets read-only views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique frame name
    pub name: String,
    /// Parent frame name (`"world"`, another graph frame, or a live name)
    pub parent: String,
    /// Position relative to the parent, meters
    #[serde(default)]
    pub position: [f64; 3],
    /// Orientation relative to the parent, quaternion `[x, y, z, w]`
    #[serde(default = "identity_orientation")]
    pub orientation: [f64; 4],
    /// Display style tag, opaque to the core
    #[serde(default = "default_style")]
    pub style: String,
    /// Optional display-clustering label, no tree semantics
    #[serde(default)]
    pub group: String,
}

fn identity_orientation() -> [f64; 4] {
    IDENTITY_QUATERNION
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

impl Frame {
    /// Create a frame at the parent's origin
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            position: [0.0, 0.0, 0.0],
            orientation: IDENTITY_QUATERNION,
            style: DEFAULT_STYLE.to_string(),
            group: String::new(),
        }
    }

    /// The frame's pose relative to its parent
    pub fn local_transform(&self) -> Transform {
        Transform::from_parts(self.position, self.orientation)
    }

    /// Read a single pose component
    ///
    /// Euler reads are computed from the stored quaternion on demand.
    pub fn axis_value(&self, axis: Axis) -> f64 {
        if axis.is_rotation() {
            euler_from_quaternion(self.orientation)[axis.index()]
        } else {
            self.position[axis.index()]
        }
    }
}
