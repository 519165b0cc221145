//! Undoable hierarchical-transform editor
//!
//! A mutable tree of named coordinate frames, each holding a rigid-body
//! pose relative to a parent frame, edited exclusively through reversible
//! commands and kept synchronized against a live, externally-published set
//! of transform names.
//!
//! # Overview
//!
//! - [`Transform`] - rigid-transform math (composition, inversion,
//!   quaternion/Euler conversions)
//! - [`Frame`] - a named node with a pose relative to its parent
//! - [`FrameGraph`] - owns all frames, enforces the tree invariants and
//!   derives absolute poses
//! - [`TransformOracle`] - read-only adapter over the external live
//!   transform source
//! - [`Command`] / [`CommandLog`] - reversible edits with undo/redo
//! - [`FrameEditor`] - the editing session tying the above together
//!
//! # Example
//!
//! ```rust
//! use frame_editor::{Axis, Command, Frame, FrameEditor, WORLD};
//!
//! let mut editor = FrameEditor::offline();
//!
//! let mut base = Frame::new("base", WORLD);
//! base.position = [1.0, 0.0, 0.0];
//! editor.command(Command::add_element(base))?;
//! editor.command(Command::add_element(Frame::new("camera", "base")))?;
//!
//! editor.command(Command::set_value("camera", Axis::Z, 0.2))?;
//! let pose = editor.absolute_pose("camera")?;
//! assert!((pose.translation[2] - 0.2).abs() < 1e-9);
//!
//! editor.undo()?;
//! # Ok::<(), frame_editor::EditorError>(())
//! ```

pub mod command;
pub mod editor;
pub mod error;
pub mod frame;
pub mod graph;
pub mod oracle;
pub mod project;
pub mod transform;

pub use command::{Command, CommandLog};
pub use editor::FrameEditor;
pub use error::{EditorError, EditorResult};
pub use frame::{Axis, Frame, DEFAULT_STYLE, WORLD};
pub use graph::{FrameGraph, RemovedFrame};
pub use oracle::{timestamp_now, StaticOracle, TransformOracle};
pub use project::ProjectFile;
pub use transform::{
    euler_from_quaternion, normalize_quaternion, quaternion_from_euler, Transform,
    IDENTITY_QUATERNION,
};
