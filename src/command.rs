//! Reversible commands and the undo/redo log
//!
//! Every graph mutation goes through a [`Command`]. A command validates and
//! applies atomically; on success it has recorded enough prior state to
//! invert itself exactly, byte for byte. The command set is a closed enum so
//! matching is exhaustive and reversibility holds by construction.
//!
//! Commands that consult the oracle (`SetParent` with keep-absolute,
//! `AlignElement`) read it once on first apply and record the resulting
//! pose; redo replays the recorded pose instead of re-reading a source that
//! may have moved since.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::error::{EditorError, EditorResult};
use crate::frame::{Axis, Frame};
use crate::graph::{FrameGraph, RemovedFrame};
use crate::oracle::{timestamp_now, TransformOracle};

/// Maximum number of commands kept on the undo stack
const MAX_UNDO_STACK_SIZE: usize = 100;

/// Snapshot of one frame's parent and local pose
#[derive(Debug, Clone)]
struct PoseRecord {
    parent: String,
    position: [f64; 3],
    orientation: [f64; 4],
}

impl PoseRecord {
    fn capture(graph: &FrameGraph, name: &str) -> EditorResult<PoseRecord> {
        let frame = graph.frame(name)?;
        Ok(PoseRecord {
            parent: frame.parent.clone(),
            position: frame.position,
            orientation: frame.orientation,
        })
    }

    fn restore(&self, graph: &mut FrameGraph, name: &str) -> EditorResult<()> {
        graph.restore_pose(name, self.parent.clone(), self.position, self.orientation)
    }
}

/// A reversible graph edit
///
/// Recorded fields (`prior_*`, `applied`, `removed`, `saved`) are filled in
/// by the first successful apply and consumed by invert/redo.
#[derive(Debug, Clone)]
pub enum Command {
    AddElement {
        frame: Frame,
        prior_active: Option<Option<String>>,
    },
    RemoveElement {
        name: String,
        removed: Option<RemovedFrame>,
    },
    CopyElement {
        new_name: String,
        source_name: String,
        parent: String,
        prior_active: Option<Option<String>>,
    },
    SelectElement {
        name: Option<String>,
        prior_active: Option<Option<String>>,
    },
    SetParent {
        name: String,
        new_parent: String,
        keep_absolute: bool,
        prior: Option<PoseSnapshot>,
        applied: Option<PoseSnapshot>,
    },
    AlignElement {
        name: String,
        source: String,
        axes: Vec<Axis>,
        prior: Option<PoseSnapshot>,
        applied: Option<PoseSnapshot>,
    },
    SetPosition {
        name: String,
        position: [f64; 3],
        prior: Option<PoseSnapshot>,
    },
    SetOrientation {
        name: String,
        orientation: [f64; 4],
        prior: Option<PoseSnapshot>,
    },
    SetValue {
        name: String,
        axis: Axis,
        value: f64,
        prior: Option<PoseSnapshot>,
    },
    SetStyle {
        name: String,
        style: String,
        prior: Option<String>,
    },
    ClearAll {
        saved: Option<(HashMap<String, Frame>, Option<String>)>,
    },
}

/// Opaque recorded pose state inside a command
#[derive(Debug, Clone)]
pub struct PoseSnapshot(PoseRecord);

impl Command {
    /// Add a new frame and select it
    pub fn add_element(frame: Frame) -> Command {
        Command::AddElement {
            frame,
            prior_active: None,
        }
    }

    /// Remove a frame; children are reparented to its parent
    pub fn remove_element(name: impl Into<String>) -> Command {
        Command::RemoveElement {
            name: name.into(),
            removed: None,
        }
    }

    /// Duplicate an existing frame's pose, style and group under a new name
    pub fn copy_element(
        new_name: impl Into<String>,
        source_name: impl Into<String>,
        parent: impl Into<String>,
    ) -> Command {
        Command::CopyElement {
            new_name: new_name.into(),
            source_name: source_name.into(),
            parent: parent.into(),
            prior_active: None,
        }
    }

    /// Change the selection; `None` clears it
    pub fn select_element(name: Option<String>) -> Command {
        Command::SelectElement {
            name,
            prior_active: None,
        }
    }

    /// Reparent a frame, optionally preserving its absolute pose
    pub fn set_parent(
        name: impl Into<String>,
        new_parent: impl Into<String>,
        keep_absolute: bool,
    ) -> Command {
        Command::SetParent {
            name: name.into(),
            new_parent: new_parent.into(),
            keep_absolute,
            prior: None,
            applied: None,
        }
    }

    /// Align a frame's absolute pose to a source on the given axes
    pub fn align_element(
        name: impl Into<String>,
        source: impl Into<String>,
        axes: Vec<Axis>,
    ) -> Command {
        Command::AlignElement {
            name: name.into(),
            source: source.into(),
            axes,
            prior: None,
            applied: None,
        }
    }

    /// Set the position relative to the parent
    pub fn set_position(name: impl Into<String>, position: [f64; 3]) -> Command {
        Command::SetPosition {
            name: name.into(),
            position,
            prior: None,
        }
    }

    /// Set the orientation relative to the parent
    pub fn set_orientation(name: impl Into<String>, orientation: [f64; 4]) -> Command {
        Command::SetOrientation {
            name: name.into(),
            orientation,
            prior: None,
        }
    }

    /// Set a single pose component
    pub fn set_value(name: impl Into<String>, axis: Axis, value: f64) -> Command {
        Command::SetValue {
            name: name.into(),
            axis,
            value,
            prior: None,
        }
    }

    /// Set the display style
    pub fn set_style(name: impl Into<String>, style: impl Into<String>) -> Command {
        Command::SetStyle {
            name: name.into(),
            style: style.into(),
            prior: None,
        }
    }

    /// Remove every frame and the selection
    pub fn clear_all() -> Command {
        Command::ClearAll { saved: None }
    }

    /// Short human-readable description, shown in undo/redo menus
    pub fn description(&self) -> String {
        match self {
            Command::AddElement { frame, .. } => format!("Add frame '{}'", frame.name),
            Command::RemoveElement { name, .. } => format!("Remove frame '{}'", name),
            Command::CopyElement {
                new_name,
                source_name,
                ..
            } => format!("Copy frame '{}' to '{}'", source_name, new_name),
            Command::SelectElement { name: Some(name), .. } => format!("Select frame '{}'", name),
            Command::SelectElement { name: None, .. } => "Clear selection".to_string(),
            Command::SetParent {
                name, new_parent, ..
            } => format!("Set parent of '{}' to '{}'", name, new_parent),
            Command::AlignElement { name, source, .. } => {
                format!("Align '{}' to '{}'", name, source)
            }
            Command::SetPosition { name, .. } => format!("Set position of '{}'", name),
            Command::SetOrientation { name, .. } => format!("Set orientation of '{}'", name),
            Command::SetValue { name, axis, .. } => {
                format!("Set {} of '{}'", axis.symbol(), name)
            }
            Command::SetStyle { name, style, .. } => {
                format!("Set style of '{}' to '{}'", name, style)
            }
            Command::ClearAll { .. } => "Clear all frames".to_string(),
        }
    }

    /// Apply the command to the graph
    ///
    /// Atomic: validation happens before any mutation, so a returned error
    /// means the graph is untouched.
    fn apply(&mut self, graph: &mut FrameGraph, oracle: &dyn TransformOracle) -> EditorResult<()> {
        // One timestamp per command keeps all oracle reads in a single
        // logical instant.
        let at = timestamp_now();
        match self {
            Command::AddElement { frame, prior_active } => {
                graph.add_frame(frame.clone(), oracle)?;
                *prior_active = Some(graph.active().map(String::from));
                graph.select(&frame.name)?;
                Ok(())
            }
            Command::RemoveElement { name, removed } => {
                *removed = Some(graph.remove_frame(name)?);
                Ok(())
            }
            Command::CopyElement {
                new_name,
                source_name,
                parent,
                prior_active,
            } => {
                let source = graph.frame(source_name)?;
                let mut copy = Frame::new(new_name.clone(), parent.clone());
                copy.position = source.position;
                copy.orientation = source.orientation;
                copy.style = source.style.clone();
                copy.group = source.group.clone();
                graph.add_frame(copy, oracle)?;
                *prior_active = Some(graph.active().map(String::from));
                graph.select(new_name)?;
                Ok(())
            }
            Command::SelectElement { name, prior_active } => {
                let prev = match name {
                    Some(name) => graph.select(name)?,
                    None => graph.clear_selection(),
                };
                *prior_active = Some(prev);
                Ok(())
            }
            Command::SetParent {
                name,
                new_parent,
                keep_absolute,
                prior,
                applied,
            } => {
                if let Some(applied) = applied {
                    // Redo: replay the recorded pose, no oracle read.
                    return applied.0.restore(graph, name);
                }
                let record = PoseRecord::capture(graph, name)?;
                graph.set_parent(name, new_parent, *keep_absolute, oracle, at)?;
                *prior = Some(PoseSnapshot(record));
                *applied = Some(PoseSnapshot(PoseRecord::capture(graph, name)?));
                Ok(())
            }
            Command::AlignElement {
                name,
                source,
                axes,
                prior,
                applied,
            } => {
                if let Some(applied) = applied {
                    return applied.0.restore(graph, name);
                }
                let record = PoseRecord::capture(graph, name)?;
                graph.align(name, source, axes, oracle, at)?;
                *prior = Some(PoseSnapshot(record));
                *applied = Some(PoseSnapshot(PoseRecord::capture(graph, name)?));
                Ok(())
            }
            Command::SetPosition {
                name,
                position,
                prior,
            } => {
                let record = PoseRecord::capture(graph, name)?;
                graph.set_position(name, *position)?;
                *prior = Some(PoseSnapshot(record));
                Ok(())
            }
            Command::SetOrientation {
                name,
                orientation,
                prior,
            } => {
                let record = PoseRecord::capture(graph, name)?;
                graph.set_orientation(name, *orientation)?;
                *prior = Some(PoseSnapshot(record));
                Ok(())
            }
            Command::SetValue {
                name,
                axis,
                value,
                prior,
            } => {
                let record = PoseRecord::capture(graph, name)?;
                graph.set_axis_value(name, *axis, *value)?;
                *prior = Some(PoseSnapshot(record));
                Ok(())
            }
            Command::SetStyle { name, style, prior } => {
                let old = graph.frame(name)?.style.clone();
                graph.set_style(name, style.clone())?;
                *prior = Some(old);
                Ok(())
            }
            Command::ClearAll { saved } => {
                *saved = Some(graph.clear());
                Ok(())
            }
        }
    }

    /// Invert a previously applied command
    ///
    /// Called in strict LIFO order, so the graph is in exactly the state
    /// the apply left it in.
    fn invert(&mut self, graph: &mut FrameGraph) -> EditorResult<()> {
        match self {
            Command::AddElement { frame, prior_active } => {
                graph.remove_frame(&frame.name)?;
                graph.set_active(flatten_recorded(prior_active)?);
                Ok(())
            }
            Command::RemoveElement { name, removed } => {
                let record = removed
                    .as_ref()
                    .ok_or_else(never_applied)?
                    .clone();
                graph.restore_frame(record.frame);
                for child in record.prior_children {
                    let name = child.name.clone();
                    graph.restore_pose(&name, child.parent, child.position, child.orientation)?;
                }
                if record.was_active {
                    graph.set_active(Some(name.clone()));
                }
                Ok(())
            }
            Command::CopyElement {
                new_name,
                prior_active,
                ..
            } => {
                graph.remove_frame(new_name)?;
                graph.set_active(flatten_recorded(prior_active)?);
                Ok(())
            }
            Command::SelectElement { prior_active, .. } => {
                graph.set_active(flatten_recorded(prior_active)?);
                Ok(())
            }
            Command::SetParent { name, prior, .. }
            | Command::AlignElement { name, prior, .. }
            | Command::SetPosition { name, prior, .. }
            | Command::SetOrientation { name, prior, .. }
            | Command::SetValue { name, prior, .. } => prior
                .as_ref()
                .ok_or_else(never_applied)?
                .0
                .restore(graph, name),
            Command::SetStyle { name, prior, .. } => {
                let style = prior.as_ref().ok_or_else(never_applied)?.clone();
                graph.set_style(name, style)
            }
            Command::ClearAll { saved } => {
                let (frames, active) = saved.take().ok_or_else(never_applied)?;
                graph.restore_all(frames, active);
                Ok(())
            }
        }
    }
}

fn never_applied() -> EditorError {
    EditorError::ValidationError("command was never applied".to_string())
}

fn flatten_recorded(recorded: &Option<Option<String>>) -> EditorResult<Option<String>> {
    recorded.clone().ok_or_else(never_applied)
}

/// Undo/redo stack of executed commands
///
/// Executing a new command clears the redo stack; the undo stack is bounded
/// and evicts its oldest entry when full.
#[derive(Debug)]
pub struct CommandLog {
    undo_stack: VecDeque<Command>,
    redo_stack: VecDeque<Command>,
    max_size: usize,
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new(MAX_UNDO_STACK_SIZE)
    }
}

impl CommandLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_size,
        }
    }

    /// Apply a command and push it onto the undo stack
    ///
    /// On failure the command is dropped, both stacks and the graph are
    /// unchanged, and the error propagates to the caller.
    pub fn execute(
        &mut self,
        mut command: Command,
        graph: &mut FrameGraph,
        oracle: &dyn TransformOracle,
    ) -> EditorResult<()> {
        command.apply(graph, oracle)?;
        debug!("executed: {}", command.description());

        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Undo the most recent command
    pub fn undo(&mut self, graph: &mut FrameGraph) -> EditorResult<()> {
        let mut command = self.undo_stack.pop_back().ok_or(EditorError::NothingToUndo)?;
        match command.invert(graph) {
            Ok(()) => {
                debug!("undone: {}", command.description());
                self.redo_stack.push_back(command);
                Ok(())
            }
            Err(err) => {
                self.undo_stack.push_back(command);
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone command
    pub fn redo(
        &mut self,
        graph: &mut FrameGraph,
        oracle: &dyn TransformOracle,
    ) -> EditorResult<()> {
        let mut command = self.redo_stack.pop_back().ok_or(EditorError::NothingToRedo)?;
        match command.apply(graph, oracle) {
            Ok(()) => {
                debug!("redone: {}", command.description());
                self.undo_stack.push_back(command);
                Ok(())
            }
            Err(err) => {
                self.redo_stack.push_back(command);
                Err(err)
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the next command to undo
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Description of the next command to redo
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// Number of undoable commands
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable commands
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
