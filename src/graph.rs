//! FrameGraph - frame ownership, tree invariants and pose derivation
//!
//! Owns all editable frames and enforces the tree invariants: every parent
//! is `"world"`, another graph frame or a live name the oracle can resolve;
//! the parent relation over graph frames is acyclic; names are unique and
//! non-empty. Absolute poses are derived by walking parent links toward
//! `"world"`, delegating to the [`TransformOracle`] as soon as the chain
//! leaves the graph.
//!
//! All mutating operations validate before touching any state, so a failed
//! call leaves the graph exactly as it was. Mutations are only ever invoked
//! through commands; the graph itself has no undo awareness.

use std::collections::{HashMap, HashSet};

use crate::error::{EditorError, EditorResult};
use crate::frame::{Axis, Frame, WORLD};
use crate::oracle::TransformOracle;
use crate::transform::{
    euler_from_quaternion, normalize_quaternion, quaternion_from_euler, Transform,
};

/// Result of removing a frame, with everything needed to restore it
#[derive(Debug, Clone)]
pub struct RemovedFrame {
    /// The removed frame
    pub frame: Frame,
    /// Children as they were before being reparented to the removed
    /// frame's parent
    pub prior_children: Vec<Frame>,
    /// Whether the removed frame was the active selection
    pub was_active: bool,
}

/// The editable tree of coordinate frames
#[derive(Debug, Default)]
pub struct FrameGraph {
    /// All frames indexed by name
    frames: HashMap<String, Frame>,
    /// Currently selected frame, if any
    active: Option<String>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of all frames
    pub fn frames(&self) -> &HashMap<String, Frame> {
        &self.frames
    }

    /// Check if a frame exists
    pub fn has_frame(&self, name: &str) -> bool {
        self.frames.contains_key(name)
    }

    /// Get a frame by name
    pub fn get(&self, name: &str) -> Option<&Frame> {
        self.frames.get(name)
    }

    /// Get a frame by name, failing with `NotFound`
    pub fn frame(&self, name: &str) -> EditorResult<&Frame> {
        self.frames
            .get(name)
            .ok_or_else(|| EditorError::NotFound(name.to_string()))
    }

    /// Get frame count
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Name of the active selection
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The currently selected frame
    pub fn active_frame(&self) -> Option<&Frame> {
        self.active.as_ref().and_then(|name| self.frames.get(name))
    }

    /// Select a frame, returning the previous selection
    pub fn select(&mut self, name: &str) -> EditorResult<Option<String>> {
        if !self.frames.contains_key(name) {
            return Err(EditorError::NotFound(name.to_string()));
        }
        Ok(self.active.replace(name.to_string()))
    }

    /// Clear the selection, returning the previous one
    pub fn clear_selection(&mut self) -> Option<String> {
        self.active.take()
    }

    pub(crate) fn set_active(&mut self, active: Option<String>) {
        self.active = active;
    }

    /// Direct children of a frame
    pub fn children(&self, name: &str) -> Vec<String> {
        self.frames
            .values()
            .filter(|f| f.parent == name)
            .map(|f| f.name.clone())
            .collect()
    }

    /// All descendants of a frame (recursive)
    pub fn descendants(&self, name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut queue = self.children(name);
        while let Some(next) = queue.pop() {
            queue.extend(self.children(&next));
            result.push(next);
        }
        result
    }

    /// Whether `parent` is an acceptable parent reference
    ///
    /// Acceptable parents are `"world"`, existing graph frames and names
    /// the oracle currently knows (live frames).
    pub fn is_valid_parent(&self, parent: &str, oracle: &dyn TransformOracle) -> bool {
        !parent.is_empty()
            && (parent == WORLD
                || self.frames.contains_key(parent)
                || oracle.known_names().iter().any(|n| n == parent))
    }

    /// Add a new frame
    pub fn add_frame(&mut self, mut frame: Frame, oracle: &dyn TransformOracle) -> EditorResult<()> {
        if frame.name.is_empty() {
            return Err(EditorError::ValidationError(
                "frame name must not be empty".to_string(),
            ));
        }
        if frame.name == WORLD || self.frames.contains_key(&frame.name) {
            return Err(EditorError::DuplicateName(frame.name));
        }
        if !self.is_valid_parent(&frame.parent, oracle) {
            return Err(EditorError::InvalidParent(frame.parent));
        }
        // A fresh leaf cannot close a cycle; checked anyway so a parent
        // chain corrupted elsewhere is caught at the next mutation.
        if self.walks_through(&frame.parent, &frame.name) {
            return Err(EditorError::CycleDetected(frame.name));
        }
        frame.orientation =
            normalize_quaternion(frame.orientation).ok_or(EditorError::InvalidOrientation)?;

        self.frames.insert(frame.name.clone(), frame);
        Ok(())
    }

    /// Remove a frame
    ///
    /// Children are reparented to the removed frame's parent; each child's
    /// local pose is recomposed with the removed frame's local transform so
    /// the child's absolute pose is unchanged. The returned [`RemovedFrame`]
    /// carries everything needed to undo the removal exactly.
    pub fn remove_frame(&mut self, name: &str) -> EditorResult<RemovedFrame> {
        let frame = self
            .frames
            .get(name)
            .cloned()
            .ok_or_else(|| EditorError::NotFound(name.to_string()))?;

        let removed_local = frame.local_transform();
        let mut prior_children = Vec::new();
        let mut reparented = Vec::new();
        for child in self.frames.values() {
            if child.parent != name {
                continue;
            }
            let new_local = removed_local.compose(&child.local_transform());
            let orientation =
                normalize_quaternion(new_local.rotation).ok_or(EditorError::InvalidOrientation)?;
            prior_children.push(child.clone());
            reparented.push((child.name.clone(), new_local.translation, orientation));
        }

        // All child poses computed; mutation cannot fail from here on.
        for (child_name, position, orientation) in reparented {
            if let Some(child) = self.frames.get_mut(&child_name) {
                child.parent = frame.parent.clone();
                child.position = position;
                child.orientation = orientation;
            }
        }
        let was_active = self.active.as_deref() == Some(name);
        if was_active {
            self.active = None;
        }
        self.frames.remove(name);

        Ok(RemovedFrame {
            frame,
            prior_children,
            was_active,
        })
    }

    /// Change a frame's parent
    ///
    /// With `keep_absolute` the local pose is recomputed against the new
    /// parent so the frame's absolute pose is unchanged; otherwise the
    /// stored local pose is left untouched and is simply reinterpreted
    /// relative to the new parent.
    pub fn set_parent(
        &mut self,
        name: &str,
        new_parent: &str,
        keep_absolute: bool,
        oracle: &dyn TransformOracle,
        at: u64,
    ) -> EditorResult<()> {
        if !self.frames.contains_key(name) {
            return Err(EditorError::NotFound(name.to_string()));
        }
        if new_parent == name {
            return Err(EditorError::CycleDetected(name.to_string()));
        }
        if self.descendants(name).iter().any(|d| d == new_parent) {
            return Err(EditorError::CycleDetected(new_parent.to_string()));
        }
        if !self.is_valid_parent(new_parent, oracle) {
            return Err(EditorError::InvalidParent(new_parent.to_string()));
        }

        if keep_absolute {
            let absolute = self.absolute_pose(name, oracle, at)?;
            let parent_abs = self.resolve_absolute(new_parent, oracle, at)?;
            let local = parent_abs.inverse().compose(&absolute);
            let orientation =
                normalize_quaternion(local.rotation).ok_or(EditorError::InvalidOrientation)?;
            let frame = self.frame_mut(name)?;
            frame.parent = new_parent.to_string();
            frame.position = local.translation;
            frame.orientation = orientation;
        } else {
            self.frame_mut(name)?.parent = new_parent.to_string();
        }
        Ok(())
    }

    /// Align a frame's absolute pose to a source frame on a subset of axes
    ///
    /// Position axes are copied from the source's absolute pose; rotation
    /// axes mix fixed-axis Euler components. Requesting all three rotation
    /// axes copies the source quaternion directly, avoiding the Euler
    /// round-trip. Non-requested axes keep their prior absolute values.
    pub fn align(
        &mut self,
        name: &str,
        source: &str,
        axes: &[Axis],
        oracle: &dyn TransformOracle,
        at: u64,
    ) -> EditorResult<()> {
        let frame = self.frame(name)?.clone();
        if axes.is_empty() {
            return Ok(());
        }
        let source_abs = self
            .resolve_absolute(source, oracle, at)
            .map_err(|_| EditorError::UnknownSource(source.to_string()))?;
        let parent_abs = self.resolve_absolute(&frame.parent, oracle, at)?;
        let current_abs = parent_abs.compose(&frame.local_transform());

        let mut desired = current_abs;
        for axis in axes.iter().filter(|a| !a.is_rotation()) {
            desired.translation[axis.index()] = source_abs.translation[axis.index()];
        }
        let rotation_axes: Vec<Axis> = axes.iter().filter(|a| a.is_rotation()).copied().collect();
        if rotation_axes.len() == 3 {
            desired.rotation = source_abs.rotation;
        } else if !rotation_axes.is_empty() {
            let mut euler = euler_from_quaternion(current_abs.rotation);
            let source_euler = euler_from_quaternion(source_abs.rotation);
            for axis in &rotation_axes {
                euler[axis.index()] = source_euler[axis.index()];
            }
            desired.rotation = quaternion_from_euler(euler);
        }

        let local = parent_abs.inverse().compose(&desired);
        let orientation =
            normalize_quaternion(local.rotation).ok_or(EditorError::InvalidOrientation)?;
        let frame = self.frame_mut(name)?;
        frame.position = local.translation;
        frame.orientation = orientation;
        Ok(())
    }

    /// Set a frame's position relative to its parent
    pub fn set_position(&mut self, name: &str, position: [f64; 3]) -> EditorResult<()> {
        self.frame_mut(name)?.position = position;
        Ok(())
    }

    /// Set a frame's orientation relative to its parent
    ///
    /// The quaternion is normalized before storing; a degenerate input
    /// fails with `InvalidOrientation`.
    pub fn set_orientation(&mut self, name: &str, orientation: [f64; 4]) -> EditorResult<()> {
        let orientation =
            normalize_quaternion(orientation).ok_or(EditorError::InvalidOrientation)?;
        self.frame_mut(name)?.orientation = orientation;
        Ok(())
    }

    /// Set a single pose component
    ///
    /// Rotation axes edit one fixed-axis Euler angle while holding the
    /// other two at their last-computed values; the stored quaternion is
    /// re-normalized after every write so repeated round-trips stay bounded.
    pub fn set_axis_value(&mut self, name: &str, axis: Axis, value: f64) -> EditorResult<()> {
        if axis.is_rotation() {
            let frame = self.frame(name)?;
            let mut euler = euler_from_quaternion(frame.orientation);
            euler[axis.index()] = value;
            let orientation = normalize_quaternion(quaternion_from_euler(euler))
                .ok_or(EditorError::InvalidOrientation)?;
            self.frame_mut(name)?.orientation = orientation;
        } else {
            self.frame_mut(name)?.position[axis.index()] = value;
        }
        Ok(())
    }

    /// Set a frame's display style
    pub fn set_style(&mut self, name: &str, style: impl Into<String>) -> EditorResult<()> {
        self.frame_mut(name)?.style = style.into();
        Ok(())
    }

    /// Absolute pose of a name: the composition of its chain up to `"world"`
    ///
    /// A live-only ancestor delegates the rest of the chain to the oracle.
    /// Oracle failures (`Unresolvable`, `Timeout`) propagate to the caller.
    pub fn absolute_pose(
        &self,
        name: &str,
        oracle: &dyn TransformOracle,
        at: u64,
    ) -> EditorResult<Transform> {
        if name == WORLD {
            return Ok(Transform::identity());
        }
        let Some(frame) = self.frames.get(name) else {
            // Live-only name: the oracle owns the whole chain.
            return oracle.lookup_absolute_pose(name, at);
        };

        let mut result = frame.local_transform();
        let mut current = frame.parent.clone();
        let mut visited = HashSet::new();
        visited.insert(name.to_string());
        loop {
            if current == WORLD {
                return Ok(result);
            }
            if !visited.insert(current.clone()) {
                return Err(EditorError::CycleDetected(current));
            }
            match self.frames.get(&current) {
                Some(ancestor) => {
                    result = ancestor.local_transform().compose(&result);
                    current = ancestor.parent.clone();
                }
                None => {
                    let live = oracle.lookup_absolute_pose(&current, at)?;
                    return Ok(live.compose(&result));
                }
            }
        }
    }

    /// Absolute pose of any parent reference: `"world"`, graph frame or
    /// live name
    pub fn resolve_absolute(
        &self,
        name: &str,
        oracle: &dyn TransformOracle,
        at: u64,
    ) -> EditorResult<Transform> {
        self.absolute_pose(name, oracle, at)
    }

    /// Validate the graph invariants
    ///
    /// Used after loading a project file: parents must be resolvable,
    /// names non-empty and the parent relation acyclic. Violations are
    /// reported, never repaired.
    pub fn validate(&self, oracle: &dyn TransformOracle) -> EditorResult<()> {
        let live_names = oracle.known_names();
        for (name, frame) in &self.frames {
            if name.is_empty() || name == WORLD {
                return Err(EditorError::ValidationError(format!(
                    "'{}' is not a valid frame name",
                    name
                )));
            }
            if frame.parent.is_empty()
                || (frame.parent != WORLD
                    && !self.frames.contains_key(&frame.parent)
                    && !live_names.iter().any(|n| n == &frame.parent))
            {
                return Err(EditorError::ValidationError(format!(
                    "frame '{}' references unknown parent '{}'",
                    name, frame.parent
                )));
            }
            if normalize_quaternion(frame.orientation).is_none() {
                return Err(EditorError::ValidationError(format!(
                    "frame '{}' has a degenerate orientation",
                    name
                )));
            }
        }

        // Every frame must reach a non-graph name (ultimately "world")
        for name in self.frames.keys() {
            if self.walks_through(name, name) {
                return Err(EditorError::ValidationError(format!(
                    "cycle detected through frame '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Drop all frames and the selection, returning the prior state
    pub fn clear(&mut self) -> (HashMap<String, Frame>, Option<String>) {
        (
            std::mem::take(&mut self.frames),
            self.active.take(),
        )
    }

    pub(crate) fn restore_all(&mut self, frames: HashMap<String, Frame>, active: Option<String>) {
        self.frames = frames;
        self.active = active;
    }

    /// Re-insert a frame exactly as recorded, bypassing validation.
    /// Only used to invert commands; the recorded state was valid when
    /// captured and undo happens in strict LIFO order.
    pub(crate) fn restore_frame(&mut self, frame: Frame) {
        self.frames.insert(frame.name.clone(), frame);
    }

    pub(crate) fn restore_pose(
        &mut self,
        name: &str,
        parent: String,
        position: [f64; 3],
        orientation: [f64; 4],
    ) -> EditorResult<()> {
        let frame = self.frame_mut(name)?;
        frame.parent = parent;
        frame.position = position;
        frame.orientation = orientation;
        Ok(())
    }

    fn frame_mut(&mut self, name: &str) -> EditorResult<&mut Frame> {
        self.frames
            .get_mut(name)
            .ok_or_else(|| EditorError::NotFound(name.to_string()))
    }

    /// Whether the parent chain starting at `start` passes through `target`
    /// before leaving the graph
    fn walks_through(&self, start: &str, target: &str) -> bool {
        let mut hops = 0;
        let mut current = start;
        while let Some(frame) = self.frames.get(current) {
            if frame.parent == target {
                return true;
            }
            current = &frame.parent;
            hops += 1;
            if hops > self.frames.len() {
                // Chain longer than the frame count means a cycle that
                // does not pass through target.
                return false;
            }
        }
        false
    }
}
