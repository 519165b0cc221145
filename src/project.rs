//! Project file load/save
//!
//! The on-disk format is a YAML document with one record per frame:
//!
//! ```yaml
//! frames:
//! - name: base
//!   parent: world
//!   position: [1.0, 0.0, 0.0]
//!   orientation: [0.0, 0.0, 0.0, 1.0]
//!   style: cube
//!   group: rig
//! ```
//!
//! Loading is all-or-nothing: a malformed document fails with `ParseError`,
//! a record set violating the graph invariants fails with
//! `ValidationError`, and in both cases the previous graph stays in place.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::frame::{Frame, WORLD};
use crate::graph::FrameGraph;
use crate::oracle::TransformOracle;

/// Serialized frame set
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    pub frames: Vec<Frame>,
}

impl ProjectFile {
    /// Snapshot the graph's frames, sorted by name for stable diffs
    pub fn from_graph(graph: &FrameGraph) -> Self {
        let mut frames: Vec<Frame> = graph.frames().values().cloned().collect();
        frames.sort_by(|a, b| a.name.cmp(&b.name));
        Self { frames }
    }

    /// Build and validate a graph from the records
    ///
    /// The oracle is consulted for parents that are neither `"world"` nor
    /// part of the record set (live parents).
    pub fn into_graph(self, oracle: &dyn TransformOracle) -> EditorResult<FrameGraph> {
        let mut seen = HashSet::new();
        let mut graph = FrameGraph::new();
        for frame in self.frames {
            if frame.name.is_empty() || frame.name == WORLD {
                return Err(EditorError::ValidationError(format!(
                    "'{}' is not a valid frame name",
                    frame.name
                )));
            }
            if !seen.insert(frame.name.clone()) {
                return Err(EditorError::ValidationError(format!(
                    "duplicate frame name '{}'",
                    frame.name
                )));
            }
            graph.restore_frame(frame);
        }
        graph.validate(oracle)?;
        Ok(graph)
    }
}

/// Load a project file into a validated graph
pub fn load(path: &Path, oracle: &dyn TransformOracle) -> EditorResult<FrameGraph> {
    let text = fs::read_to_string(path)?;
    let file: ProjectFile =
        serde_yaml::from_str(&text).map_err(|e| EditorError::ParseError(e.to_string()))?;
    file.into_graph(oracle)
}

/// Save the graph's frames to a project file
pub fn save(path: &Path, graph: &FrameGraph) -> EditorResult<()> {
    let file = ProjectFile::from_graph(graph);
    let text =
        serde_yaml::to_string(&file).map_err(|e| EditorError::ParseError(e.to_string()))?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StaticOracle;
    use crate::transform::Transform;

    fn sample_graph() -> FrameGraph {
        let oracle = StaticOracle::new();
        let mut graph = FrameGraph::new();
        let mut base = Frame::new("base", WORLD);
        base.position = [1.0, 2.0, 3.0];
        base.style = "cube".to_string();
        graph.add_frame(base, &oracle).unwrap();
        let mut camera = Frame::new("camera", "base");
        camera.group = "sensors".to_string();
        graph.add_frame(camera, &oracle).unwrap();
        graph
    }

    #[test]
    fn test_roundtrip() {
        let oracle = StaticOracle::new();
        let graph = sample_graph();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");

        save(&path, &graph).unwrap();
        let loaded = load(&path, &oracle).unwrap();

        assert_eq!(loaded.frame_count(), 2);
        assert_eq!(loaded.get("base").unwrap(), graph.get("base").unwrap());
        assert_eq!(loaded.get("camera").unwrap(), graph.get("camera").unwrap());
    }

    #[test]
    fn test_load_malformed() {
        let oracle = StaticOracle::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "frames: [ { name: }").unwrap();

        let err = load(&path, &oracle).unwrap_err();
        assert!(matches!(err, EditorError::ParseError(_)));
    }

    #[test]
    fn test_load_rejects_unknown_parent() {
        let oracle = StaticOracle::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphan.yaml");
        fs::write(
            &path,
            "frames:\n- name: a\n  parent: nonexistent\n",
        )
        .unwrap();

        let err = load(&path, &oracle).unwrap_err();
        assert!(matches!(err, EditorError::ValidationError(_)));
    }

    #[test]
    fn test_load_accepts_live_parent() {
        let mut oracle = StaticOracle::new();
        oracle.insert("robot", Transform::identity());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.yaml");
        fs::write(&path, "frames:\n- name: a\n  parent: robot\n").unwrap();

        let graph = load(&path, &oracle).unwrap();
        assert_eq!(graph.get("a").unwrap().parent, "robot");
    }

    #[test]
    fn test_load_rejects_duplicates() {
        let oracle = StaticOracle::new();
        let file = ProjectFile {
            frames: vec![Frame::new("a", WORLD), Frame::new("a", WORLD)],
        };
        let err = file.into_graph(&oracle).unwrap_err();
        assert!(matches!(err, EditorError::ValidationError(_)));
    }

    #[test]
    fn test_load_rejects_cycle() {
        let oracle = StaticOracle::new();
        let file = ProjectFile {
            frames: vec![Frame::new("a", "b"), Frame::new("b", "a")],
        };
        let err = file.into_graph(&oracle).unwrap_err();
        assert!(matches!(err, EditorError::ValidationError(_)));
    }
}
