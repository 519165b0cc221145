//! FrameEditor - the editing session
//!
//! Owns the frame graph, the command log and the injected transform oracle.
//! Commands are applied serially through [`FrameEditor::command`]; all
//! queries are read-only and never observe a partially-applied command.

use std::path::{Path, PathBuf};

use log::info;

use crate::command::{Command, CommandLog};
use crate::error::EditorResult;
use crate::frame::{Frame, WORLD};
use crate::graph::FrameGraph;
use crate::oracle::{timestamp_now, StaticOracle, TransformOracle};
use crate::project;
use crate::transform::Transform;

/// An undoable frame-editing session
///
/// The oracle handle is injected at construction and lives for the whole
/// session; tearing the session down simply drops graph, log and oracle,
/// which is safe at any command boundary.
pub struct FrameEditor {
    graph: FrameGraph,
    log: CommandLog,
    oracle: Box<dyn TransformOracle>,
    path: Option<PathBuf>,
}

impl FrameEditor {
    /// Create a session backed by the given live-transform oracle
    pub fn new(oracle: Box<dyn TransformOracle>) -> Self {
        Self {
            graph: FrameGraph::new(),
            log: CommandLog::default(),
            oracle,
            path: None,
        }
    }

    /// Create a session with no live transform source
    pub fn offline() -> Self {
        Self::new(Box::new(StaticOracle::new()))
    }

    /// Read-only view of the graph
    pub fn graph(&self) -> &FrameGraph {
        &self.graph
    }

    /// Read-only view of all frames
    pub fn frames(&self) -> &std::collections::HashMap<String, Frame> {
        self.graph.frames()
    }

    /// The currently selected frame
    pub fn active_frame(&self) -> Option<&Frame> {
        self.graph.active_frame()
    }

    /// The session's transform oracle
    pub fn oracle(&self) -> &dyn TransformOracle {
        self.oracle.as_ref()
    }

    /// Execute a command through the undo log
    pub fn command(&mut self, command: Command) -> EditorResult<()> {
        self.log.execute(command, &mut self.graph, self.oracle.as_ref())
    }

    /// Undo the most recent command
    pub fn undo(&mut self) -> EditorResult<()> {
        self.log.undo(&mut self.graph)
    }

    /// Redo the most recently undone command
    pub fn redo(&mut self) -> EditorResult<()> {
        self.log.redo(&mut self.graph, self.oracle.as_ref())
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    /// Description of the next command to undo
    pub fn undo_description(&self) -> Option<String> {
        self.log.undo_description()
    }

    /// Description of the next command to redo
    pub fn redo_description(&self) -> Option<String> {
        self.log.redo_description()
    }

    /// All known frame names: graph frames, live oracle names and the root
    ///
    /// Transient marker names (leading underscore) are filtered out unless
    /// `include_temp` is set. The result is sorted and deduplicated.
    pub fn all_frame_ids(&self, include_temp: bool) -> Vec<String> {
        let mut names: Vec<String> = self.graph.frames().keys().cloned().collect();
        names.extend(self.oracle.known_names());
        names.push(WORLD.to_string());
        if !include_temp {
            names.retain(|n| !n.starts_with('_'));
        }
        names.sort();
        names.dedup();
        names
    }

    /// Absolute pose of any known name at the current time
    pub fn absolute_pose(&self, name: &str) -> EditorResult<Transform> {
        self.graph
            .absolute_pose(name, self.oracle.as_ref(), timestamp_now())
    }

    /// Remove every frame through an undoable command
    pub fn clear_all(&mut self) -> EditorResult<()> {
        self.command(Command::clear_all())
    }

    /// Replace the graph with the contents of a project file
    ///
    /// All-or-nothing: on any error the current graph is untouched. A
    /// successful load clears the command log and remembers the path.
    pub fn load_file(&mut self, path: &Path) -> EditorResult<()> {
        let graph = project::load(path, self.oracle.as_ref())?;
        info!("loaded {} frames from {}", graph.frame_count(), path.display());
        self.graph = graph;
        self.log.clear();
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Write the current frame set to a project file
    pub fn save_file(&mut self, path: &Path) -> EditorResult<()> {
        project::save(path, &self.graph)?;
        info!(
            "saved {} frames to {}",
            self.graph.frame_count(),
            path.display()
        );
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Path of the most recently loaded or saved project file
    pub fn current_file(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StaticOracle;

    #[test]
    fn test_all_frame_ids() {
        let mut oracle = StaticOracle::new();
        oracle.insert("robot_base", Transform::identity());
        oracle.insert("_marker_preview", Transform::identity());

        let mut editor = FrameEditor::new(Box::new(oracle));
        editor
            .command(Command::add_element(Frame::new("camera", WORLD)))
            .unwrap();

        let ids = editor.all_frame_ids(false);
        assert_eq!(ids, vec!["camera", "robot_base", "world"]);

        let ids = editor.all_frame_ids(true);
        assert!(ids.contains(&"_marker_preview".to_string()));
    }

    #[test]
    fn test_clear_all_undo_restores_selection() {
        let mut editor = FrameEditor::offline();
        editor
            .command(Command::add_element(Frame::new("a", WORLD)))
            .unwrap();
        editor
            .command(Command::add_element(Frame::new("b", "a")))
            .unwrap();

        editor.clear_all().unwrap();
        assert_eq!(editor.frames().len(), 0);
        assert!(editor.active_frame().is_none());

        editor.undo().unwrap();
        assert_eq!(editor.frames().len(), 2);
        assert_eq!(editor.active_frame().map(|f| f.name.as_str()), Some("b"));
    }

    #[test]
    fn test_load_clears_log() {
        let mut editor = FrameEditor::offline();
        editor
            .command(Command::add_element(Frame::new("scratch", WORLD)))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        editor.save_file(&path).unwrap();
        assert_eq!(editor.current_file(), Some(path.as_path()));

        editor.load_file(&path).unwrap();
        assert!(editor.frames().contains_key("scratch"));
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_failed_load_keeps_graph() {
        let mut editor = FrameEditor::offline();
        editor
            .command(Command::add_element(Frame::new("keep", WORLD)))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "frames: [ {").unwrap();

        assert!(editor.load_file(&path).is_err());
        assert!(editor.frames().contains_key("keep"));
        assert!(editor.can_undo());
    }
}
