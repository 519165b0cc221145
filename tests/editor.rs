//! End-to-end editing scenarios
//!
//! Drives a full `FrameEditor` session through command sequences and checks
//! the undo/redo contract, absolute-pose derivation and persistence.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use frame_editor::{
    Axis, Command, EditorError, Frame, FrameEditor, StaticOracle, Transform, WORLD,
};

const EPS: f64 = 1e-9;

fn snapshot(editor: &FrameEditor) -> (HashMap<String, Frame>, Option<String>) {
    (
        editor.frames().clone(),
        editor.active_frame().map(|f| f.name.clone()),
    )
}

fn build_editor() -> FrameEditor {
    let mut oracle = StaticOracle::new();
    oracle.insert("robot_base", Transform::from_translation([0.0, 2.0, 0.0]));
    oracle.insert(
        "gripper",
        Transform::from_euler([5.0, 6.0, 7.0], [0.0, 0.0, FRAC_PI_2]),
    );
    FrameEditor::new(Box::new(oracle))
}

#[test]
fn undo_all_restores_initial_state() {
    let mut editor = build_editor();

    let initial = snapshot(&editor);

    let mut base = Frame::new("base", WORLD);
    base.position = [1.0, 0.0, 0.0];
    editor.command(Command::add_element(base)).unwrap();
    editor
        .command(Command::add_element(Frame::new("camera", "base")))
        .unwrap();
    editor
        .command(Command::set_position("camera", [0.5, 0.0, 0.2]))
        .unwrap();
    editor
        .command(Command::set_value("camera", Axis::C, 0.7))
        .unwrap();
    editor
        .command(Command::set_style("camera", "axis"))
        .unwrap();
    editor
        .command(Command::set_parent("camera", WORLD, true))
        .unwrap();
    editor
        .command(Command::copy_element("camera2", "camera", WORLD))
        .unwrap();
    editor.command(Command::remove_element("base")).unwrap();
    editor.clear_all().unwrap();

    while editor.can_undo() {
        editor.undo().unwrap();
    }

    assert_eq!(snapshot(&editor), initial);
}

#[test]
fn undo_redo_roundtrip_is_exact() {
    let mut editor = build_editor();

    editor
        .command(Command::add_element(Frame::new("a", "robot_base")))
        .unwrap();
    editor
        .command(Command::align_element("a", "gripper", vec![Axis::X, Axis::C]))
        .unwrap();

    let after_execute = snapshot(&editor);

    editor.undo().unwrap();
    editor.redo().unwrap();

    assert_eq!(snapshot(&editor), after_execute);
}

#[test]
fn absolute_pose_matches_reference_composition() {
    let mut editor = FrameEditor::offline();

    let mut a = Frame::new("a", WORLD);
    a.position = [1.0, 0.0, 0.0];
    a.orientation = frame_editor::quaternion_from_euler([0.0, 0.0, FRAC_PI_2]);
    editor.command(Command::add_element(a.clone())).unwrap();

    let mut b = Frame::new("b", "a");
    b.position = [2.0, 0.0, 0.0];
    b.orientation = frame_editor::quaternion_from_euler([0.3, 0.0, 0.0]);
    editor.command(Command::add_element(b.clone())).unwrap();

    let reference = a.local_transform().compose(&b.local_transform());
    let derived = editor.absolute_pose("b").unwrap();

    for i in 0..3 {
        assert!((derived.translation[i] - reference.translation[i]).abs() < EPS);
    }
    for i in 0..4 {
        assert!((derived.rotation[i] - reference.rotation[i]).abs() < EPS);
    }
}

#[test]
fn reparent_keep_absolute_preserves_absolute_pose() {
    let mut editor = build_editor();

    // B under the live robot_base frame, then hoisted to world.
    let mut b = Frame::new("b", "robot_base");
    b.position = [1.0, 0.0, 0.0];
    editor.command(Command::add_element(b)).unwrap();

    let before = editor.absolute_pose("b").unwrap();
    editor
        .command(Command::set_parent("b", WORLD, true))
        .unwrap();
    let after = editor.absolute_pose("b").unwrap();

    for i in 0..3 {
        assert!((after.translation[i] - before.translation[i]).abs() < EPS);
    }
    // Spec scenario: parent at (0,2,0), child local (1,0,0) => world (1,2,0)
    let frame = editor.frames().get("b").unwrap();
    assert!((frame.position[0] - 1.0).abs() < EPS);
    assert!((frame.position[1] - 2.0).abs() < EPS);
    assert_eq!(frame.orientation, frame_editor::IDENTITY_QUATERNION);
}

#[test]
fn reparent_relative_keeps_local_bytes() {
    let mut editor = build_editor();

    let mut b = Frame::new("b", "robot_base");
    b.position = [1.0, 0.0, 0.0];
    editor.command(Command::add_element(b)).unwrap();

    let local_before = editor.frames().get("b").unwrap().clone();
    let abs_before = editor.absolute_pose("b").unwrap();

    editor
        .command(Command::set_parent("b", WORLD, false))
        .unwrap();

    let frame = editor.frames().get("b").unwrap();
    assert_eq!(frame.position, local_before.position);
    assert_eq!(frame.orientation, local_before.orientation);

    let abs_after = editor.absolute_pose("b").unwrap();
    assert!((abs_after.translation[1] - abs_before.translation[1]).abs() > 1.0);
}

#[test]
fn align_single_axis_changes_only_that_axis() {
    let mut editor = build_editor();

    let mut a = Frame::new("a", WORLD);
    a.position = [1.0, 1.0, 1.0];
    editor.command(Command::add_element(a)).unwrap();

    editor
        .command(Command::align_element("a", "gripper", vec![Axis::X]))
        .unwrap();

    let abs = editor.absolute_pose("a").unwrap();
    assert!((abs.translation[0] - 5.0).abs() < EPS);
    assert!((abs.translation[1] - 1.0).abs() < EPS);
    assert!((abs.translation[2] - 1.0).abs() < EPS);
    assert_eq!(abs.rotation, frame_editor::IDENTITY_QUATERNION);
}

#[test]
fn cycle_attempts_fail_and_leave_graph_unchanged() {
    let mut editor = FrameEditor::offline();

    editor
        .command(Command::add_element(Frame::new("a", WORLD)))
        .unwrap();
    editor
        .command(Command::add_element(Frame::new("b", "a")))
        .unwrap();
    editor
        .command(Command::add_element(Frame::new("c", "b")))
        .unwrap();

    let before = snapshot(&editor);

    let err = editor
        .command(Command::set_parent("a", "a", false))
        .unwrap_err();
    assert!(matches!(err, EditorError::CycleDetected(_)));

    let err = editor
        .command(Command::set_parent("a", "c", true))
        .unwrap_err();
    assert!(matches!(err, EditorError::CycleDetected(_)));

    assert_eq!(snapshot(&editor), before);
    assert_eq!(editor.undo_description().as_deref(), Some("Add frame 'c'"));
}

#[test]
fn remove_with_children_preserves_child_absolute_pose() {
    let mut editor = FrameEditor::offline();

    let mut a = Frame::new("a", WORLD);
    a.position = [0.0, 2.0, 0.0];
    a.orientation = frame_editor::quaternion_from_euler([0.0, 0.0, FRAC_PI_2]);
    editor.command(Command::add_element(a)).unwrap();

    let mut b = Frame::new("b", "a");
    b.position = [1.0, 0.0, 0.0];
    editor.command(Command::add_element(b)).unwrap();

    let abs_before = editor.absolute_pose("b").unwrap();
    editor.command(Command::remove_element("a")).unwrap();

    let frame = editor.frames().get("b").unwrap();
    assert_eq!(frame.parent, WORLD);
    let abs_after = editor.absolute_pose("b").unwrap();
    for i in 0..3 {
        assert!((abs_after.translation[i] - abs_before.translation[i]).abs() < EPS);
    }
    for i in 0..4 {
        assert!((abs_after.rotation[i] - abs_before.rotation[i]).abs() < EPS);
    }
}

#[test]
fn clear_all_undo_restores_everything() {
    let mut editor = build_editor();

    let mut base = Frame::new("base", WORLD);
    base.style = "cube".to_string();
    base.group = "rig".to_string();
    editor.command(Command::add_element(base)).unwrap();
    editor
        .command(Command::add_element(Frame::new("tool", "base")))
        .unwrap();
    editor
        .command(Command::select_element(Some("base".to_string())))
        .unwrap();

    let before = snapshot(&editor);

    editor.clear_all().unwrap();
    assert!(editor.frames().is_empty());
    assert!(editor.active_frame().is_none());

    editor.undo().unwrap();
    assert_eq!(snapshot(&editor), before);
}

#[test]
fn save_load_roundtrip_through_editor() {
    let mut editor = build_editor();

    let mut base = Frame::new("base", "robot_base");
    base.position = [0.1, 0.2, 0.3];
    base.orientation = frame_editor::quaternion_from_euler([0.1, 0.2, 0.3]);
    base.style = "sphere".to_string();
    editor.command(Command::add_element(base)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.yaml");
    editor.save_file(&path).unwrap();

    let saved_frames = editor.frames().clone();
    editor.clear_all().unwrap();
    editor.load_file(&path).unwrap();

    assert_eq!(editor.frames(), &saved_frames);
    assert!(!editor.can_undo());
}
