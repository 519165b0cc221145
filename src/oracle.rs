//! TransformOracle - read-only access to externally-published transforms
//!
//! The live transform service is treated as an opaque oracle: given a name
//! and a time it answers with the best-known absolute pose, or fails. The
//! editor core never writes to it.

use std::collections::HashMap;

use crate::error::{EditorError, EditorResult};
use crate::transform::Transform;

/// Get current timestamp in nanoseconds
pub fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Read-only provider of absolute poses for transform names
///
/// Implementations adapt the external live-transform service. Lookups must
/// be side-effect free and bounded: an adapter that waits on the service
/// returns [`EditorError::Timeout`] rather than blocking the command
/// pipeline. A name with no transform chain to the root at the given time
/// fails with [`EditorError::Unresolvable`].
pub trait TransformOracle {
    /// Best-known absolute pose of `name` at time `at` (nanoseconds)
    fn lookup_absolute_pose(&self, name: &str, at: u64) -> EditorResult<Transform>;

    /// All names currently known to the oracle, including live-only ones
    fn known_names(&self) -> Vec<String>;
}

/// Fixed name -> absolute pose table
///
/// Offline stand-in for the live service; also the oracle used throughout
/// the test suite. Lookups ignore the timestamp.
#[derive(Debug, Clone, Default)]
pub struct StaticOracle {
    poses: HashMap<String, Transform>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the absolute pose for a name
    pub fn insert(&mut self, name: impl Into<String>, pose: Transform) {
        self.poses.insert(name.into(), pose);
    }

    /// Drop a name from the table
    pub fn remove(&mut self, name: &str) {
        self.poses.remove(name);
    }
}

impl TransformOracle for StaticOracle {
    fn lookup_absolute_pose(&self, name: &str, _at: u64) -> EditorResult<Transform> {
        self.poses
            .get(name)
            .copied()
            .ok_or_else(|| EditorError::Unresolvable(name.to_string()))
    }

    fn known_names(&self) -> Vec<String> {
        self.poses.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_now() {
        let ts = timestamp_now();
        assert!(ts > 0);
    }

    #[test]
    fn test_static_oracle_lookup() {
        let mut oracle = StaticOracle::new();
        oracle.insert("gripper", Transform::from_translation([0.0, 0.5, 1.0]));

        let tf = oracle.lookup_absolute_pose("gripper", 0).unwrap();
        assert!((tf.translation[2] - 1.0).abs() < 1e-9);

        let err = oracle.lookup_absolute_pose("missing", 0).unwrap_err();
        assert!(matches!(err, EditorError::Unresolvable(_)));
    }

    #[test]
    fn test_static_oracle_names() {
        let mut oracle = StaticOracle::new();
        oracle.insert("a", Transform::identity());
        oracle.insert("b", Transform::identity());
        oracle.remove("a");

        assert_eq!(oracle.known_names(), vec!["b".to_string()]);
    }
}
