//! Rigid-body transform math
//!
//! Position + quaternion representation of rigid transforms with
//! composition, inversion and fixed-axis roll-pitch-yaw conversions.
//!
//! Quaternions are stored as `[x, y, z, w]` and angles are always radians.
//! Euler conversions use the fixed-axis XYZ (roll-pitch-yaw) convention:
//! the equivalent rotation matrix is `Rz(yaw) * Ry(pitch) * Rx(roll)`.
//!
//! The math here assumes unit quaternions. Callers that accept orientation
//! input from outside normalize through [`normalize_quaternion`] before
//! storing, so every quaternion read back out of the graph is unit length.

use serde::{Deserialize, Serialize};

/// Identity quaternion `[x, y, z, w]`
pub const IDENTITY_QUATERNION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Quaternions with a squared norm below this are rejected as degenerate
const MIN_NORM_SQUARED: f64 = 1e-12;

/// A rigid-body transform: translation plus unit quaternion rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation in meters
    pub translation: [f64; 3],
    /// Rotation quaternion `[x, y, z, w]`
    pub rotation: [f64; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            rotation: IDENTITY_QUATERNION,
        }
    }

    /// Pure translation
    pub fn from_translation(translation: [f64; 3]) -> Self {
        Self {
            translation,
            rotation: IDENTITY_QUATERNION,
        }
    }

    /// Build from translation and quaternion parts
    pub fn from_parts(translation: [f64; 3], rotation: [f64; 4]) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Build from translation and fixed-axis roll-pitch-yaw angles (radians)
    pub fn from_euler(translation: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            translation,
            rotation: quaternion_from_euler(rpy),
        }
    }

    /// Compose two transforms: `self` applied after `other`
    ///
    /// If `self` maps frame B into frame A and `other` maps frame C into
    /// frame B, the result maps frame C into frame A.
    pub fn compose(&self, other: &Transform) -> Transform {
        let rotated = rotate_vector(self.rotation, other.translation);
        Transform {
            translation: [
                self.translation[0] + rotated[0],
                self.translation[1] + rotated[1],
                self.translation[2] + rotated[2],
            ],
            rotation: quaternion_multiply(self.rotation, other.rotation),
        }
    }

    /// Inverse transform
    pub fn inverse(&self) -> Transform {
        let conj = quaternion_conjugate(self.rotation);
        let t = rotate_vector(conj, self.translation);
        Transform {
            translation: [-t[0], -t[1], -t[2]],
            rotation: conj,
        }
    }

    /// Apply the transform to a point
    pub fn transform_point(&self, point: [f64; 3]) -> [f64; 3] {
        let rotated = rotate_vector(self.rotation, point);
        [
            self.translation[0] + rotated[0],
            self.translation[1] + rotated[1],
            self.translation[2] + rotated[2],
        ]
    }

    /// Fixed-axis roll-pitch-yaw angles of the rotation part (radians)
    pub fn euler_angles(&self) -> [f64; 3] {
        euler_from_quaternion(self.rotation)
    }

    /// Check whether the transform is identity within a tolerance
    pub fn is_identity(&self, eps: f64) -> bool {
        self.translation.iter().all(|v| v.abs() < eps)
            && (self.rotation[3].abs() - 1.0).abs() < eps
            && self.rotation[..3].iter().all(|v| v.abs() < eps)
    }
}

/// Hamilton product `a * b` of two `[x, y, z, w]` quaternions
pub fn quaternion_multiply(a: [f64; 4], b: [f64; 4]) -> [f64; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Conjugate of a quaternion (inverse for unit quaternions)
pub fn quaternion_conjugate(q: [f64; 4]) -> [f64; 4] {
    [-q[0], -q[1], -q[2], q[3]]
}

/// Normalize a quaternion to unit length
///
/// Returns `None` for a degenerate (near-zero norm) quaternion; callers map
/// that to `EditorError::InvalidOrientation` at the mutation boundary.
pub fn normalize_quaternion(q: [f64; 4]) -> Option<[f64; 4]> {
    let norm_sq = q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3];
    if norm_sq < MIN_NORM_SQUARED || !norm_sq.is_finite() {
        return None;
    }
    let inv = 1.0 / norm_sq.sqrt();
    Some([q[0] * inv, q[1] * inv, q[2] * inv, q[3] * inv])
}

/// Rotate a vector by a unit quaternion
pub fn rotate_vector(q: [f64; 4], v: [f64; 3]) -> [f64; 3] {
    // v' = v + 2 * qv x (qv x v + w * v)
    let qv = [q[0], q[1], q[2]];
    let w = q[3];
    let uv = cross(qv, v);
    let t = cross(qv, [uv[0] + w * v[0], uv[1] + w * v[1], uv[2] + w * v[2]]);
    [v[0] + 2.0 * t[0], v[1] + 2.0 * t[1], v[2] + 2.0 * t[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Quaternion from fixed-axis roll-pitch-yaw angles (radians)
pub fn quaternion_from_euler(rpy: [f64; 3]) -> [f64; 4] {
    let (sr, cr) = (rpy[0] * 0.5).sin_cos();
    let (sp, cp) = (rpy[1] * 0.5).sin_cos();
    let (sy, cy) = (rpy[2] * 0.5).sin_cos();
    [
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    ]
}

/// Fixed-axis roll-pitch-yaw angles (radians) from a unit quaternion
pub fn euler_from_quaternion(q: [f64; 4]) -> [f64; 3] {
    let [x, y, z, w] = q;

    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

    [roll, pitch, yaw]
}
