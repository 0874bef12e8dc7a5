use posefuse_3d::transforms::{euler_to_matrix, RigidTransform, TransformError};

use crate::timestamp::RawTimestamp;

/// A single 6-DOF robot pose sample.
///
/// Angles `a`, `b`, `c` are degrees about x, y and z.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Sample time as read from the source.
    pub timestamp: RawTimestamp,
    /// Position along x.
    pub x: f64,
    /// Position along y.
    pub y: f64,
    /// Position along z.
    pub z: f64,
    /// Rotation about x in degrees.
    pub a: f64,
    /// Rotation about y in degrees.
    pub b: f64,
    /// Rotation about z in degrees.
    pub c: f64,
}

impl Pose {
    /// Create a pose from its timestamp and `[x, y, z, a, b, c]`.
    pub fn new(timestamp: impl Into<RawTimestamp>, xyzabc: [f64; 6]) -> Self {
        let [x, y, z, a, b, c] = xyzabc;
        Self {
            timestamp: timestamp.into(),
            x,
            y,
            z,
            a,
            b,
            c,
        }
    }

    /// The pose as `[x, y, z, a, b, c]`.
    pub fn xyzabc(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.a, self.b, self.c]
    }

    /// Convert to an absolute rigid transform.
    pub fn to_transform(&self) -> Result<RigidTransform, TransformError> {
        euler_to_matrix(self.x, self.y, self.z, self.a, self.b, self.c)
    }
}
