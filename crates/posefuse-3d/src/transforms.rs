use std::ops::Mul;

use crate::utils::det33;

/// Default tolerance used when validating the rigid structure of a matrix.
pub const RIGID_TOLERANCE: f64 = 1e-6;

/// Error types for the transforms module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    /// One or more pose components are NaN or infinite.
    #[error("Pose is not convertible, non-finite component in {0:?}")]
    NonFinitePose([f64; 6]),

    /// A matrix does not have the structure of a rigid transform.
    #[error("Matrix is not a rigid transform: {0}")]
    NotRigid(&'static str),

    /// A flattened matrix does not have 16 elements.
    #[error("Expected 16 matrix elements, got {0}")]
    InvalidLength(usize),
}

/// A rigid transform made of a rotation and a translation.
///
/// As a homogeneous matrix the rotation occupies the top-left 3x3 block, the
/// translation the right column and the bottom row is `[0, 0, 0, 1]`.
/// Applied to a point it computes `p' = R * p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Row-major orthonormal rotation block.
    pub rotation: [[f64; 3]; 3],
    /// Translation column.
    pub translation: [f64; 3],
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0, 0.0, 0.0],
    };

    /// Create a transform from a rotation block and a translation.
    ///
    /// The rotation is taken as given; use [`RigidTransform::from_matrix`] to validate.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a transform from a 4x4 homogeneous matrix, checking that it is rigid.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NotRigid`] if the rotation block is not orthonormal,
    /// has a determinant different from +1 or the bottom row is not `[0, 0, 0, 1]`,
    /// all within [`RIGID_TOLERANCE`].
    pub fn from_matrix(matrix: &[[f64; 4]; 4]) -> Result<Self, TransformError> {
        let bottom = matrix[3];
        let expected_bottom = [0.0, 0.0, 0.0, 1.0];
        if bottom
            .iter()
            .zip(expected_bottom.iter())
            .any(|(a, b)| !a.is_finite() || (a - b).abs() > RIGID_TOLERANCE)
        {
            return Err(TransformError::NotRigid("bottom row is not [0, 0, 0, 1]"));
        }

        let mut rotation = [[0.0; 3]; 3];
        let mut translation = [0.0; 3];
        for i in 0..3 {
            rotation[i].copy_from_slice(&matrix[i][..3]);
            translation[i] = matrix[i][3];
        }

        let transform = Self::new(rotation, translation);
        transform.validate(RIGID_TOLERANCE)?;
        Ok(transform)
    }

    /// Create a transform from 16 row-major matrix elements.
    pub fn from_row_major(values: &[f64]) -> Result<Self, TransformError> {
        if values.len() != 16 {
            return Err(TransformError::InvalidLength(values.len()));
        }
        let mut matrix = [[0.0; 4]; 4];
        for (row, chunk) in matrix.iter_mut().zip(values.chunks_exact(4)) {
            row.copy_from_slice(chunk);
        }
        Self::from_matrix(&matrix)
    }

    /// The 4x4 homogeneous matrix of the transform.
    pub fn to_matrix(&self) -> [[f64; 4]; 4] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            [r[0][0], r[0][1], r[0][2], t[0]],
            [r[1][0], r[1][1], r[1][2], t[1]],
            [r[2][0], r[2][1], r[2][2], t[2]],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    /// The homogeneous matrix flattened in row-major order.
    pub fn to_row_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (chunk, row) in out.chunks_exact_mut(4).zip(self.to_matrix().iter()) {
            chunk.copy_from_slice(row);
        }
        out
    }

    /// Check the rigid structure of the transform within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<(), TransformError> {
        let r = &self.rotation;
        if r.iter().flatten().chain(self.translation.iter()).any(|v| !v.is_finite()) {
            return Err(TransformError::NotRigid("non-finite element"));
        }

        // R * R^T = I
        for i in 0..3 {
            for j in 0..3 {
                let dot = (0..3).map(|k| r[i][k] * r[j][k]).sum::<f64>();
                let expected = if i == j { 1.0 } else { 0.0 };
                if (dot - expected).abs() > tolerance {
                    return Err(TransformError::NotRigid("rotation block is not orthonormal"));
                }
            }
        }

        if (det33(r) - 1.0).abs() > tolerance {
            return Err(TransformError::NotRigid("rotation determinant is not +1"));
        }

        Ok(())
    }

    /// Whether the transform is rigid within `tolerance`.
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        self.validate(tolerance).is_ok()
    }

    /// The inverse transform.
    ///
    /// Uses the orthonormality of the rotation: `R' = R^T` and `t' = -R^T * t`.
    pub fn inverse(&self) -> Self {
        let r = &self.rotation;
        let t = &self.translation;
        let mut rotation = [[0.0; 3]; 3];
        for (i, row) in rotation.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val = r[j][i];
            }
        }
        let mut translation = [0.0; 3];
        for (i, val) in translation.iter_mut().enumerate() {
            *val = -(rotation[i][0] * t[0] + rotation[i][1] * t[1] + rotation[i][2] * t[2]);
        }
        Self {
            rotation,
            translation,
        }
    }

    /// Apply the transform to a single point.
    #[inline]
    pub fn transform_point(&self, p: &[f64; 3]) -> [f64; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[0][0] * p[0] + r[0][1] * p[1] + r[0][2] * p[2] + t[0],
            r[1][0] * p[0] + r[1][1] * p[1] + r[1][2] * p[2] + t[1],
            r[2][0] * p[0] + r[2][1] * p[1] + r[2][2] * p[2] + t[2],
        ]
    }

    /// Element-wise comparison of two transforms.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.to_row_major()
            .iter()
            .zip(other.to_row_major().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Recover `[x, y, z, a, b, c]` with angles in degrees.
    ///
    /// Inverse of [`euler_to_matrix`] for `b` in `[-90, 90]`. At gimbal lock
    /// (`|b| = 90`) the rotation about X is reported as zero.
    pub fn to_xyzabc(&self) -> [f64; 6] {
        let r = &self.rotation;
        let [x, y, z] = self.translation;

        let b = (-r[2][0]).clamp(-1.0, 1.0).asin();
        let cos_b = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();

        let (a, c) = if cos_b > 1e-9 {
            (r[2][1].atan2(r[2][2]), r[1][0].atan2(r[0][0]))
        } else {
            (0.0, (-r[0][1]).atan2(r[1][1]))
        };

        [x, y, z, a.to_degrees(), b.to_degrees(), c.to_degrees()]
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    /// Compose two transforms, `self` applied after `rhs`.
    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        let a = &self.rotation;
        let b = &rhs.rotation;
        let mut rotation = [[0.0; 3]; 3];
        for (i, row) in rotation.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        RigidTransform {
            rotation,
            translation: self.transform_point(&rhs.translation),
        }
    }
}

/// Convert a 6-DOF Euler pose into a rigid transform.
///
/// The angles `a`, `b`, `c` are in degrees and rotate about X, Y and Z
/// respectively. The rotation is composed as `R = Rz(c) * Ry(b) * Rx(a)` and the
/// position `(x, y, z)` becomes the translation.
///
/// # Errors
///
/// Returns [`TransformError::NonFinitePose`] if any input is NaN or infinite.
///
/// Example:
///
/// ```
/// use posefuse_3d::transforms::euler_to_matrix;
///
/// let transform = euler_to_matrix(1.0, 2.0, 3.0, 0.0, 0.0, 90.0).unwrap();
/// assert_eq!(transform.translation, [1.0, 2.0, 3.0]);
/// assert!((transform.rotation[1][0] - 1.0).abs() < 1e-12);
/// ```
pub fn euler_to_matrix(
    x: f64,
    y: f64,
    z: f64,
    a: f64,
    b: f64,
    c: f64,
) -> Result<RigidTransform, TransformError> {
    let pose = [x, y, z, a, b, c];
    if pose.iter().any(|v| !v.is_finite()) {
        return Err(TransformError::NonFinitePose(pose));
    }

    let (sa, ca) = a.to_radians().sin_cos();
    let (sb, cb) = b.to_radians().sin_cos();
    let (sc, cc) = c.to_radians().sin_cos();

    // Rz * Ry * Rx expanded
    let rotation = [
        [cc * cb, cc * sb * sa - sc * ca, cc * sb * ca + sc * sa],
        [sc * cb, sc * sb * sa + cc * ca, sc * sb * ca - cc * sa],
        [-sb, cb * sa, cb * ca],
    ];

    Ok(RigidTransform::new(rotation, [x, y, z]))
}

/// Express `current` relative to `reference`, i.e. `inverse(reference) * current`.
///
/// Example:
///
/// ```
/// use posefuse_3d::transforms::{euler_to_matrix, relative_transform, RigidTransform};
///
/// let t = euler_to_matrix(10.0, -4.0, 2.5, 30.0, 15.0, -60.0).unwrap();
/// let rel = relative_transform(&t, &t);
/// assert!(rel.approx_eq(&RigidTransform::IDENTITY, 1e-9));
/// ```
pub fn relative_transform(reference: &RigidTransform, current: &RigidTransform) -> RigidTransform {
    reference.inverse() * *current
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn random_pose(rng: &mut impl Rng) -> [f64; 6] {
        [
            rng.random_range(-2000.0..2000.0),
            rng.random_range(-2000.0..2000.0),
            rng.random_range(-2000.0..2000.0),
            rng.random_range(-180.0..180.0),
            rng.random_range(-180.0..180.0),
            rng.random_range(-180.0..180.0),
        ]
    }

    #[test]
    fn test_euler_zero_is_identity() -> Result<(), TransformError> {
        let t = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)?;
        assert_eq!(t, RigidTransform::IDENTITY);
        Ok(())
    }

    #[test]
    fn test_euler_single_axes() -> Result<(), TransformError> {
        // 90 degrees about x maps y onto z
        let rx = euler_to_matrix(0.0, 0.0, 0.0, 90.0, 0.0, 0.0)?;
        let p = rx.transform_point(&[0.0, 1.0, 0.0]);
        assert_relative_eq!(p[2], 1.0, epsilon = 1e-12);

        // 90 degrees about y maps z onto x
        let ry = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 90.0, 0.0)?;
        let p = ry.transform_point(&[0.0, 0.0, 1.0]);
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-12);

        // 90 degrees about z maps x onto y
        let rz = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 0.0, 90.0)?;
        let p = rz.transform_point(&[1.0, 0.0, 0.0]);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_euler_composition_order() -> Result<(), TransformError> {
        let rx = euler_to_matrix(0.0, 0.0, 0.0, 20.0, 0.0, 0.0)?;
        let ry = euler_to_matrix(0.0, 0.0, 0.0, 0.0, -35.0, 0.0)?;
        let rz = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 0.0, 50.0)?;
        let expected = rz * ry * rx;
        let t = euler_to_matrix(0.0, 0.0, 0.0, 20.0, -35.0, 50.0)?;
        assert!(t.approx_eq(&expected, 1e-12));
        Ok(())
    }

    #[test]
    fn test_euler_rejects_non_finite() {
        let res = euler_to_matrix(0.0, f64::NAN, 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(res, Err(TransformError::NonFinitePose(_))));
        let res = euler_to_matrix(0.0, 0.0, 0.0, 0.0, f64::INFINITY, 0.0);
        assert!(matches!(res, Err(TransformError::NonFinitePose(_))));
    }

    #[test]
    fn test_euler_is_rigid_for_random_poses() -> Result<(), TransformError> {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let [x, y, z, a, b, c] = random_pose(&mut rng);
            let t = euler_to_matrix(x, y, z, a, b, c)?;
            t.validate(1e-6)?;
            assert_relative_eq!(det33(&t.rotation), 1.0, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_relative_transform_of_self_is_identity() -> Result<(), TransformError> {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let [x, y, z, a, b, c] = random_pose(&mut rng);
            let t = euler_to_matrix(x, y, z, a, b, c)?;
            let rel = relative_transform(&t, &t);
            assert!(rel.approx_eq(&RigidTransform::IDENTITY, 1e-9));
        }
        Ok(())
    }

    #[test]
    fn test_relative_transform_translation_only() -> Result<(), TransformError> {
        let reference = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)?;
        let current = euler_to_matrix(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)?;
        let rel = relative_transform(&reference, &current);
        assert_eq!(rel.translation, [1.0, 0.0, 0.0]);
        assert_eq!(rel.rotation, RigidTransform::IDENTITY.rotation);
        Ok(())
    }

    #[test]
    fn test_relative_transform_rotated_reference() -> Result<(), TransformError> {
        // reference yawed by 90 degrees, current one unit further along world x
        let reference = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 0.0, 90.0)?;
        let current = euler_to_matrix(1.0, 0.0, 0.0, 0.0, 0.0, 90.0)?;
        let rel = relative_transform(&reference, &current);
        // world +x is the reference frame's -y
        assert_relative_eq!(rel.translation[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(rel.translation[1], -1.0, epsilon = 1e-12);
        assert!(rel.is_rigid(1e-9));
        Ok(())
    }

    #[test]
    fn test_inverse_composes_to_identity() -> Result<(), TransformError> {
        let t = euler_to_matrix(3.0, -7.0, 11.0, 12.0, 80.0, -150.0)?;
        assert!((t * t.inverse()).approx_eq(&RigidTransform::IDENTITY, 1e-9));
        assert!((t.inverse() * t).approx_eq(&RigidTransform::IDENTITY, 1e-9));
        Ok(())
    }

    #[test]
    fn test_matrix_roundtrip_and_validation() -> Result<(), TransformError> {
        let t = euler_to_matrix(3.0, -7.0, 11.0, 12.0, 45.0, -150.0)?;
        let back = RigidTransform::from_row_major(&t.to_row_major())?;
        assert_eq!(back, t);

        let mut matrix = t.to_matrix();
        matrix[0][0] *= 2.0;
        assert!(matches!(
            RigidTransform::from_matrix(&matrix),
            Err(TransformError::NotRigid(_))
        ));

        let mut matrix = t.to_matrix();
        matrix[3][0] = 1.0;
        assert!(RigidTransform::from_matrix(&matrix).is_err());

        // a reflection is orthonormal but not a rotation
        let mut matrix = RigidTransform::IDENTITY.to_matrix();
        matrix[2][2] = -1.0;
        assert_eq!(
            RigidTransform::from_matrix(&matrix),
            Err(TransformError::NotRigid("rotation determinant is not +1"))
        );

        assert_eq!(
            RigidTransform::from_row_major(&[0.0; 12]),
            Err(TransformError::InvalidLength(12))
        );
        Ok(())
    }

    #[test]
    fn test_to_xyzabc_recovers_pose() -> Result<(), TransformError> {
        let pose = [100.0, -20.0, 5.5, 10.0, -30.0, 120.0];
        let t = euler_to_matrix(pose[0], pose[1], pose[2], pose[3], pose[4], pose[5])?;
        let back = t.to_xyzabc();
        for (a, b) in back.iter().zip(pose.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_to_xyzabc_gimbal_lock() -> Result<(), TransformError> {
        let t = euler_to_matrix(0.0, 0.0, 0.0, 0.0, 90.0, 40.0)?;
        let back = t.to_xyzabc();
        assert_relative_eq!(back[3], 0.0, epsilon = 1e-6);
        assert_relative_eq!(back[4], 90.0, epsilon = 1e-6);
        assert_relative_eq!(back[5], 40.0, epsilon = 1e-6);
        Ok(())
    }
}
