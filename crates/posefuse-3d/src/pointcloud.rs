use glam::DVec3;

use crate::linalg::{transform_points3d, LinalgError};
use crate::transforms::RigidTransform;

/// A single colored point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Position along x.
    pub x: f64,
    /// Position along y.
    pub y: f64,
    /// Position along z.
    pub z: f64,
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Point {
    /// The position of the point.
    #[inline]
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// The color of the point.
    #[inline]
    pub fn color(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Error types for the pointcloud module.
#[derive(Debug, thiserror::Error)]
pub enum PointCloudError {
    /// Points and colors differ in length.
    #[error("Number of points ({0}) and colors ({1}) differ")]
    LengthMismatch(usize, usize),

    /// Failed to transform the points.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

/// An unordered collection of colored points.
///
/// Order carries no meaning. Merging is plain concatenation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points, one per point.
    colors: Vec<[u8; 3]>,
}

impl PointCloud {
    /// Create a new point cloud from points and their colors.
    pub fn new(points: Vec<[f64; 3]>, colors: Vec<[u8; 3]>) -> Result<Self, PointCloudError> {
        if points.len() != colors.len() {
            return Err(PointCloudError::LengthMismatch(points.len(), colors.len()));
        }
        Ok(Self { points, colors })
    }

    /// Create an empty point cloud with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// Append a single point.
    pub fn push(&mut self, point: Point) {
        self.points.push(point.position());
        self.colors.push(point.color());
    }

    /// Iterate over the points as `(x, y, z, r, g, b)` records.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.points
            .iter()
            .zip(self.colors.iter())
            .map(|(p, c)| Point {
                x: p[0],
                y: p[1],
                z: p[2],
                r: c[0],
                g: c[1],
                b: c[2],
            })
    }

    /// Append all points of `other`, consuming it.
    pub fn merge(&mut self, mut other: PointCloud) {
        self.points.append(&mut other.points);
        self.colors.append(&mut other.colors);
    }

    /// Concatenate a sequence of point clouds.
    pub fn concat(clouds: impl IntoIterator<Item = PointCloud>) -> PointCloud {
        clouds.into_iter().fold(PointCloud::default(), |mut acc, cloud| {
            acc.merge(cloud);
            acc
        })
    }

    /// Return a copy of the cloud with every point moved by `transform`.
    pub fn transformed(&self, transform: &RigidTransform) -> Result<PointCloud, PointCloudError> {
        let mut points = vec![[0.0; 3]; self.points.len()];
        transform_points3d(
            &self.points,
            &transform.rotation,
            &transform.translation,
            &mut points,
        )?;
        Ok(PointCloud {
            points,
            colors: self.colors.clone(),
        })
    }

    /// Get the minimum bound of the point cloud.
    pub fn min_bound(&self) -> Option<DVec3> {
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(|a, b| a.min(b))
    }

    /// Get the maximum bound of the point cloud.
    pub fn max_bound(&self) -> Option<DVec3> {
        self.points
            .iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(|a, b| a.max(b))
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut cloud = PointCloud::default();
        for point in iter {
            cloud.push(point);
        }
        cloud
    }
}
