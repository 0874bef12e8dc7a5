use num_traits::ToPrimitive;

use crate::camera::CameraIntrinsics;
use crate::image::{ColorImage, DepthImage, ImageSize};
use crate::pointcloud::PointCloud;

/// Error types for the rgbd module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RgbdError {
    /// The depth or color image size disagrees with the intrinsics.
    #[error("Image sizes do not match the intrinsics {expected}: depth {depth}, color {color}")]
    IntrinsicsMismatch {
        /// The size declared by the intrinsics.
        expected: ImageSize,
        /// The size of the depth image.
        depth: ImageSize,
        /// The size of the color image.
        color: ImageSize,
    },

    /// The intrinsics cannot be used for back-projection.
    #[error("Invalid intrinsics: {0}")]
    InvalidIntrinsics(&'static str),
}

/// Check that the intrinsics describe a usable pinhole camera.
pub fn validate_intrinsics(intrinsics: &CameraIntrinsics) -> Result<(), RgbdError> {
    if !(intrinsics.fx.is_finite() && intrinsics.fx != 0.0)
        || !(intrinsics.fy.is_finite() && intrinsics.fy != 0.0)
    {
        return Err(RgbdError::InvalidIntrinsics("focal lengths must be finite and non-zero"));
    }
    if !intrinsics.cx.is_finite() || !intrinsics.cy.is_finite() {
        return Err(RgbdError::InvalidIntrinsics("principal point must be finite"));
    }
    if !(intrinsics.depth_scale.is_finite() && intrinsics.depth_scale > 0.0) {
        return Err(RgbdError::InvalidIntrinsics("depth scale must be positive"));
    }
    if intrinsics.depth_trunc.is_nan() {
        return Err(RgbdError::InvalidIntrinsics("depth truncation is NaN"));
    }
    Ok(())
}

/// Check that a depth/color pair has the size declared by the intrinsics.
pub fn check_image_sizes(
    depth: ImageSize,
    color: ImageSize,
    intrinsics: &CameraIntrinsics,
) -> Result<(), RgbdError> {
    let expected = intrinsics.image_size();
    if depth != expected || color != expected {
        return Err(RgbdError::IntrinsicsMismatch {
            expected,
            depth,
            color,
        });
    }
    Ok(())
}

/// Scale a raw depth sample, returning `None` for holes.
///
/// A sample is valid when it is strictly positive and its scaled value is finite
/// and strictly below the truncation depth.
#[inline]
pub fn scaled_depth<D: ToPrimitive>(sample: &D, intrinsics: &CameraIntrinsics) -> Option<f64> {
    let d = sample.to_f64()?;
    if !(d > 0.0) {
        return None;
    }
    let z = d * intrinsics.depth_scale;
    (z.is_finite() && z < intrinsics.depth_trunc).then_some(z)
}

/// Back-project pixel `(u, v)` at depth `z` into the camera frame.
#[inline]
pub fn unproject_pixel(u: usize, v: usize, z: f64, intrinsics: &CameraIntrinsics) -> [f64; 3] {
    let x = (u as f64 - intrinsics.cx) * z / intrinsics.fx;
    let y = (v as f64 - intrinsics.cy) * z / intrinsics.fy;
    [x, y, z]
}

/// Project a depth image and its color image into a colored point cloud.
///
/// Every pixel with a valid depth (see [`scaled_depth`]) produces one point in
/// the camera frame, colored by the co-located color pixel. Pixels without a
/// valid depth produce nothing.
///
/// # Errors
///
/// Returns [`RgbdError::IntrinsicsMismatch`] before any projection if either
/// image size differs from the intrinsics, or [`RgbdError::InvalidIntrinsics`]
/// for unusable intrinsics.
///
/// Example:
///
/// ```
/// use posefuse_3d::camera::CameraIntrinsics;
/// use posefuse_3d::image::Image;
/// use posefuse_3d::rgbd::project;
///
/// let intrinsics = CameraIntrinsics::new(2, 1, 100.0, 100.0, 0.0, 0.0);
/// let depth = Image::new([2, 1].into(), vec![500u16, 0]).unwrap();
/// let color = Image::new([2, 1].into(), vec![[255, 0, 0], [0, 255, 0]]).unwrap();
///
/// let cloud = project(&depth, &color, &intrinsics).unwrap();
/// assert_eq!(cloud.len(), 1);
/// assert_eq!(cloud.points()[0], [0.0, 0.0, 500.0]);
/// ```
pub fn project<D: ToPrimitive>(
    depth: &DepthImage<D>,
    color: &ColorImage,
    intrinsics: &CameraIntrinsics,
) -> Result<PointCloud, RgbdError> {
    check_image_sizes(depth.size(), color.size(), intrinsics)?;
    validate_intrinsics(intrinsics)?;

    let width = depth.width();
    let mut cloud = PointCloud::with_capacity(depth.as_slice().len());

    for (idx, (sample, rgb)) in depth
        .as_slice()
        .iter()
        .zip(color.as_slice().iter())
        .enumerate()
    {
        let Some(z) = scaled_depth(sample, intrinsics) else {
            continue;
        };
        let (u, v) = (idx % width, idx / width);
        let [x, y, z] = unproject_pixel(u, v, z, intrinsics);
        cloud.push(crate::pointcloud::Point {
            x,
            y,
            z,
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        });
    }

    Ok(cloud)
}
