use rayon::prelude::*;

use posefuse_3d::camera::CameraIntrinsics;
use posefuse_3d::pointcloud::PointCloud;
use posefuse_sync::TransformLookup;

use crate::accumulator::{register_frame, FusionAccumulator, FusionSummary};
use crate::error::FusionError;
use crate::frame::Frame;

/// Options for a fusion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionConfig {
    /// Register frames on the rayon thread pool.
    pub parallel: bool,
}

/// Fuse frames into a single cloud in the reference frame.
///
/// See [`fuse_with`].
pub fn fuse<L: TransformLookup + Sync + ?Sized>(
    frames: &[Frame],
    lookup: &L,
    intrinsics: &CameraIntrinsics,
) -> Result<PointCloud, FusionError> {
    fuse_with(frames, lookup, intrinsics, &FusionConfig::default()).map(|(cloud, _)| cloud)
}

/// Fuse frames into a single cloud and report what was skipped.
///
/// Every complete frame is projected, registered with the transform nearest in
/// time and appended. Incomplete frames are skipped and counted. The points are
/// neither deduplicated nor downsampled. With `config.parallel` frames are
/// registered concurrently and merged in input order, giving the same cloud as
/// the sequential run.
///
/// # Errors
///
/// An empty `lookup`, unusable intrinsics or any frame whose size disagrees
/// with `intrinsics` abort the run.
///
/// Example:
///
/// ```
/// use posefuse_3d::camera::CameraIntrinsics;
/// use posefuse_3d::image::Image;
/// use posefuse_fusion::{fuse_with, Frame, FusionConfig};
/// use posefuse_sync::{build_stream, Pose};
///
/// let stream = build_stream(&[
///     Pose::new(0_i64, [0.0; 6]),
///     Pose::new(100_i64, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
/// ]);
/// let intrinsics = CameraIntrinsics::new(1, 1, 100.0, 100.0, 0.0, 0.0);
/// let frame = Frame::new(
///     95,
///     Image::from_size_val(intrinsics.image_size(), 10u16),
///     Image::from_size_val(intrinsics.image_size(), [255, 0, 0]),
/// );
///
/// let (cloud, summary) = fuse_with(&[frame], &stream, &intrinsics, &FusionConfig::default()).unwrap();
/// assert_eq!(summary.frames_fused, 1);
/// assert_eq!(cloud.points()[0], [1.0, 0.0, 10.0]);
/// ```
pub fn fuse_with<L: TransformLookup + Sync + ?Sized>(
    frames: &[Frame],
    lookup: &L,
    intrinsics: &CameraIntrinsics,
    config: &FusionConfig,
) -> Result<(PointCloud, FusionSummary), FusionError> {
    let mut accumulator = FusionAccumulator::new(lookup, intrinsics)?;

    if config.parallel {
        let contributions = frames
            .par_iter()
            .map(|frame| register_frame(frame, lookup, intrinsics))
            .collect::<Result<Vec<_>, _>>()?;

        for (frame, contribution) in frames.iter().zip(contributions) {
            accumulator.add_contribution(frame.timestamp, contribution);
        }
    } else {
        for frame in frames {
            accumulator.add_frame(frame)?;
        }
    }

    Ok(accumulator.finish())
}
