use posefuse_3d::camera::CameraIntrinsics;
use posefuse_3d::pointcloud::PointCloud;
use posefuse_3d::rgbd::{project, validate_intrinsics};
use posefuse_sync::{StreamError, TransformLookup};

use crate::error::FusionError;
use crate::frame::{Frame, SkipReason};

/// What one frame adds to the fused cloud.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameContribution {
    /// The frame's points in the reference frame.
    Points {
        /// The registered points.
        cloud: PointCloud,
        /// Timestamp of the transform used to register them.
        matched_timestamp: i64,
    },
    /// The frame was skipped.
    Skipped(SkipReason),
}

/// Counts describing a fusion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionSummary {
    /// Frames that were projected and registered.
    pub frames_fused: usize,
    /// Frames skipped because an image was missing.
    pub frames_skipped_incomplete: usize,
    /// Points in the fused cloud.
    pub points: usize,
}

/// Project one frame and move its points into the reference frame.
///
/// The frame is registered with the transform nearest to its timestamp. A frame
/// missing an image is reported as skipped, not as an error.
///
/// # Errors
///
/// Returns [`FusionError::Stream`] if `lookup` is empty and
/// [`FusionError::Projection`] if the images disagree with `intrinsics`.
pub fn register_frame<L: TransformLookup + ?Sized>(
    frame: &Frame,
    lookup: &L,
    intrinsics: &CameraIntrinsics,
) -> Result<FrameContribution, FusionError> {
    let (depth, color) = match frame.images() {
        Ok(images) => images,
        Err(reason) => return Ok(FrameContribution::Skipped(reason)),
    };

    let local = project(depth, color, intrinsics).map_err(|source| FusionError::Projection {
        timestamp: frame.timestamp,
        source,
    })?;

    let matched = lookup.nearest(frame.timestamp)?;
    let cloud = local
        .transformed(&matched.transform)
        .map_err(|source| FusionError::Transform {
            timestamp: frame.timestamp,
            source,
        })?;

    Ok(FrameContribution::Points {
        cloud,
        matched_timestamp: matched.timestamp,
    })
}

/// Fuses frames one at a time into a growing point cloud.
///
/// Each call to [`FusionAccumulator::add_frame`] either appends the whole
/// contribution of a frame or nothing, so a run can be stopped between frames
/// with a consistent result.
pub struct FusionAccumulator<'a, L: TransformLookup + ?Sized> {
    lookup: &'a L,
    intrinsics: &'a CameraIntrinsics,
    cloud: PointCloud,
    summary: FusionSummary,
}

impl<'a, L: TransformLookup + ?Sized> FusionAccumulator<'a, L> {
    /// Create an accumulator, checking the transforms and intrinsics up front.
    pub fn new(lookup: &'a L, intrinsics: &'a CameraIntrinsics) -> Result<Self, FusionError> {
        if lookup.is_empty() {
            return Err(StreamError::Empty.into());
        }
        validate_intrinsics(intrinsics)?;

        Ok(Self {
            lookup,
            intrinsics,
            cloud: PointCloud::default(),
            summary: FusionSummary::default(),
        })
    }

    /// Register `frame` and append its points.
    pub fn add_frame(&mut self, frame: &Frame) -> Result<(), FusionError> {
        let contribution = register_frame(frame, self.lookup, self.intrinsics)?;
        self.add_contribution(frame.timestamp, contribution);
        Ok(())
    }

    /// Append a contribution computed elsewhere, e.g. on a worker thread.
    pub fn add_contribution(&mut self, timestamp: i64, contribution: FrameContribution) {
        match contribution {
            FrameContribution::Points {
                cloud,
                matched_timestamp,
            } => {
                log::debug!(
                    "Frame {timestamp}: {} points, transform at {matched_timestamp} ({} ms away)",
                    cloud.len(),
                    timestamp.abs_diff(matched_timestamp)
                );
                self.summary.frames_fused += 1;
                self.summary.points += cloud.len();
                self.cloud.merge(cloud);
            }
            FrameContribution::Skipped(reason) => {
                log::warn!("Skipping frame {timestamp}: {reason}");
                match reason {
                    SkipReason::Incomplete { .. } => self.summary.frames_skipped_incomplete += 1,
                }
            }
        }
    }

    /// The points fused so far.
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// The counts so far.
    pub fn summary(&self) -> FusionSummary {
        self.summary
    }

    /// Finish the run, returning the fused cloud and its summary.
    pub fn finish(self) -> (PointCloud, FusionSummary) {
        log::info!(
            "Fused {} frames into {} points, skipped {} incomplete frames",
            self.summary.frames_fused,
            self.summary.points,
            self.summary.frames_skipped_incomplete
        );
        (self.cloud, self.summary)
    }
}
