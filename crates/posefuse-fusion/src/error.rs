use posefuse_3d::pointcloud::PointCloudError;
use posefuse_3d::rgbd::RgbdError;
use posefuse_sync::StreamError;

/// Errors that abort a fusion run.
///
/// Per-frame data faults are not errors; they are reported as skips.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// There are no transforms to register frames with.
    #[error("Cannot fuse frames. {0}")]
    Stream(#[from] StreamError),

    /// The intrinsics cannot be used for projection.
    #[error("Cannot fuse frames. {0}")]
    Intrinsics(#[from] RgbdError),

    /// A frame could not be projected with the session intrinsics.
    #[error("Failed to project frame {timestamp}. {source}")]
    Projection {
        /// Timestamp of the offending frame.
        timestamp: i64,
        /// The projection failure.
        source: RgbdError,
    },

    /// A projected frame could not be moved into the reference frame.
    #[error("Failed to transform frame {timestamp}. {source}")]
    Transform {
        /// Timestamp of the offending frame.
        timestamp: i64,
        /// The transformation failure.
        source: PointCloudError,
    },
}
