use posefuse_3d::transforms::{relative_transform, RigidTransform};

use crate::pose::Pose;
use crate::stream::{TimedTransform, TransformStream};
use crate::timestamp::normalize_timestamp;

/// Counts of what happened to each pose record while building a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Records that produced a stream entry.
    pub accepted: usize,
    /// Records skipped because the pose could not be converted.
    pub skipped_conversion: usize,
    /// Records skipped because the timestamp was not recognized.
    pub skipped_timestamp: usize,
}

impl StreamSummary {
    /// Total number of skipped records.
    pub fn skipped(&self) -> usize {
        self.skipped_conversion + self.skipped_timestamp
    }
}

/// Build a relative transform stream from pose records.
///
/// See [`build_stream_with_summary`].
pub fn build_stream<'a>(poses: impl IntoIterator<Item = &'a Pose>) -> TransformStream {
    build_stream_with_summary(poses).0
}

/// Build a relative transform stream and report skipped records.
///
/// Records are processed in input order. The first record whose timestamp and
/// pose both convert becomes the reference, so its entry is the identity; every
/// accepted record is expressed relative to it. Records that fail either
/// conversion are skipped with a warning and never become the reference.
///
/// Example:
///
/// ```
/// use posefuse_sync::{build_stream, Pose};
///
/// let poses = vec![
///     Pose::new(0_i64, [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
///     Pose::new(100_i64, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
/// ];
/// let stream = build_stream(&poses);
/// assert_eq!(stream.len(), 2);
/// assert_eq!(stream.entries()[1].transform.translation, [1.0, 0.0, 0.0]);
/// ```
pub fn build_stream_with_summary<'a>(
    poses: impl IntoIterator<Item = &'a Pose>,
) -> (TransformStream, StreamSummary) {
    let mut summary = StreamSummary::default();
    let mut reference: Option<RigidTransform> = None;
    let mut entries = Vec::new();

    for (idx, pose) in poses.into_iter().enumerate() {
        let timestamp = match normalize_timestamp(&pose.timestamp) {
            Ok(timestamp) => timestamp,
            Err(e) => {
                log::warn!("Skipping pose record {idx}: {e}");
                summary.skipped_timestamp += 1;
                continue;
            }
        };

        let absolute = match pose.to_transform() {
            Ok(transform) => transform,
            Err(e) => {
                log::warn!("Skipping pose record {idx} at {timestamp}: {e}");
                summary.skipped_conversion += 1;
                continue;
            }
        };

        let origin = *reference.get_or_insert_with(|| {
            log::debug!("Reference pose is record {idx} at {timestamp}");
            absolute
        });

        entries.push(TimedTransform {
            timestamp,
            transform: relative_transform(&origin, &absolute),
        });
        summary.accepted += 1;
    }

    log::info!(
        "Built transform stream: {} accepted, {} skipped (conversion {}, timestamp {})",
        summary.accepted,
        summary.skipped(),
        summary.skipped_conversion,
        summary.skipped_timestamp
    );

    (TransformStream::new(entries), summary)
}
