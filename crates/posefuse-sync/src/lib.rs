#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Building relative transform streams from pose records.
pub mod builder;

/// Raw Euler pose records.
pub mod pose;

/// Timestamped transform streams and nearest-time lookup.
pub mod stream;

/// Timestamp parsing into epoch milliseconds.
pub mod timestamp;

pub use builder::{build_stream, build_stream_with_summary, StreamSummary};
pub use pose::Pose;
pub use stream::{
    match_nearest, SortedTransformIndex, StreamError, TimedTransform, TransformLookup,
    TransformStream,
};
pub use timestamp::{normalize_timestamp, normalize_timestamp_in, RawTimestamp, TimestampError};
