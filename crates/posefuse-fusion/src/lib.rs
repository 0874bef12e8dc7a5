#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Incremental frame-by-frame fusion.
pub mod accumulator;

/// Error types for fusion.
pub mod error;

/// Timestamped RGBD frames.
pub mod frame;

/// Whole-sequence fusion, sequential or parallel.
pub mod fuse;

pub use accumulator::{register_frame, FrameContribution, FusionAccumulator, FusionSummary};
pub use error::FusionError;
pub use frame::{Frame, SkipReason};
pub use fuse::{fuse, fuse_with, FusionConfig};
