#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for image I/O.
pub mod error;

/// Depth and color frame directories.
pub mod frames;

/// Camera intrinsics in the RealSense recorder JSON layout.
pub mod intrinsics;

/// JPEG image encoding and decoding.
pub mod jpeg;

/// PNG image encoding and decoding.
pub mod png;

/// Robot pose log CSV reader.
pub mod pose_log;

/// Transform stream CSV reader and writer.
pub mod transform_csv;

pub use error::IoError;
