#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole RGBD camera intrinsics.
pub mod camera;

/// Minimal image containers for depth and color frames.
pub mod image;

/// I/O utilities for reading and writing 3D data.
pub mod io;

/// Linear algebra utilities.
pub mod linalg;

/// Colored point clouds.
pub mod pointcloud;

/// Back-projection of RGBD frames into point clouds.
pub mod rgbd;

/// Rigid transforms and Euler pose conversion.
pub mod transforms;

/// Conversions between fixed-size arrays and faer types.
pub mod utils;
