use serde::{Deserialize, Serialize};

use crate::image::ImageSize;

/// Default factor from raw depth units to scene units.
pub const DEFAULT_DEPTH_SCALE: f64 = 1.0;

/// Default maximum valid depth, in raw depth units.
///
/// Equal to scene units at [`DEFAULT_DEPTH_SCALE`]; loaders that read a
/// different scale multiply it by that scale.
pub const DEFAULT_DEPTH_TRUNC: f64 = 1000.0;

fn default_depth_scale() -> f64 {
    DEFAULT_DEPTH_SCALE
}

fn default_depth_trunc() -> f64 {
    DEFAULT_DEPTH_TRUNC
}

/// The intrinsic parameters of a pinhole RGBD camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Focal length along x in pixels.
    pub fx: f64,
    /// Focal length along y in pixels.
    pub fy: f64,
    /// Principal point x coordinate in pixels.
    pub cx: f64,
    /// Principal point y coordinate in pixels.
    pub cy: f64,
    /// Multiplier from raw depth samples to scene units.
    #[serde(default = "default_depth_scale")]
    pub depth_scale: f64,
    /// Scaled depths at or beyond this value are discarded.
    #[serde(default = "default_depth_trunc")]
    pub depth_trunc: f64,
}

impl CameraIntrinsics {
    /// Create intrinsics with the default depth scale and truncation.
    pub fn new(width: usize, height: usize, fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
            depth_scale: DEFAULT_DEPTH_SCALE,
            depth_trunc: DEFAULT_DEPTH_TRUNC,
        }
    }

    /// Set the raw depth multiplier.
    pub fn with_depth_scale(mut self, depth_scale: f64) -> Self {
        self.depth_scale = depth_scale;
        self
    }

    /// Set the maximum valid depth.
    pub fn with_depth_trunc(mut self, depth_trunc: f64) -> Self {
        self.depth_trunc = depth_trunc;
        self
    }

    /// The image size the intrinsics were calibrated for.
    pub fn image_size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// The 3x3 camera matrix.
    pub fn camera_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }
}
