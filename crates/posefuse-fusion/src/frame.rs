use posefuse_3d::image::{ColorImage, DepthImage};

/// One RGBD capture: a depth and a color image taken at the same instant.
///
/// Either image may be absent when the capture lost one side; such a frame
/// is skipped by fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture time in epoch milliseconds.
    pub timestamp: i64,
    /// Raw depth samples.
    pub depth: Option<DepthImage<u16>>,
    /// Color pixels co-located with the depth samples.
    pub color: Option<ColorImage>,
}

/// Why a frame contributed no points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The depth or color image is missing.
    Incomplete {
        /// Whether the depth image is missing.
        missing_depth: bool,
        /// Whether the color image is missing.
        missing_color: bool,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Incomplete {
                missing_depth,
                missing_color,
            } => {
                let missing = match (missing_depth, missing_color) {
                    (true, true) => "depth and color",
                    (true, false) => "depth",
                    _ => "color",
                };
                write!(f, "frame is missing its {missing} image")
            }
        }
    }
}

impl Frame {
    /// Create a complete frame.
    pub fn new(timestamp: i64, depth: DepthImage<u16>, color: ColorImage) -> Self {
        Self {
            timestamp,
            depth: Some(depth),
            color: Some(color),
        }
    }

    /// Whether both images are present.
    pub fn is_complete(&self) -> bool {
        self.depth.is_some() && self.color.is_some()
    }

    /// Borrow both images, or report what is missing.
    pub fn images(&self) -> Result<(&DepthImage<u16>, &ColorImage), SkipReason> {
        match (&self.depth, &self.color) {
            (Some(depth), Some(color)) => Ok((depth, color)),
            (depth, color) => Err(SkipReason::Incomplete {
                missing_depth: depth.is_none(),
                missing_color: color.is_none(),
            }),
        }
    }
}
