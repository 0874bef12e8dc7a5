use std::path::Path;

use posefuse_3d::camera::{CameraIntrinsics, DEFAULT_DEPTH_SCALE, DEFAULT_DEPTH_TRUNC};
use serde::{Deserialize, Serialize};

/// Error types for the intrinsics module.
#[derive(Debug, thiserror::Error)]
pub enum IntrinsicsError {
    /// Failed to read or write the file.
    #[error("Failed to read or write intrinsics file. {0}")]
    Io(#[from] std::io::Error),

    /// The JSON does not have the expected layout.
    #[error("Failed to parse intrinsics JSON. {0}")]
    Json(#[from] serde_json::Error),

    /// A value is present but unusable.
    #[error("Invalid intrinsics: {0}")]
    Invalid(&'static str),
}

/// Recording metadata stored next to the intrinsics.
///
/// Not used for projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicsMetadata {
    /// Capture frame rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    /// Camera model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Camera serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// Color stream pixel format, e.g. `RGB8`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_format: Option<String>,
    /// Depth stream pixel format, e.g. `Z16`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_format: Option<String>,
    /// Length of the recording in microseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_length_usec: Option<u64>,
}

/// Intrinsics and metadata as loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicsFile {
    /// The projection parameters.
    pub intrinsics: CameraIntrinsics,
    /// The recording metadata.
    pub metadata: IntrinsicsMetadata,
}

// the recorder layout: a column-major 3x3 camera matrix
#[derive(Debug, Serialize, Deserialize)]
struct RecorderIntrinsics {
    width: usize,
    height: usize,
    intrinsic_matrix: [f64; 9],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depth_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depth_trunc: Option<f64>,
    #[serde(flatten)]
    metadata: IntrinsicsMetadata,
}

/// Parse intrinsics from recorder JSON text.
///
/// The camera matrix is column-major: `fx` is element 0, `fy` element 4, `cx`
/// element 6 and `cy` element 7. A missing `depth_scale` defaults to
/// [`DEFAULT_DEPTH_SCALE`]. A missing `depth_trunc` is [`DEFAULT_DEPTH_TRUNC`]
/// raw units converted with the file's depth scale.
pub fn parse_intrinsics(json: &str) -> Result<IntrinsicsFile, IntrinsicsError> {
    let raw: RecorderIntrinsics = serde_json::from_str(json)?;

    if raw.width == 0 || raw.height == 0 {
        return Err(IntrinsicsError::Invalid("width and height must be positive"));
    }

    let m = raw.intrinsic_matrix;
    let depth_scale = raw.depth_scale.unwrap_or(DEFAULT_DEPTH_SCALE);
    let depth_trunc = raw
        .depth_trunc
        .unwrap_or(DEFAULT_DEPTH_TRUNC * depth_scale);
    let intrinsics = CameraIntrinsics::new(raw.width, raw.height, m[0], m[4], m[6], m[7])
        .with_depth_scale(depth_scale)
        .with_depth_trunc(depth_trunc);

    Ok(IntrinsicsFile {
        intrinsics,
        metadata: raw.metadata,
    })
}

/// Read intrinsics from a recorder JSON file.
pub fn read_intrinsics(path: impl AsRef<Path>) -> Result<IntrinsicsFile, IntrinsicsError> {
    let text = std::fs::read_to_string(path)?;
    parse_intrinsics(&text)
}

/// Write intrinsics in the recorder JSON layout.
pub fn write_intrinsics(
    path: impl AsRef<Path>,
    intrinsics: &CameraIntrinsics,
    metadata: &IntrinsicsMetadata,
) -> Result<(), IntrinsicsError> {
    let raw = RecorderIntrinsics {
        width: intrinsics.width,
        height: intrinsics.height,
        intrinsic_matrix: [
            intrinsics.fx,
            0.0,
            0.0,
            0.0,
            intrinsics.fy,
            0.0,
            intrinsics.cx,
            intrinsics.cy,
            1.0,
        ],
        depth_scale: Some(intrinsics.depth_scale),
        depth_trunc: Some(intrinsics.depth_trunc),
        metadata: metadata.clone(),
    };
    let text = serde_json::to_string_pretty(&raw)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use posefuse_3d::image::Image;
    use posefuse_3d::rgbd::project;

    const RECORDER_JSON: &str = r#"{
    "color_format": "RGB8",
    "depth_format": "Z16",
    "depth_scale": 0.0010000000474974513,
    "device_name": "Intel RealSense D435",
    "fps": 30,
    "height": 480,
    "intrinsic_matrix": [
        615.1, 0.0, 0.0,
        0.0, 615.7, 0.0,
        322.4, 238.9, 1.0
    ],
    "serial_number": "923322071234",
    "stream_length_usec": 12000000,
    "width": 640
}"#;

    #[test]
    fn test_parse_recorder_json() -> Result<(), IntrinsicsError> {
        let file = parse_intrinsics(RECORDER_JSON)?;
        let k = file.intrinsics;
        assert_eq!((k.width, k.height), (640, 480));
        assert_eq!((k.fx, k.fy, k.cx, k.cy), (615.1, 615.7, 322.4, 238.9));
        assert_eq!(k.depth_scale, 0.0010000000474974513);
        assert_eq!(k.depth_trunc, DEFAULT_DEPTH_TRUNC * 0.0010000000474974513);

        assert_eq!(file.metadata.fps, Some(30));
        assert_eq!(file.metadata.device_name.as_deref(), Some("Intel RealSense D435"));
        assert_eq!(file.metadata.stream_length_usec, Some(12_000_000));
        Ok(())
    }

    #[test]
    fn test_parse_minimal_json_uses_defaults() -> Result<(), IntrinsicsError> {
        let json = r#"{"width": 2, "height": 1, "intrinsic_matrix": [1,0,0,0,2,0,3,4,1]}"#;
        let file = parse_intrinsics(json)?;
        assert_eq!(file.intrinsics.depth_scale, DEFAULT_DEPTH_SCALE);
        assert_eq!((file.intrinsics.cx, file.intrinsics.cy), (3.0, 4.0));
        assert_eq!(file.metadata, IntrinsicsMetadata::default());
        Ok(())
    }

    #[test]
    fn test_recorder_defaults_truncate_far_depth() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{
            "width": 3, "height": 1,
            "intrinsic_matrix": [100, 0, 0, 0, 100, 0, 1, 0, 1],
            "depth_scale": 0.001
        }"#;
        let intrinsics = parse_intrinsics(json)?.intrinsics;
        assert_relative_eq!(intrinsics.depth_trunc, 1.0);

        // 0.5 m kept, 1.5 m and exactly 1 m dropped
        let depth = Image::new(intrinsics.image_size(), vec![500u16, 1500, 1000])?;
        let color = Image::from_size_val(intrinsics.image_size(), [10, 20, 30]);
        let cloud = project(&depth, &color, &intrinsics)?;
        assert_eq!(cloud.len(), 1);
        assert_relative_eq!(cloud.points()[0][2], 0.5);
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_intrinsics(r#"{"width": 640, "height": 480}"#),
            Err(IntrinsicsError::Json(_))
        ));
        assert!(matches!(
            parse_intrinsics(r#"{"width": 0, "height": 480, "intrinsic_matrix": [1,0,0,0,1,0,0,0,1]}"#),
            Err(IntrinsicsError::Invalid(_))
        ));
    }

    #[test]
    fn test_write_then_read() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("camera_intrinsic.json");
        let intrinsics = CameraIntrinsics::new(320, 240, 300.0, 301.0, 160.5, 119.5)
            .with_depth_scale(0.001)
            .with_depth_trunc(2.5);
        let metadata = IntrinsicsMetadata {
            fps: Some(15),
            serial_number: Some("42".to_string()),
            ..Default::default()
        };

        write_intrinsics(&path, &intrinsics, &metadata)?;
        let file = read_intrinsics(&path)?;
        assert_eq!(file.intrinsics, intrinsics);
        assert_eq!(file.metadata, metadata);
        Ok(())
    }
}
