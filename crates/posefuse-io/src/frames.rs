use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use posefuse_3d::image::{ColorImage, DepthImage};
use posefuse_fusion::Frame;

use crate::error::IoError;
use crate::jpeg::read_image_jpeg_rgb8;
use crate::png::read_image_png_depth;

/// Error types for the frame store module.
#[derive(Debug, thiserror::Error)]
pub enum FrameStoreError {
    /// Failed to list a directory.
    #[error("Failed to list frame directory. {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode an image.
    #[error(transparent)]
    Image(#[from] IoError),

    /// The given path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// No image of either kind exists for the timestamp.
    #[error("No frame at timestamp {0}")]
    UnknownFrame(i64),

    /// One image of the pair is missing.
    #[error("Frame {timestamp} has no {missing} image")]
    Incomplete {
        /// The frame timestamp.
        timestamp: i64,
        /// Which side is missing, `"depth"` or `"color"`.
        missing: &'static str,
    },
}

/// Image paths found for one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEntry {
    /// Capture time in epoch milliseconds, taken from the file stem.
    pub timestamp: i64,
    /// Path of the depth PNG, if any.
    pub depth: Option<PathBuf>,
    /// Path of the color JPEG, if any.
    pub color: Option<PathBuf>,
}

impl FrameEntry {
    /// Whether both images were found.
    pub fn is_complete(&self) -> bool {
        self.depth.is_some() && self.color.is_some()
    }
}

/// Depth and color images stored as `<timestamp>.png` and `<timestamp>.jpg`.
///
/// The store only lists file names when opened; images are decoded on demand
/// so a long recording never has to fit in memory at once.
#[derive(Debug, Clone)]
pub struct FrameStore {
    entries: BTreeMap<i64, FrameEntry>,
}

#[derive(Clone, Copy)]
enum Side {
    Depth,
    Color,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn scan_dir(
    dir: &Path,
    extensions: &[&str],
    side: Side,
    entries: &mut BTreeMap<i64, FrameEntry>,
) -> Result<(), FrameStoreError> {
    if !dir.is_dir() {
        return Err(FrameStoreError::NotADirectory(dir.to_path_buf()));
    }

    for dir_entry in std::fs::read_dir(dir)? {
        let path = dir_entry?.path();
        if !path.is_file() || !has_extension(&path, extensions) {
            continue;
        }

        let Some(timestamp) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<i64>().ok())
        else {
            log::debug!("Ignoring {}: file stem is not a timestamp", path.display());
            continue;
        };

        let entry = entries.entry(timestamp).or_insert_with(|| FrameEntry {
            timestamp,
            depth: None,
            color: None,
        });
        let slot = match side {
            Side::Depth => &mut entry.depth,
            Side::Color => &mut entry.color,
        };

        // `0100.png` and `100.png` share a timestamp; keep a stable pick
        match slot {
            Some(existing) if *existing <= path => {
                log::warn!("Ignoring {}: duplicate timestamp {timestamp}", path.display());
            }
            _ => *slot = Some(path),
        }
    }

    Ok(())
}

fn decode_or_warn<T>(
    path: Option<&Path>,
    decode: impl FnOnce(&Path) -> Result<T, IoError>,
) -> Option<T> {
    let path = path?;
    match decode(path) {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Failed to decode {}: {e}", path.display());
            None
        }
    }
}

impl FrameStore {
    /// Index the frames in a depth and a color directory.
    ///
    /// Depth images are `<timestamp>.png`, color images `<timestamp>.jpg` or
    /// `<timestamp>.jpeg`. Files whose stem is not an integer are ignored.
    pub fn open(
        depth_dir: impl AsRef<Path>,
        color_dir: impl AsRef<Path>,
    ) -> Result<Self, FrameStoreError> {
        let mut entries = BTreeMap::new();
        scan_dir(depth_dir.as_ref(), &["png"], Side::Depth, &mut entries)?;
        scan_dir(color_dir.as_ref(), &["jpg", "jpeg"], Side::Color, &mut entries)?;

        let complete = entries.values().filter(|e| e.is_complete()).count();
        log::info!(
            "Found {} frames, {} with both images",
            entries.len(),
            complete
        );

        Ok(Self { entries })
    }

    /// All entries, ordered by timestamp.
    pub fn entries(&self) -> impl Iterator<Item = &FrameEntry> {
        self.entries.values()
    }

    /// All timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    /// Number of timestamps with at least one image.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no image was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the images of an entry. A missing image is left as `None`.
    ///
    /// # Errors
    ///
    /// Fails if an image that exists cannot be decoded.
    pub fn load(&self, entry: &FrameEntry) -> Result<Frame, FrameStoreError> {
        let depth = entry.depth.as_ref().map(read_image_png_depth).transpose()?;
        let color = entry.color.as_ref().map(read_image_jpeg_rgb8).transpose()?;
        Ok(Frame {
            timestamp: entry.timestamp,
            depth,
            color,
        })
    }

    /// Decode the images of an entry, leaving any image that fails to decode
    /// as `None` so the frame is skipped as incomplete.
    pub fn load_or_incomplete(&self, entry: &FrameEntry) -> Frame {
        Frame {
            timestamp: entry.timestamp,
            depth: decode_or_warn(entry.depth.as_deref(), |path| read_image_png_depth(path)),
            color: decode_or_warn(entry.color.as_deref(), |path| read_image_jpeg_rgb8(path)),
        }
    }

    /// Decode both images for `timestamp`.
    pub fn load_complete(
        &self,
        timestamp: i64,
    ) -> Result<(DepthImage<u16>, ColorImage), FrameStoreError> {
        let entry = self
            .entries
            .get(&timestamp)
            .ok_or(FrameStoreError::UnknownFrame(timestamp))?;

        let (depth, color) = match (&entry.depth, &entry.color) {
            (Some(depth), Some(color)) => (depth, color),
            (None, _) => {
                return Err(FrameStoreError::Incomplete {
                    timestamp,
                    missing: "depth",
                })
            }
            (_, None) => {
                return Err(FrameStoreError::Incomplete {
                    timestamp,
                    missing: "color",
                })
            }
        };

        Ok((read_image_png_depth(depth)?, read_image_jpeg_rgb8(color)?))
    }

    /// Lazily decode every frame in timestamp order.
    ///
    /// Unreadable images are logged and left out, see
    /// [`FrameStore::load_or_incomplete`].
    pub fn iter_frames(&self) -> impl Iterator<Item = Frame> + '_ {
        self.entries
            .values()
            .map(|entry| self.load_or_incomplete(entry))
    }

    /// Decode every frame in timestamp order.
    pub fn load_all(&self) -> Vec<Frame> {
        self.iter_frames().collect()
    }
}
