/// Error types for the image module.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The pixel buffer does not match the declared image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidSize(usize, usize),
}

/// Image size in pixels
///
/// # Examples
///
/// ```
/// use posefuse_3d::image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels in the image.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// A single-plane image stored row by row.
///
/// Pixel `(u, v)` lives at `data[v * width + u]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    size: ImageSize,
    data: Vec<T>,
}

/// A depth image with raw sensor samples.
pub type DepthImage<T> = Image<T>;

/// An 8-bit RGB color image.
pub type ColorImage = Image<[u8; 3]>;

impl<T> Image<T> {
    /// Create a new image from pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidSize`] when `data.len()` is not `width * height`.
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.num_pixels() {
            return Err(ImageError::InvalidSize(data.len(), size.num_pixels()));
        }
        Ok(Self { size, data })
    }

    /// Create an image filled with a constant value.
    pub fn from_size_val(size: ImageSize, val: T) -> Self
    where
        T: Clone,
    {
        Self {
            size,
            data: vec![val; size.num_pixels()],
        }
    }

    /// The size of the image.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The width of the image.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// The height of the image.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The pixel data as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The pixel data as a mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get the pixel at column `u` and row `v`.
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> Option<&T> {
        if u >= self.size.width || v >= self.size.height {
            return None;
        }
        self.data.get(v * self.size.width + u)
    }

    /// Set the pixel at column `u` and row `v`. Out of bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, u: usize, v: usize, val: T) {
        if u < self.size.width && v < self.size.height {
            self.data[v * self.size.width + u] = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_new() -> Result<(), ImageError> {
        let image = Image::new([2, 3].into(), vec![0u16; 6])?;
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 3);
        assert_eq!(image.as_slice().len(), 6);
        Ok(())
    }

    #[test]
    fn test_image_invalid_size() {
        let res = Image::new([2, 3].into(), vec![0u16; 5]);
        assert!(matches!(res, Err(ImageError::InvalidSize(5, 6))));
    }

    #[test]
    fn test_image_get_set() {
        let mut image: ColorImage = Image::from_size_val([4, 2].into(), [0, 0, 0]);
        image.set(3, 1, [1, 2, 3]);
        assert_eq!(image.get(3, 1), Some(&[1, 2, 3]));
        assert_eq!(image.as_slice()[7], [1, 2, 3]);
        assert_eq!(image.get(4, 0), None);
    }
}
