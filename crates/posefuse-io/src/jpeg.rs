use jpeg_encoder::{ColorType, Encoder};
use posefuse_3d::image::{ColorImage, Image, ImageSize};
use std::{fs, path::Path};

use crate::error::IoError;

/// Writes the given color image as an RGB JPEG.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG image.
/// - `image` - The color image to encode.
/// - `quality` - The quality of the JPEG encoding, range from 0 (lowest) to 100 (highest)
pub fn write_image_jpeg_rgb8(
    file_path: impl AsRef<Path>,
    image: &ColorImage,
    quality: u8,
) -> Result<(), IoError> {
    let image_size = image.size();
    // baseline jpeg stores each dimension in 16 bits
    let (Ok(width), Ok(height)) = (
        u16::try_from(image_size.width),
        u16::try_from(image_size.height),
    ) else {
        return Err(IoError::InvalidImageSize(image_size));
    };

    let encoder = Encoder::new_file(file_path, quality)?;
    encoder.encode(
        image.as_slice().as_flattened(),
        width,
        height,
        ColorType::Rgb,
    )?;
    Ok(())
}

/// Read a JPEG image as RGB.
///
/// Grayscale JPEGs are expanded to three equal channels.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG file, with a `jpg` or `jpeg` extension.
pub fn read_image_jpeg_rgb8(file_path: impl AsRef<Path>) -> Result<ColorImage, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    if file_path.extension().map_or(true, |ext| {
        !ext.eq_ignore_ascii_case("jpg") && !ext.eq_ignore_ascii_case("jpeg")
    }) {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    let jpeg_data = fs::read(file_path)?;
    decode_image_jpeg_rgb8(&jpeg_data)
}

/// Decodes an RGB image from raw JPEG bytes.
pub fn decode_image_jpeg_rgb8(src: &[u8]) -> Result<ColorImage, IoError> {
    let mut decoder = zune_jpeg::JpegDecoder::new(src);
    decoder.decode_headers()?;

    let image_info = decoder.info().ok_or_else(|| {
        IoError::JpegDecodingError(zune_jpeg::errors::DecodeErrors::Format(String::from(
            "Failed to find image info from its metadata",
        )))
    })?;

    let image_size = ImageSize {
        width: image_info.width as usize,
        height: image_info.height as usize,
    };

    let img_data = decoder.decode()?;
    let num_pixels = image_size.num_pixels();

    let pixels = if img_data.len() == num_pixels * 3 {
        img_data
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect()
    } else if img_data.len() == num_pixels {
        img_data.iter().map(|&v| [v, v, v]).collect()
    } else {
        return Err(IoError::UnsupportedPixelFormat(format!(
            "decoded {} bytes for a {image_size} image",
            img_data.len()
        )));
    };

    Ok(Image::new(image_size, pixels)?)
}
