use std::{fs, path::Path};

use png::{BitDepth, ColorType, Decoder, Encoder};
use posefuse_3d::image::{DepthImage, Image, ImageSize};

use crate::error::IoError;

/// Read a single channel PNG depth image.
///
/// 16-bit samples are read as they are; 8-bit samples are widened to `u16`.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// The raw depth samples, one per pixel.
pub fn read_image_png_depth(file_path: impl AsRef<Path>) -> Result<DepthImage<u16>, IoError> {
    let (buf, size, color_type, bit_depth) = read_png_impl(file_path)?;

    if color_type != ColorType::Grayscale {
        return Err(IoError::UnsupportedPixelFormat(format!(
            "expected a single channel depth png, got {color_type:?}"
        )));
    }

    let data = match bit_depth {
        BitDepth::Sixteen => convert_buf_u8_u16(&buf),
        BitDepth::Eight => buf.into_iter().map(u16::from).collect(),
        other => {
            return Err(IoError::UnsupportedPixelFormat(format!(
                "unsupported depth png bit depth {other:?}"
            )))
        }
    };

    Ok(Image::new(size, data)?)
}

/// Write a depth image as a 16-bit single channel PNG.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
/// * `image` - The depth image to write.
pub fn write_image_png_depth16(
    file_path: impl AsRef<Path>,
    image: &DepthImage<u16>,
) -> Result<(), IoError> {
    // png stores 16-bit samples big-endian
    let buf = image
        .as_slice()
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect::<Vec<u8>>();
    write_png_impl(
        file_path,
        &buf,
        image.size(),
        BitDepth::Sixteen,
        ColorType::Grayscale,
    )
}

fn convert_buf_u8_u16(buf: &[u8]) -> Vec<u16> {
    buf.chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

fn read_png_impl(
    file_path: impl AsRef<Path>,
) -> Result<(Vec<u8>, ImageSize, ColorType, BitDepth), IoError> {
    // verify the file exists
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    // verify the file extension
    if !file_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
    {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    let file = fs::File::open(file_path)?;
    let mut reader = Decoder::new(file)
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let size = ImageSize {
        width: info.width as usize,
        height: info.height as usize,
    };

    Ok((buf, size, info.color_type, info.bit_depth))
}

fn write_png_impl(
    file_path: impl AsRef<Path>,
    image_data: &[u8],
    image_size: ImageSize,
    // Make sure you set `depth` correctly
    depth: BitDepth,
    color_type: ColorType,
) -> Result<(), IoError> {
    let file = fs::File::create(file_path)?;

    let mut encoder = Encoder::new(file, image_size.width as u32, image_size.height as u32);
    encoder.set_color(color_type);
    encoder.set_depth(depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image_data)
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_png_depth16() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("1700000000000.png");

        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let image = Image::new(size, vec![0u16, 1, 256, 1000, 4095, 65535])?;
        write_image_png_depth16(&file_path, &image)?;

        let read_back = read_image_png_depth(&file_path)?;
        assert_eq!(read_back.size(), size);
        assert_eq!(read_back.as_slice(), image.as_slice());
        Ok(())
    }

    #[test]
    fn read_png_depth8_is_widened() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("depth8.png");
        write_png_impl(
            &file_path,
            &[0, 7, 255, 128],
            [2, 2].into(),
            BitDepth::Eight,
            ColorType::Grayscale,
        )?;

        let read_back = read_image_png_depth(&file_path)?;
        assert_eq!(read_back.as_slice(), &[0u16, 7, 255, 128]);
        Ok(())
    }

    #[test]
    fn read_png_rgb_is_rejected() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgb.png");
        write_png_impl(&file_path, &[0; 3], [1, 1].into(), BitDepth::Eight, ColorType::Rgb)?;

        assert!(matches!(
            read_image_png_depth(&file_path),
            Err(IoError::UnsupportedPixelFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn read_png_missing_or_wrong_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        assert!(matches!(
            read_image_png_depth(tmp_dir.path().join("missing.png")),
            Err(IoError::FileDoesNotExist(_))
        ));

        let file_path = tmp_dir.path().join("depth.txt");
        fs::write(&file_path, b"not a png")?;
        assert!(matches!(
            read_image_png_depth(&file_path),
            Err(IoError::InvalidFileExtension(_))
        ));
        Ok(())
    }
}
