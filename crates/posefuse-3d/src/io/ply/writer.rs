use std::io::{BufWriter, Write};
use std::path::Path;

use super::{PlyEncoding, PlyError, XYZRgbProperty};
use crate::pointcloud::PointCloud;

fn write_header<W: Write>(
    writer: &mut W,
    encoding: PlyEncoding,
    vertex_count: usize,
) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", encoding.keyword())?;
    writeln!(writer, "comment written by posefuse")?;
    writeln!(writer, "element vertex {vertex_count}")?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property float {axis}")?;
    }
    for channel in ["red", "green", "blue"] {
        writeln!(writer, "property uchar {channel}")?;
    }
    writeln!(writer, "end_header")?;
    Ok(())
}

/// Write the vertices of `pointcloud` as PLY to any writer.
///
/// Positions are stored as `float`, colors as `uchar`.
pub fn write_ply_to<W: Write>(
    writer: &mut W,
    pointcloud: &PointCloud,
    encoding: PlyEncoding,
) -> Result<(), PlyError> {
    write_header(writer, encoding, pointcloud.len())?;

    let config = bincode::config::legacy();
    for point in pointcloud.iter() {
        match encoding {
            PlyEncoding::BinaryLittleEndian => {
                let vertex = XYZRgbProperty {
                    x: point.x as f32,
                    y: point.y as f32,
                    z: point.z as f32,
                    red: point.r,
                    green: point.g,
                    blue: point.b,
                };
                bincode::encode_into_std_write(vertex, &mut *writer, config)?;
            }
            PlyEncoding::Ascii => {
                writeln!(
                    writer,
                    "{} {} {} {} {} {}",
                    point.x as f32, point.y as f32, point.z as f32, point.r, point.g, point.b
                )?;
            }
        }
    }

    Ok(())
}

/// Write a colored point cloud to a PLY file, replacing any existing file.
///
/// Example:
///
/// ```no_run
/// use posefuse_3d::io::ply::{write_ply, PlyEncoding};
/// use posefuse_3d::pointcloud::PointCloud;
///
/// let cloud = PointCloud::new(vec![[0.0, 0.0, 1.0]], vec![[255, 0, 0]]).unwrap();
/// write_ply("cloud.ply", &cloud, PlyEncoding::BinaryLittleEndian).unwrap();
/// ```
pub fn write_ply(
    path: impl AsRef<Path>,
    pointcloud: &PointCloud,
    encoding: PlyEncoding,
) -> Result<(), PlyError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply_to(&mut writer, pointcloud, encoding)?;
    writer.flush()?;
    Ok(())
}
