use std::io::{BufRead, Read};
use std::path::Path;

use super::{
    properties::{DynamicProperty, PlyDataType, PlyPropertyDefinition, PlyType},
    PlyError, PlyPropertyTrait,
};
use crate::pointcloud::PointCloud;

/// Body encodings of a PLY file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyEncoding {
    /// `binary_little_endian 1.0`
    #[default]
    BinaryLittleEndian,
    /// `ascii 1.0`
    Ascii,
}

impl PlyEncoding {
    /// The keyword used on the `format` line.
    pub fn keyword(&self) -> &'static str {
        match self {
            PlyEncoding::BinaryLittleEndian => "binary_little_endian",
            PlyEncoding::Ascii => "ascii",
        }
    }
}

struct PlyHeader {
    pub encoding: PlyEncoding,
    pub vertex_count: usize,
    pub properties: Vec<PlyPropertyDefinition>,
    pub format: PlyType,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    let mut vertex_count = None;
    let mut encoding = None;
    let mut is_ply = false;
    let mut in_vertex = false;
    let mut properties = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::InvalidHeader("missing end_header".to_string()));
        }
        let trimmed = line.trim();

        if trimmed == "ply" {
            is_ply = true;
            continue;
        }

        if trimmed == "end_header" {
            break;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            ["format", kind, ..] => {
                encoding = match *kind {
                    "binary_little_endian" => Some(PlyEncoding::BinaryLittleEndian),
                    "ascii" => Some(PlyEncoding::Ascii),
                    other => {
                        return Err(PlyError::InvalidHeader(format!(
                            "unsupported format {other}"
                        )))
                    }
                };
            }
            ["element", name, count] => {
                in_vertex = *name == "vertex";
                if in_vertex {
                    vertex_count = Some(count.parse::<usize>().map_err(|_| {
                        PlyError::InvalidHeader(format!("bad vertex count {count}"))
                    })?);
                }
            }
            ["property", "list", ..] if in_vertex => {
                return Err(PlyError::UnsupportedProperty(trimmed.to_string()));
            }
            ["property", data_type, name] if in_vertex => {
                let data_type = parse_data_type(data_type)?;
                properties.push(PlyPropertyDefinition {
                    name: name.to_string(),
                    data_type,
                });
            }
            _ => {}
        }
    }

    if !is_ply {
        return Err(PlyError::InvalidHeader("missing ply magic".to_string()));
    }

    let encoding =
        encoding.ok_or_else(|| PlyError::InvalidHeader("missing format line".to_string()))?;
    let vertex_count =
        vertex_count.ok_or_else(|| PlyError::InvalidHeader("missing vertex element".to_string()))?;
    let format = PlyType::detect_format(&properties);

    Ok(PlyHeader {
        encoding,
        vertex_count,
        properties,
        format,
    })
}

fn parse_data_type(type_str: &str) -> Result<PlyDataType, PlyError> {
    match type_str {
        "float" | "float32" => Ok(PlyDataType::Float32),
        "double" | "float64" => Ok(PlyDataType::Float64),
        "char" | "int8" => Ok(PlyDataType::Int8),
        "uchar" | "uint8" => Ok(PlyDataType::UInt8),
        "short" | "int16" => Ok(PlyDataType::Int16),
        "ushort" | "uint16" => Ok(PlyDataType::UInt16),
        "int" | "int32" => Ok(PlyDataType::Int32),
        "uint" | "uint32" => Ok(PlyDataType::UInt32),
        other => Err(PlyError::UnsupportedProperty(other.to_string())),
    }
}

/// Read a colored point cloud from a PLY file.
///
/// Both `binary_little_endian` and `ascii` bodies are accepted. The vertex
/// layout is detected from the header; missing color channels read as black.
pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud, PlyError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let header = parse_header(&mut reader)?;

    let mut points = Vec::with_capacity(header.vertex_count);
    let mut colors = Vec::with_capacity(header.vertex_count);

    match header.encoding {
        PlyEncoding::BinaryLittleEndian => {
            let mut buffer = vec![0u8; header.format.size_of()];
            for _ in 0..header.vertex_count {
                reader.read_exact(&mut buffer)?;
                let property_entry = header.format.deserialize(&buffer)?;
                points.push(property_entry.to_point());
                colors.push(property_entry.to_color());
            }
        }
        PlyEncoding::Ascii => {
            let mut line = String::new();
            for i in 0..header.vertex_count {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Err(PlyError::InvalidVertex(i, "unexpected end of file".into()));
                }
                let property_entry = DynamicProperty::parse_from_ascii(&line, &header.properties)
                    .map_err(|e| PlyError::InvalidVertex(i, e.to_string()))?;
                points.push(property_entry.to_point());
                colors.push(property_entry.to_color());
            }
        }
    }

    PointCloud::new(points, colors)
        .map_err(|e| PlyError::InvalidVertex(header.vertex_count, e.to_string()))
}
