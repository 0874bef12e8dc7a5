use super::PlyError;

/// Vertex layouts understood by the reader.
#[derive(Debug, PartialEq, Clone)]
pub enum PlyType {
    /// `x y z` as float followed by `red green blue` as uchar.
    XYZRgb,
    /// [`PlyType::XYZRgb`] followed by `nx ny nz` as float.
    XYZRgbNormals,
    /// Any other layout, decoded property by property.
    Dynamic(Vec<PlyPropertyDefinition>),
}

/// A named vertex property declared in the header.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyPropertyDefinition {
    /// Property name, e.g. `x` or `red`.
    pub name: String,
    /// Scalar type of the property.
    pub data_type: PlyDataType,
}

/// Scalar types of PLY properties.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PlyDataType {
    /// `float` / `float32`
    Float32,
    /// `double` / `float64`
    Float64,
    /// `char` / `int8`
    Int8,
    /// `uchar` / `uint8`
    UInt8,
    /// `short` / `int16`
    Int16,
    /// `ushort` / `uint16`
    UInt16,
    /// `int` / `int32`
    Int32,
    /// `uint` / `uint32`
    UInt32,
}

impl PlyDataType {
    /// Size in bytes of one value in binary encoding.
    pub fn size(&self) -> usize {
        match self {
            PlyDataType::Float32 | PlyDataType::Int32 | PlyDataType::UInt32 => 4,
            PlyDataType::Float64 => 8,
            PlyDataType::Int16 | PlyDataType::UInt16 => 2,
            PlyDataType::Int8 | PlyDataType::UInt8 => 1,
        }
    }
}

/// Access to the position and color of a decoded vertex.
pub trait PlyPropertyTrait {
    /// The vertex position.
    fn to_point(&self) -> [f64; 3];
    /// The vertex color.
    fn to_color(&self) -> [u8; 3];
}

/// Binary vertex with position and color.
#[derive(Debug, Clone, Copy, PartialEq, bincode::Encode, bincode::Decode)]
pub struct XYZRgbProperty {
    /// x coordinate
    pub x: f32,
    /// y coordinate
    pub y: f32,
    /// z coordinate
    pub z: f32,
    /// red channel
    pub red: u8,
    /// green channel
    pub green: u8,
    /// blue channel
    pub blue: u8,
}

impl XYZRgbProperty {
    /// Encoded size in bytes.
    pub const SIZE: usize = 3 * 4 + 3;
}

impl PlyPropertyTrait for XYZRgbProperty {
    fn to_point(&self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.z as f64]
    }

    fn to_color(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Binary vertex with position, color and normal.
#[derive(Debug, Clone, Copy, PartialEq, bincode::Encode, bincode::Decode)]
pub struct XYZRgbNormalsProperty {
    /// x coordinate
    pub x: f32,
    /// y coordinate
    pub y: f32,
    /// z coordinate
    pub z: f32,
    /// red channel
    pub red: u8,
    /// green channel
    pub green: u8,
    /// blue channel
    pub blue: u8,
    /// normal x
    pub nx: f32,
    /// normal y
    pub ny: f32,
    /// normal z
    pub nz: f32,
}

impl XYZRgbNormalsProperty {
    /// Encoded size in bytes.
    pub const SIZE: usize = 3 * 4 + 3 + 3 * 4;
}

impl PlyPropertyTrait for XYZRgbNormalsProperty {
    fn to_point(&self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.z as f64]
    }

    fn to_color(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// A single scalar value of a dynamic property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamicPropertyValue {
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// signed 8-bit integer
    Int8(i8),
    /// unsigned 8-bit integer
    UInt8(u8),
    /// signed 16-bit integer
    Int16(i16),
    /// unsigned 16-bit integer
    UInt16(u16),
    /// signed 32-bit integer
    Int32(i32),
    /// unsigned 32-bit integer
    UInt32(u32),
}

impl DynamicPropertyValue {
    fn as_f64(&self) -> f64 {
        match *self {
            DynamicPropertyValue::Float32(v) => v as f64,
            DynamicPropertyValue::Float64(v) => v,
            DynamicPropertyValue::Int8(v) => v as f64,
            DynamicPropertyValue::UInt8(v) => v as f64,
            DynamicPropertyValue::Int16(v) => v as f64,
            DynamicPropertyValue::UInt16(v) => v as f64,
            DynamicPropertyValue::Int32(v) => v as f64,
            DynamicPropertyValue::UInt32(v) => v as f64,
        }
    }

    fn as_u8(&self) -> u8 {
        match *self {
            DynamicPropertyValue::UInt8(v) => v,
            // normalized float colors
            DynamicPropertyValue::Float32(v) => (v.clamp(0.0, 1.0) * 255.0).round() as u8,
            DynamicPropertyValue::Float64(v) => (v.clamp(0.0, 1.0) * 255.0).round() as u8,
            other => other.as_f64().clamp(0.0, 255.0) as u8,
        }
    }
}

/// A vertex with an arbitrary schema.
#[derive(Debug)]
pub struct DynamicProperty {
    /// Property names and their values in header order.
    pub properties: Vec<(String, DynamicPropertyValue)>,
}

fn read_le<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N], PlyError> {
    buffer
        .get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| PlyError::UnsupportedProperty("truncated vertex".to_string()))
}

impl DynamicProperty {
    /// Decode a little-endian binary vertex.
    pub fn parse_from_buffer(
        buffer: &[u8],
        schema: &[PlyPropertyDefinition],
    ) -> Result<Self, PlyError> {
        let mut properties = Vec::with_capacity(schema.len());
        let mut offset = 0;

        for prop_def in schema {
            let value = match prop_def.data_type {
                PlyDataType::Float32 => {
                    DynamicPropertyValue::Float32(f32::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::Float64 => {
                    DynamicPropertyValue::Float64(f64::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::Int8 => {
                    DynamicPropertyValue::Int8(i8::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::UInt8 => {
                    DynamicPropertyValue::UInt8(u8::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::Int16 => {
                    DynamicPropertyValue::Int16(i16::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::UInt16 => {
                    DynamicPropertyValue::UInt16(u16::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::Int32 => {
                    DynamicPropertyValue::Int32(i32::from_le_bytes(read_le(buffer, offset)?))
                }
                PlyDataType::UInt32 => {
                    DynamicPropertyValue::UInt32(u32::from_le_bytes(read_le(buffer, offset)?))
                }
            };

            properties.push((prop_def.name.clone(), value));
            offset += prop_def.data_type.size();
        }

        Ok(DynamicProperty { properties })
    }

    /// Decode an ascii vertex line.
    pub fn parse_from_ascii(
        line: &str,
        schema: &[PlyPropertyDefinition],
    ) -> Result<Self, PlyError> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() < schema.len() {
            return Err(PlyError::UnsupportedProperty(format!(
                "expected {} values, got {}",
                schema.len(),
                tokens.len()
            )));
        }

        let bad = |token: &str| PlyError::UnsupportedProperty(format!("bad value {token}"));

        let mut properties = Vec::with_capacity(schema.len());
        for (prop_def, token) in schema.iter().zip(tokens) {
            let value = match prop_def.data_type {
                PlyDataType::Float32 => {
                    DynamicPropertyValue::Float32(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::Float64 => {
                    DynamicPropertyValue::Float64(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::Int8 => {
                    DynamicPropertyValue::Int8(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::UInt8 => {
                    DynamicPropertyValue::UInt8(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::Int16 => {
                    DynamicPropertyValue::Int16(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::UInt16 => {
                    DynamicPropertyValue::UInt16(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::Int32 => {
                    DynamicPropertyValue::Int32(token.parse().map_err(|_| bad(token))?)
                }
                PlyDataType::UInt32 => {
                    DynamicPropertyValue::UInt32(token.parse().map_err(|_| bad(token))?)
                }
            };
            properties.push((prop_def.name.clone(), value));
        }

        Ok(DynamicProperty { properties })
    }

    fn get(&self, name: &str) -> Option<&DynamicPropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn get_float(&self, name: &str) -> f64 {
        self.get(name).map(|v| v.as_f64()).unwrap_or(0.0)
    }

    fn get_u8(&self, name: &str) -> u8 {
        self.get(name).map(|v| v.as_u8()).unwrap_or(0)
    }
}

impl PlyPropertyTrait for DynamicProperty {
    fn to_point(&self) -> [f64; 3] {
        [self.get_float("x"), self.get_float("y"), self.get_float("z")]
    }

    fn to_color(&self) -> [u8; 3] {
        [self.get_u8("red"), self.get_u8("green"), self.get_u8("blue")]
    }
}

/// A decoded vertex of any supported layout.
pub enum PlyProperty {
    /// Position and color.
    XYZRgb(XYZRgbProperty),
    /// Position, color and normal.
    XYZRgbNormals(XYZRgbNormalsProperty),
    /// Arbitrary schema.
    Dynamic(DynamicProperty),
}

impl PlyType {
    /// Decode one binary vertex.
    pub fn deserialize(&self, buffer: &[u8]) -> Result<PlyProperty, PlyError> {
        let config = bincode::config::legacy();
        match self {
            PlyType::XYZRgb => {
                let (property, _): (XYZRgbProperty, usize) =
                    bincode::decode_from_slice(buffer, config)?;
                Ok(PlyProperty::XYZRgb(property))
            }
            PlyType::XYZRgbNormals => {
                let (property, _): (XYZRgbNormalsProperty, usize) =
                    bincode::decode_from_slice(buffer, config)?;
                Ok(PlyProperty::XYZRgbNormals(property))
            }
            PlyType::Dynamic(ref schema) => {
                let dynamic_property = DynamicProperty::parse_from_buffer(buffer, schema)?;
                Ok(PlyProperty::Dynamic(dynamic_property))
            }
        }
    }

    /// Size in bytes of one binary vertex.
    pub fn size_of(&self) -> usize {
        match self {
            PlyType::XYZRgb => XYZRgbProperty::SIZE,
            PlyType::XYZRgbNormals => XYZRgbNormalsProperty::SIZE,
            PlyType::Dynamic(ref props) => props.iter().map(|p| p.data_type.size()).sum(),
        }
    }

    /// Pick the layout matching the declared properties.
    pub fn detect_format(properties: &[PlyPropertyDefinition]) -> Self {
        let matches = |names: &[&str]| {
            properties.len() == names.len()
                && properties.iter().zip(names.iter()).all(|(p, expected)| {
                    let expected_type = match *expected {
                        "red" | "green" | "blue" => PlyDataType::UInt8,
                        _ => PlyDataType::Float32,
                    };
                    p.name == *expected && p.data_type == expected_type
                })
        };

        if matches(&["x", "y", "z", "red", "green", "blue"]) {
            return PlyType::XYZRgb;
        }

        if matches(&["x", "y", "z", "red", "green", "blue", "nx", "ny", "nz"]) {
            return PlyType::XYZRgbNormals;
        }

        PlyType::Dynamic(properties.to_vec())
    }
}

impl PlyPropertyTrait for PlyProperty {
    fn to_point(&self) -> [f64; 3] {
        match self {
            PlyProperty::XYZRgb(property) => property.to_point(),
            PlyProperty::XYZRgbNormals(property) => property.to_point(),
            PlyProperty::Dynamic(property) => property.to_point(),
        }
    }

    fn to_color(&self) -> [u8; 3] {
        match self {
            PlyProperty::XYZRgb(property) => property.to_color(),
            PlyProperty::XYZRgbNormals(property) => property.to_color(),
            PlyProperty::Dynamic(property) => property.to_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, data_type: PlyDataType) -> PlyPropertyDefinition {
        PlyPropertyDefinition {
            name: name.to_string(),
            data_type,
        }
    }

    #[test]
    fn test_detect_format() {
        let mut props = vec![
            def("x", PlyDataType::Float32),
            def("y", PlyDataType::Float32),
            def("z", PlyDataType::Float32),
            def("red", PlyDataType::UInt8),
            def("green", PlyDataType::UInt8),
            def("blue", PlyDataType::UInt8),
        ];
        assert_eq!(PlyType::detect_format(&props), PlyType::XYZRgb);
        assert_eq!(PlyType::XYZRgb.size_of(), 15);

        props.push(def("nx", PlyDataType::Float32));
        props.push(def("ny", PlyDataType::Float32));
        props.push(def("nz", PlyDataType::Float32));
        assert_eq!(PlyType::detect_format(&props), PlyType::XYZRgbNormals);
        assert_eq!(PlyType::XYZRgbNormals.size_of(), 27);

        // doubles fall back to the dynamic decoder
        props[0].data_type = PlyDataType::Float64;
        let detected = PlyType::detect_format(&props);
        assert!(matches!(detected, PlyType::Dynamic(_)));
        assert_eq!(detected.size_of(), 31);
    }

    #[test]
    fn test_deserialize_xyz_rgb() -> Result<(), PlyError> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&1.5f32.to_le_bytes());
        buffer.extend_from_slice(&(-2.0f32).to_le_bytes());
        buffer.extend_from_slice(&3.0f32.to_le_bytes());
        buffer.extend_from_slice(&[9, 8, 7]);

        let property = PlyType::XYZRgb.deserialize(&buffer)?;
        assert_eq!(property.to_point(), [1.5, -2.0, 3.0]);
        assert_eq!(property.to_color(), [9, 8, 7]);
        Ok(())
    }

    #[test]
    fn test_dynamic_ascii_with_float_colors() -> Result<(), PlyError> {
        let schema = vec![
            def("x", PlyDataType::Float64),
            def("y", PlyDataType::Float64),
            def("z", PlyDataType::Float64),
            def("red", PlyDataType::Float32),
            def("green", PlyDataType::Float32),
            def("blue", PlyDataType::Float32),
        ];
        let property = DynamicProperty::parse_from_ascii("0.5 1 -3 1.0 0.0 0.5", &schema)?;
        assert_eq!(property.to_point(), [0.5, 1.0, -3.0]);
        assert_eq!(property.to_color(), [255, 0, 128]);

        assert!(DynamicProperty::parse_from_ascii("0.5 1", &schema).is_err());
        assert!(DynamicProperty::parse_from_ascii("a b c d e f", &schema).is_err());
        Ok(())
    }

    #[test]
    fn test_dynamic_binary_truncated() {
        let schema = vec![def("x", PlyDataType::Float64)];
        assert!(DynamicProperty::parse_from_buffer(&[0u8; 4], &schema).is_err());
    }
}
