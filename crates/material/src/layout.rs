use crate::params::{Material, MaterialError, ParamKind, ParamValue};

/// Scalar parameter carrying elapsed seconds. Shaders bind to this exact name.
pub const TIME_PARAMETER: &str = "_MyTime";
/// Vector parameter carrying `(width, height, 0, 0)`. Shaders bind to this exact name.
pub const RESOLUTION_PARAMETER: &str = "_Resolution";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    pub name: String,
    pub kind: ParamKind,
    pub offset: usize,
}

/// std140 placement of named material parameters inside a uniform block.
///
/// Only the two parameter kinds materials carry are supported: a `float`
/// aligns to 4 bytes, a `vec4` to 16. The block size is rounded up to 16
/// bytes as std140 requires for uniform blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<LayoutField>,
    size: usize,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            size: 0,
        }
    }

    /// Layout consumed by the bundled GLSL prelude:
    /// `vec4 _Resolution` at offset 0 followed by `float _MyTime` at 16.
    pub fn shadertoy() -> Self {
        Self::new()
            .with_field(RESOLUTION_PARAMETER, ParamKind::Vector)
            .with_field(TIME_PARAMETER, ParamKind::Float)
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        let (align, width) = match kind {
            ParamKind::Float => (4, 4),
            ParamKind::Vector => (16, 16),
        };
        let end = self
            .fields
            .last()
            .map(|field| field.offset + field_width(field.kind))
            .unwrap_or(0);
        let offset = round_up(end, align);
        self.fields.push(LayoutField {
            name: name.into(),
            kind,
            offset,
        });
        self.size = round_up(offset + width, 16);
        self
    }

    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Size of the block in bytes, always a multiple of 16.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Packs the material into a freshly zeroed block.
    ///
    /// Parameters the material does not carry stay zero. Extra parameters on
    /// the material that the layout does not name are ignored.
    pub fn pack(&self, material: &Material) -> Result<Vec<u8>, MaterialError> {
        let mut bytes = vec![0u8; self.size];
        self.pack_into(material, &mut bytes)?;
        Ok(bytes)
    }

    pub fn pack_into(&self, material: &Material, bytes: &mut [u8]) -> Result<(), MaterialError> {
        debug_assert!(bytes.len() >= self.size, "uniform block buffer too small");
        for field in &self.fields {
            let Some(value) = material.get(&field.name) else {
                continue;
            };
            if value.kind() != field.kind {
                return Err(MaterialError::KindMismatch {
                    name: field.name.clone(),
                    expected: field.kind,
                    found: value.kind(),
                });
            }
            let source: &[u8] = match &value {
                ParamValue::Float(scalar) => bytemuck::bytes_of(scalar),
                ParamValue::Vector(vector) => bytemuck::bytes_of(vector),
            };
            bytes[field.offset..field.offset + source.len()].copy_from_slice(source);
        }
        Ok(())
    }
}

impl Default for UniformLayout {
    fn default() -> Self {
        Self::new()
    }
}

fn field_width(kind: ParamKind) -> usize {
    match kind {
        ParamKind::Float => 4,
        ParamKind::Vector => 16,
    }
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}
