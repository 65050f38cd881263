use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterialError {
    #[error("parameter '{0}' is not set on the material")]
    Missing(String),
    #[error("parameter '{name}' holds a {found} but a {expected} was requested")]
    KindMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },
}

/// Shape of a named parameter as seen by shader code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Float,
    Vector,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Float => f.write_str("float"),
            ParamKind::Vector => f.write_str("vec4"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Float(f32),
    Vector([f32; 4]),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Vector(_) => ParamKind::Vector,
        }
    }
}

/// Write side of a shading resource's parameter table.
///
/// Writes never fail: an unknown name creates the parameter and an existing
/// one is overwritten.
pub trait ParameterSink {
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vector(&mut self, name: &str, value: [f32; 4]);
}

/// Named parameter table backing a shader program.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Material {
    label: String,
    parameters: BTreeMap<String, ParamValue>,
    revision: u64,
}

impl Material {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            parameters: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of parameter writes applied since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.parameters.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Result<f32, MaterialError> {
        match self.lookup(name)? {
            ParamValue::Float(value) => Ok(value),
            other => Err(mismatch(name, ParamKind::Float, other.kind())),
        }
    }

    pub fn vector(&self, name: &str) -> Result<[f32; 4], MaterialError> {
        match self.lookup(name)? {
            ParamValue::Vector(value) => Ok(value),
            other => Err(mismatch(name, ParamKind::Vector, other.kind())),
        }
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, ParamValue)> + '_ {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<ParamValue, MaterialError> {
        self.get(name)
            .ok_or_else(|| MaterialError::Missing(name.to_string()))
    }

    fn store(&mut self, name: &str, value: ParamValue) {
        match self.parameters.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.parameters.insert(name.to_string(), value);
            }
        }
        self.revision = self.revision.saturating_add(1);
    }
}

impl ParameterSink for Material {
    fn set_float(&mut self, name: &str, value: f32) {
        self.store(name, ParamValue::Float(value));
    }

    fn set_vector(&mut self, name: &str, value: [f32; 4]) {
        self.store(name, ParamValue::Vector(value));
    }
}

fn mismatch(name: &str, expected: ParamKind, found: ParamKind) -> MaterialError {
    MaterialError::KindMismatch {
        name: name.to_string(),
        expected,
        found,
    }
}

/// Shared reference to a material owned by the host.
///
/// The handle is `!Send`; the material is only mutated from the host's
/// update thread.
#[derive(Debug, Clone, Default)]
pub struct MaterialHandle(Rc<RefCell<Material>>);

impl MaterialHandle {
    pub fn new(material: Material) -> Self {
        Self(Rc::new(RefCell::new(material)))
    }

    pub fn borrow(&self) -> Ref<'_, Material> {
        self.0.borrow()
    }

    /// Clones the current parameter table out of the shared cell.
    pub fn snapshot(&self) -> Material {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Material> for MaterialHandle {
    fn from(material: Material) -> Self {
        Self::new(material)
    }
}

impl ParameterSink for MaterialHandle {
    fn set_float(&mut self, name: &str, value: f32) {
        self.0.borrow_mut().set_float(name, value);
    }

    fn set_vector(&mut self, name: &str, value: [f32; 4]) {
        self.0.borrow_mut().set_vector(name, value);
    }
}
