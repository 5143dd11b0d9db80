//! Value model for data flowing between terminals.
//!
//! `TerminalType` is the closed set of kinds a terminal may carry and
//! `Value` is the matching tagged payload. There is no implicit coercion:
//! every write into a terminal is checked against its declared type.
//!
//! Plugins that need a payload outside the built-in kinds use the
//! `Opaque` variant, which is tagged with an owned name and compared by tag.
//! An opaque value written by a plugin node holds that plugin's library, so
//! the payload's drop code stays mapped while any copy of the value exists.

use crate::flowchart::error::GraphError;
use libloading::Library;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of sequence items shown before a display is truncated.
const DISPLAY_ITEMS: usize = 8;

/// The kind of value a terminal carries. Fixed at terminal creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerminalType {
    /// Sequence of scalar values.
    ScalarSeq,
    /// Sequence of 3-tuples (points, colors, normals).
    Vec3Seq,
    /// Color-map descriptor.
    ColorMap,
    Bool,
    /// Filesystem path.
    Path,
    /// Plugin-defined payload, identified by its tag.
    Opaque(Arc<str>),
}

impl TerminalType {
    /// Opaque type tagged `tag`. The tag is copied into host memory.
    pub fn opaque(tag: &str) -> Self {
        TerminalType::Opaque(Arc::from(tag))
    }

    pub fn name(&self) -> &str {
        match self {
            TerminalType::ScalarSeq => "scalar-seq",
            TerminalType::Vec3Seq => "vec3-seq",
            TerminalType::ColorMap => "colormap",
            TerminalType::Bool => "bool",
            TerminalType::Path => "path",
            TerminalType::Opaque(tag) => tag,
        }
    }

    /// All built-in (non-opaque) terminal types.
    pub fn builtin() -> &'static [TerminalType] {
        static BUILTIN: [TerminalType; 5] = [
            TerminalType::ScalarSeq,
            TerminalType::Vec3Seq,
            TerminalType::ColorMap,
            TerminalType::Bool,
            TerminalType::Path,
        ];
        &BUILTIN
    }
}

impl fmt::Display for TerminalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalType::Opaque(tag) => write!(f, "opaque<{}>", tag),
            other => f.write_str(other.name()),
        }
    }
}

/// A gradient stop of a color map: position in [0, 1] and RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f32,
    pub rgba: [f32; 4],
}

/// Descriptor mapping a value range onto a color gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub value_min: f32,
    pub value_max: f32,
    pub stops: Vec<ColorStop>,
}

/// Payload of the `Opaque` extension variant.
#[derive(Clone)]
pub struct OpaqueValue {
    tag: Arc<str>,
    data: Arc<dyn Any + Send + Sync>,
    // Declared after `data`: the payload drops before its library.
    origin: Option<Arc<Library>>,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(tag: &str, data: T) -> Self {
        Self {
            tag: Arc::from(tag),
            data: Arc::new(data),
            origin: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the payload is pinned to a plugin library.
    pub fn has_origin(&self) -> bool {
        self.origin.is_some()
    }

    /// Pin the payload to the library whose code created it.
    pub(crate) fn attach_origin(&mut self, library: &Arc<Library>) {
        if self.origin.is_none() {
            self.origin = Some(Arc::clone(library));
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("tag", &self.tag)
            .field("plugin", &self.has_origin())
            .finish()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && Arc::ptr_eq(&self.data, &other.data)
    }
}

/// A concrete value held by a terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    ScalarSeq(Vec<f32>),
    Vec3Seq(Vec<[f32; 3]>),
    ColorMap(ColorMap),
    Bool(bool),
    Path(PathBuf),
    Opaque(OpaqueValue),
}

impl Value {
    /// Build a value for a slot of type `ty`, rejecting a mismatching payload.
    pub fn typed(ty: TerminalType, value: Value) -> Result<Value, GraphError> {
        let found = value.terminal_type();
        if found == ty {
            Ok(value)
        } else {
            Err(GraphError::TypeMismatch { expected: ty, found })
        }
    }

    pub fn terminal_type(&self) -> TerminalType {
        match self {
            Value::ScalarSeq(_) => TerminalType::ScalarSeq,
            Value::Vec3Seq(_) => TerminalType::Vec3Seq,
            Value::ColorMap(_) => TerminalType::ColorMap,
            Value::Bool(_) => TerminalType::Bool,
            Value::Path(_) => TerminalType::Path,
            Value::Opaque(v) => TerminalType::Opaque(Arc::clone(&v.tag)),
        }
    }

    pub fn as_scalars(&self) -> Option<&[f32]> {
        match self {
            Value::ScalarSeq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3s(&self) -> Option<&[[f32; 3]]> {
        match self {
            Value::Vec3Seq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_colormap(&self) -> Option<&ColorMap> {
        match self {
            Value::ColorMap(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Pin an opaque payload to `library`; other kinds are plain host data.
    pub(crate) fn attach_origin(&mut self, library: &Arc<Library>) {
        if let Value::Opaque(v) = self {
            v.attach_origin(library);
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ScalarSeq(v) => fmt_seq(f, v),
            Value::Vec3Seq(v) => fmt_seq(f, v),
            Value::ColorMap(c) => write!(
                f,
                "colormap[{}, {}] ({} stops)",
                c.value_min,
                c.value_max,
                c.stops.len()
            ),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Opaque(o) => write!(f, "<{}>", o.tag),
        }
    }
}

fn fmt_seq<T: fmt::Debug>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if items.len() <= DISPLAY_ITEMS {
        write!(f, "{:?}", items)
    } else {
        write!(
            f,
            "{:?} ... ({} items)",
            &items[..DISPLAY_ITEMS],
            items.len()
        )
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::ScalarSeq(v)
    }
}

impl From<Vec<[f32; 3]>> for Value {
    fn from(v: Vec<[f32; 3]>) -> Self {
        Value::Vec3Seq(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Path(v)
    }
}

impl From<ColorMap> for Value {
    fn from(v: ColorMap) -> Self {
        Value::ColorMap(v)
    }
}
