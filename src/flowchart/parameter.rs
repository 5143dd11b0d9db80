//! Typed, validated node parameters.
//!
//! A parameter holds a value of one fixed kind, a display label and an
//! optional visibility predicate evaluated against the other parameters of
//! the same node (e.g. hide a range while its toggle is off).
//!
//! Every write goes through `set_str` (CLI, globals, text fields) or
//! `set_json` (persisted flowcharts). Both parse into the parameter's own
//! kind and check bounds; a rejected write leaves the previous value intact.
//! Out-of-range values are rejected, never clamped.

use crate::flowchart::error::ParameterError;
use indexmap::IndexMap;
use serde_json::{Number, Value as Json};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Predicate deciding whether a parameter is shown, given its siblings.
pub type Visibility = Arc<dyn Fn(&ParameterSet) -> bool + Send + Sync>;

/// Current value of a parameter, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    BoundedFloat { value: f32, min: f32, max: f32 },
    FloatRange(f32, f32),
    IntRange(i32, i32),
    BoundedInt { value: i32, min: i32, max: i32 },
    Bool(bool),
    Path(PathBuf),
}

impl ParamValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::BoundedFloat { .. } => "bounded float",
            ParamValue::FloatRange(..) => "float range",
            ParamValue::IntRange(..) => "integer range",
            ParamValue::BoundedInt { .. } => "bounded integer",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Path(_) => "path",
        }
    }

    fn validate(&self) -> Result<(), ParameterError> {
        match *self {
            ParamValue::BoundedFloat { value, min, max } if value < min || value > max => {
                Err(ParameterError::OutOfRange {
                    value: value.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                })
            }
            ParamValue::BoundedInt { value, min, max } if value < min || value > max => {
                Err(ParameterError::OutOfRange {
                    value: value.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                })
            }
            ParamValue::FloatRange(lo, hi) if lo > hi => Err(ParameterError::InvalidRange {
                lo: lo.to_string(),
                hi: hi.to_string(),
            }),
            ParamValue::IntRange(lo, hi) if lo > hi => Err(ParameterError::InvalidRange {
                lo: lo.to_string(),
                hi: hi.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// JSON form used in persisted flowcharts.
    pub fn to_json(&self) -> Json {
        match self {
            ParamValue::Int(v) | ParamValue::BoundedInt { value: v, .. } => Json::from(*v),
            ParamValue::Float(v) | ParamValue::BoundedFloat { value: v, .. } => f32_json(*v),
            ParamValue::FloatRange(lo, hi) => Json::Array(vec![f32_json(*lo), f32_json(*hi)]),
            ParamValue::IntRange(lo, hi) => Json::Array(vec![Json::from(*lo), Json::from(*hi)]),
            ParamValue::Bool(v) => Json::Bool(*v),
            ParamValue::Path(p) => Json::String(p.to_string_lossy().into_owned()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::BoundedFloat { value, min, max } => {
                write!(f, "{} [{}, {}]", value, min, max)
            }
            ParamValue::FloatRange(lo, hi) => write!(f, "{} {}", lo, hi),
            ParamValue::IntRange(lo, hi) => write!(f, "{} {}", lo, hi),
            ParamValue::BoundedInt { value, min, max } => {
                write!(f, "{} [{}, {}]", value, min, max)
            }
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// A named configuration value owned by a node.
#[derive(Clone)]
pub struct Parameter {
    label: String,
    value: ParamValue,
    visible_when: Option<Visibility>,
}

impl Parameter {
    fn with_value(value: ParamValue, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            visible_when: None,
        }
    }

    pub fn int(value: i32, label: impl Into<String>) -> Self {
        Self::with_value(ParamValue::Int(value), label)
    }

    pub fn float(value: f32, label: impl Into<String>) -> Self {
        Self::with_value(ParamValue::Float(value), label)
    }

    /// Bounded float; an initial value outside `[min, max]` is clamped.
    /// Swapped bounds are reordered and a NaN bound leaves that side open.
    pub fn bounded_float(value: f32, min: f32, max: f32, label: impl Into<String>) -> Self {
        let min = if min.is_nan() { f32::NEG_INFINITY } else { min };
        let max = if max.is_nan() { f32::INFINITY } else { max };
        let (min, max) = (min.min(max), max.max(min));
        let value = if value.is_nan() { min.max(0.0).min(max) } else { value.clamp(min, max) };
        Self::with_value(ParamValue::BoundedFloat { value, min, max }, label)
    }

    pub fn float_range(lo: f32, hi: f32, label: impl Into<String>) -> Self {
        Self::with_value(ParamValue::FloatRange(lo.min(hi), hi.max(lo)), label)
    }

    pub fn int_range(lo: i32, hi: i32, label: impl Into<String>) -> Self {
        Self::with_value(ParamValue::IntRange(lo.min(hi), hi.max(lo)), label)
    }

    /// Bounded integer; an initial value outside `[min, max]` is clamped.
    /// Swapped bounds are reordered.
    pub fn bounded_int(value: i32, min: i32, max: i32, label: impl Into<String>) -> Self {
        let (min, max) = (min.min(max), max.max(min));
        Self::with_value(
            ParamValue::BoundedInt {
                value: value.clamp(min, max),
                min,
                max,
            },
            label,
        )
    }

    pub fn boolean(value: bool, label: impl Into<String>) -> Self {
        Self::with_value(ParamValue::Bool(value), label)
    }

    pub fn path(value: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self::with_value(ParamValue::Path(value.into()), label)
    }

    /// Attach a visibility predicate.
    pub fn visible_when(
        mut self,
        predicate: impl Fn(&ParameterSet) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.visible_when = Some(Arc::new(predicate));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Direct access for widgets that enforce the kind's bounds themselves.
    pub(crate) fn value_mut(&mut self) -> &mut ParamValue {
        &mut self.value
    }

    pub fn kind_name(&self) -> &'static str {
        self.value.kind_name()
    }

    /// Parse `raw` into this parameter's kind and store it.
    ///
    /// Ranges take two tokens separated by whitespace or a comma; booleans
    /// accept only the literals `true` and `false`.
    pub fn set_str(&mut self, raw: &str) -> Result<(), ParameterError> {
        let next = match &self.value {
            ParamValue::Int(_) => ParamValue::Int(parse_int(raw)?),
            ParamValue::Float(_) => ParamValue::Float(parse_float(raw)?),
            ParamValue::BoundedFloat { min, max, .. } => ParamValue::BoundedFloat {
                value: parse_float(raw)?,
                min: *min,
                max: *max,
            },
            ParamValue::FloatRange(..) => {
                let (lo, hi) = parse_pair(raw, "float range", parse_float)?;
                ParamValue::FloatRange(lo, hi)
            }
            ParamValue::IntRange(..) => {
                let (lo, hi) = parse_pair(raw, "integer range", parse_int)?;
                ParamValue::IntRange(lo, hi)
            }
            ParamValue::BoundedInt { min, max, .. } => ParamValue::BoundedInt {
                value: parse_int(raw)?,
                min: *min,
                max: *max,
            },
            ParamValue::Bool(_) => ParamValue::Bool(parse_bool(raw)?),
            ParamValue::Path(_) => ParamValue::Path(PathBuf::from(raw)),
        };
        self.replace(next)
    }

    /// Store a value read from a persisted flowchart.
    pub fn set_json(&mut self, json: &Json) -> Result<(), ParameterError> {
        let next = match &self.value {
            ParamValue::Int(_) => ParamValue::Int(json_int(json)?),
            ParamValue::Float(_) => ParamValue::Float(json_float(json)?),
            ParamValue::BoundedFloat { min, max, .. } => ParamValue::BoundedFloat {
                value: json_float(json)?,
                min: *min,
                max: *max,
            },
            ParamValue::FloatRange(..) => {
                let (lo, hi) = json_pair(json, "float range", json_float)?;
                ParamValue::FloatRange(lo, hi)
            }
            ParamValue::IntRange(..) => {
                let (lo, hi) = json_pair(json, "integer range", json_int)?;
                ParamValue::IntRange(lo, hi)
            }
            ParamValue::BoundedInt { min, max, .. } => ParamValue::BoundedInt {
                value: json_int(json)?,
                min: *min,
                max: *max,
            },
            ParamValue::Bool(_) => ParamValue::Bool(json.as_bool().ok_or_else(|| {
                ParameterError::KindMismatch {
                    expected: "boolean",
                    found: json_kind(json).to_string(),
                }
            })?),
            ParamValue::Path(_) => ParamValue::Path(PathBuf::from(json.as_str().ok_or_else(
                || ParameterError::KindMismatch {
                    expected: "path",
                    found: json_kind(json).to_string(),
                },
            )?)),
        };
        self.replace(next)
    }

    fn replace(&mut self, next: ParamValue) -> Result<(), ParameterError> {
        next.validate()?;
        self.value = next;
        Ok(())
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("label", &self.label)
            .field("value", &self.value)
            .field("conditional", &self.visible_when.is_some())
            .finish()
    }
}

/// Ordered map of a node's parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    params: IndexMap<String, Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter. Re-adding a name replaces the earlier declaration.
    pub fn add(&mut self, name: &str, param: Parameter) -> &mut Self {
        self.params.insert(name.to_string(), param);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Evaluate the visibility predicate of `name`. Unknown names are hidden.
    pub fn is_visible(&self, name: &str) -> bool {
        match self.params.get(name) {
            Some(p) => p.visible_when.as_ref().map_or(true, |pred| pred(self)),
            None => false,
        }
    }

    /// Float or bounded-float value.
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)?.value() {
            ParamValue::Float(v) | ParamValue::BoundedFloat { value: v, .. } => Some(*v),
            _ => None,
        }
    }

    /// Integer or bounded-integer value.
    pub fn int(&self, name: &str) -> Option<i32> {
        match self.get(name)?.value() {
            ParamValue::Int(v) | ParamValue::BoundedInt { value: v, .. } => Some(*v),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name)?.value() {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn float_range(&self, name: &str) -> Option<(f32, f32)> {
        match self.get(name)?.value() {
            ParamValue::FloatRange(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }

    pub fn int_range(&self, name: &str) -> Option<(i32, i32)> {
        match self.get(name)?.value() {
            ParamValue::IntRange(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        match self.get(name)?.value() {
            ParamValue::Path(p) => Some(p),
            _ => None,
        }
    }
}

// ── Parsing helpers ──

fn parse_int(raw: &str) -> Result<i32, ParameterError> {
    raw.trim().parse::<i32>().map_err(|_| ParameterError::Parse {
        raw: raw.to_string(),
        expected: "integer",
    })
}

fn parse_float(raw: &str) -> Result<f32, ParameterError> {
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParameterError::Parse {
            raw: raw.to_string(),
            expected: "float",
        }),
    }
}

fn parse_bool(raw: &str) -> Result<bool, ParameterError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParameterError::Parse {
            raw: raw.to_string(),
            expected: "boolean (true or false)",
        }),
    }
}

fn parse_pair<T>(
    raw: &str,
    expected: &'static str,
    parse: fn(&str) -> Result<T, ParameterError>,
) -> Result<(T, T), ParameterError> {
    let tokens: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    match tokens.as_slice() {
        [lo, hi] => Ok((parse(lo)?, parse(hi)?)),
        _ => Err(ParameterError::Parse {
            raw: raw.to_string(),
            expected,
        }),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn json_int(json: &Json) -> Result<i32, ParameterError> {
    let v = json.as_i64().ok_or_else(|| ParameterError::KindMismatch {
        expected: "integer",
        found: json_kind(json).to_string(),
    })?;
    i32::try_from(v).map_err(|_| ParameterError::Parse {
        raw: v.to_string(),
        expected: "32-bit integer",
    })
}

fn json_float(json: &Json) -> Result<f32, ParameterError> {
    let v = json.as_f64().ok_or_else(|| ParameterError::KindMismatch {
        expected: "float",
        found: json_kind(json).to_string(),
    })?;
    let v = v as f32;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParameterError::Parse {
            raw: json.to_string(),
            expected: "finite float",
        })
    }
}

fn json_pair<T>(
    json: &Json,
    expected: &'static str,
    item: fn(&Json) -> Result<T, ParameterError>,
) -> Result<(T, T), ParameterError> {
    match json.as_array().map(Vec::as_slice) {
        Some([lo, hi]) => Ok((item(lo)?, item(hi)?)),
        _ => Err(ParameterError::KindMismatch {
            expected,
            found: json_kind(json).to_string(),
        }),
    }
}

/// Shortest decimal form of an f32, so saved files stay readable and stable.
fn f32_json(v: f32) -> Json {
    v.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or(Json::Null, Json::Number)
}
