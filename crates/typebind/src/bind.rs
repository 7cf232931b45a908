//! # Binding
//!
//! The [`Bind`] trait is the typed-deserialization contract: every bindable
//! type carries a compile-time [`Shape`] and a pure `bind` function from an
//! untyped [`Value`] node. Primitive and container impls live here; record and
//! union impls are generated by
//! [`#[config_model]`](typebind_derive::config_model) on top of the
//! [`BindCx`]/[`RecordBinder`] helpers.
//!
//! Every failure carries a [`FieldPath`] assembled on unwind, so a mismatch
//! deep inside `inputs.remote.token` names exactly that location. A failure
//! anywhere aborts the whole call; no partial object is ever produced.

use crate::binder::{Binder, ShapeError};
use crate::rules::Direction;
use crate::shape::{RecordShape, ScalarShape, Shape};
use crate::value::{Kind, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// One step of a diagnostic field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A declared record field.
    Field(&'static str),
    /// A mapping key from the input document.
    Key(String),
    /// A sequence index.
    Index(usize),
}

/// Location of a binding failure inside the config tree, e.g.
/// `inputs.remote.token` or `tags[1]`. The empty path displays as `<root>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub(crate) fn single(segment: Segment) -> Self {
        Self(vec![segment])
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Key(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Failure to bind an untyped tree to a typed value.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// A scalar's text form failed to parse into its typed value.
    #[error("at {at}: malformed `{scalar}` scalar: {source}")]
    Scalar {
        scalar: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        at: FieldPath,
    },

    /// A rule accepted the scalar type but the node has no text form.
    #[error("at {at}: scalar `{scalar}` expects a string node, found {found}")]
    UnsupportedShape { scalar: &'static str, found: Kind, at: FieldPath },

    /// No registered conversion rule accepts the scalar type.
    #[error("at {at}: no conversion rule registered for scalar `{scalar}`")]
    NoRule { scalar: &'static str, at: FieldPath },

    #[error("at {at}: missing required field `{field}` of `{record}`")]
    MissingField { record: &'static str, field: &'static str, at: FieldPath },

    #[error("at {at}: unknown field `{field}` not declared by `{record}`")]
    UnknownField { record: &'static str, field: String, at: FieldPath },

    #[error("at {at}: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: Kind, at: FieldPath },

    #[error("at {at}: integer {value} does not fit `{target}`")]
    OutOfRange { value: i64, target: &'static str, at: FieldPath },

    #[error("at {at}: cannot resolve union `{union}`: {reason}")]
    UnionResolution { union: &'static str, reason: String, at: FieldPath },

    /// A malformed target shape surfaced during binding. These indicate a
    /// programmer error that [`Binder::check`] reports eagerly.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl BindError {
    /// Wraps a scalar's own parse failure, e.g. a bad UUID inside a token.
    #[must_use]
    pub fn scalar(
        scalar: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Scalar { scalar, source: Box::new(source), at: FieldPath::default() }
    }

    /// Prepends `segment` to the failure location while unwinding.
    pub(crate) fn under(mut self, segment: Segment) -> Self {
        if let Some(path) = self.path_mut() {
            path.0.insert(0, segment);
        }
        self
    }

    fn path_mut(&mut self) -> Option<&mut FieldPath> {
        match self {
            Self::Scalar { at, .. }
            | Self::UnsupportedShape { at, .. }
            | Self::NoRule { at, .. }
            | Self::MissingField { at, .. }
            | Self::UnknownField { at, .. }
            | Self::TypeMismatch { at, .. }
            | Self::OutOfRange { at, .. }
            | Self::UnionResolution { at, .. } => Some(at),
            Self::Shape(_) => None,
        }
    }
}

/// A bindable type: a compile-time shape plus a pure constructor from an
/// untyped node. Implemented here for primitives and containers and by
/// [`#[config_model]`](typebind_derive::config_model) for records and unions.
pub trait Bind: Sized {
    const SHAPE: &'static Shape;

    fn bind(value: &Value, cx: &BindCx<'_>) -> Result<Self, BindError>;
}

/// Read-only context threaded through a binding descent; carries the rule
/// chain and nothing else, so every bind call is independent and reentrant.
#[derive(Debug, Clone, Copy)]
pub struct BindCx<'a> {
    binder: &'a Binder,
}

impl<'a> BindCx<'a> {
    pub(crate) const fn new(binder: &'a Binder) -> Self {
        Self { binder }
    }

    /// Runs the rule chain to extract the text form of a custom scalar.
    pub fn decode_scalar<'v>(
        &self,
        scalar: &ScalarShape,
        raw: &'v Value,
    ) -> Result<Cow<'v, str>, BindError> {
        let Some(rule) = self.binder.rule_for(scalar, Direction::Decode) else {
            return Err(BindError::NoRule { scalar: scalar.name, at: FieldPath::default() });
        };
        rule.decode(scalar, raw).map_err(BindError::from)
    }

    /// Views a node as a record of the given shape.
    pub fn record<'v>(
        &self,
        value: &'v Value,
        shape: &'static Shape,
    ) -> Result<RecordBinder<'v, 'a>, BindError> {
        let Shape::Record(record) = shape else {
            return Err(ShapeError::WrongShape { expected: "record", found: shape.label() }.into());
        };
        let map = value.as_mapping().ok_or_else(|| BindError::TypeMismatch {
            expected: record.name,
            found: value.kind(),
            at: FieldPath::default(),
        })?;
        Ok(RecordBinder { map, record, cx: *self })
    }

    /// Resolves which variant of a union a mapping node represents.
    ///
    /// Returns the variant index and the node to bind the variant against;
    /// when an explicit discriminator selected the variant, the returned node
    /// is a copy with the tag key removed. Ambiguous shape matches are a hard
    /// error, never resolved by declaration order.
    pub fn union<'v>(
        &self,
        value: &'v Value,
        shape: &'static Shape,
    ) -> Result<(usize, Cow<'v, Value>), BindError> {
        let Shape::Union(union) = shape else {
            return Err(ShapeError::WrongShape { expected: "union", found: shape.label() }.into());
        };
        let map = value.as_mapping().ok_or_else(|| BindError::TypeMismatch {
            expected: union.name,
            found: value.kind(),
            at: FieldPath::default(),
        })?;

        if let Some(tag) = union.tag
            && let Some(node) = map.get(tag)
        {
            let Value::String(label) = node else {
                return Err(BindError::TypeMismatch {
                    expected: "string",
                    found: node.kind(),
                    at: FieldPath::single(Segment::Field(tag)),
                });
            };
            let Some(index) = union.variants.iter().position(|v| v.tag_value == label) else {
                return Err(BindError::UnionResolution {
                    union: union.name,
                    reason: format!("no variant is tagged {label:?}"),
                    at: FieldPath::default(),
                });
            };
            let mut stripped = map.clone();
            stripped.remove(tag);
            return Ok((index, Cow::Owned(Value::Mapping(stripped))));
        }

        let mut matches = Vec::new();
        let mut reasons = Vec::new();
        for (index, variant) in union.variants.iter().enumerate() {
            let Some(record) = variant.record() else {
                return Err(ShapeError::VariantNotRecord {
                    union: union.name,
                    variant: variant.name,
                }
                .into());
            };
            match variant_mismatch(record, map) {
                None => matches.push(index),
                Some(reason) => reasons.push(format!("`{}` {reason}", variant.name)),
            }
        }
        match matches.as_slice() {
            [index] => Ok((*index, Cow::Borrowed(value))),
            [] => Err(BindError::UnionResolution {
                union: union.name,
                reason: format!("no variant matches: {}", reasons.join("; ")),
                at: FieldPath::default(),
            }),
            [first, second, ..] => Err(BindError::UnionResolution {
                union: union.name,
                reason: format!(
                    "ambiguous, both `{}` and `{}` match",
                    union.variants[*first].name, union.variants[*second].name
                ),
                at: FieldPath::default(),
            }),
        }
    }
}

fn variant_mismatch(record: &RecordShape, map: &BTreeMap<String, Value>) -> Option<String> {
    for field in record.required() {
        if !map.contains_key(field.name) {
            return Some(format!("requires field `{}`", field.name));
        }
    }
    for key in map.keys() {
        if record.field(key).is_none() {
            return Some(format!("does not declare field `{key}`"));
        }
    }
    None
}

/// A mapping node viewed through a record shape; the working surface of
/// generated record impls.
#[derive(Debug)]
pub struct RecordBinder<'v, 'a> {
    map: &'v BTreeMap<String, Value>,
    record: &'static RecordShape,
    cx: BindCx<'a>,
}

impl RecordBinder<'_, '_> {
    /// Binds a required field; absence is a [`BindError::MissingField`].
    pub fn field<T: Bind>(&self, name: &'static str) -> Result<T, BindError> {
        self.map.get(name).map_or_else(
            || {
                Err(BindError::MissingField {
                    record: self.record.name,
                    field: name,
                    at: FieldPath::single(Segment::Field(name)),
                })
            },
            |value| T::bind(value, &self.cx).map_err(|err| err.under(Segment::Field(name))),
        )
    }

    /// Binds an omittable field, producing `default()` when absent.
    pub fn field_or<T: Bind>(
        &self,
        name: &'static str,
        default: impl FnOnce() -> T,
    ) -> Result<T, BindError> {
        self.map.get(name).map_or_else(
            || Ok(default()),
            |value| T::bind(value, &self.cx).map_err(|err| err.under(Segment::Field(name))),
        )
    }

    /// Rejects input keys that no declared field consumes.
    pub fn deny_unknown(&self) -> Result<(), BindError> {
        for key in self.map.keys() {
            if self.record.field(key).is_none() {
                return Err(BindError::UnknownField {
                    record: self.record.name,
                    field: key.clone(),
                    at: FieldPath::default(),
                });
            }
        }
        Ok(())
    }
}

fn mismatch(shape: &'static Shape, value: &Value) -> BindError {
    BindError::TypeMismatch {
        expected: shape.label(),
        found: value.kind(),
        at: FieldPath::default(),
    }
}

impl Bind for bool {
    const SHAPE: &'static Shape = &Shape::Bool;

    fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::Bool(flag) => Ok(*flag),
            other => Err(mismatch(Self::SHAPE, other)),
        }
    }
}

impl Bind for i64 {
    const SHAPE: &'static Shape = &Shape::Integer;

    fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::Integer(raw) => Ok(*raw),
            other => Err(mismatch(Self::SHAPE, other)),
        }
    }
}

macro_rules! bind_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Bind for $ty {
            const SHAPE: &'static Shape = &Shape::Integer;

            fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
                match value {
                    Value::Integer(raw) => <$ty>::try_from(*raw).map_err(|_| {
                        BindError::OutOfRange {
                            value: *raw,
                            target: stringify!($ty),
                            at: FieldPath::default(),
                        }
                    }),
                    other => Err(mismatch(Self::SHAPE, other)),
                }
            }
        }
    )*};
}

bind_integer!(i8, i16, i32, u8, u16, u32, u64, usize);

impl Bind for f64 {
    const SHAPE: &'static Shape = &Shape::Float;

    #[allow(clippy::cast_precision_loss)]
    fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::Float(raw) => Ok(*raw),
            Value::Integer(raw) => Ok(*raw as Self),
            other => Err(mismatch(Self::SHAPE, other)),
        }
    }
}

impl Bind for f32 {
    const SHAPE: &'static Shape = &Shape::Float;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::Float(raw) => Ok(*raw as Self),
            Value::Integer(raw) => Ok(*raw as Self),
            other => Err(mismatch(Self::SHAPE, other)),
        }
    }
}

impl Bind for String {
    const SHAPE: &'static Shape = &Shape::String;

    fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::String(text) => Ok(text.clone()),
            other => Err(mismatch(Self::SHAPE, other)),
        }
    }
}

impl Bind for PathBuf {
    const SHAPE: &'static Shape = &Shape::Path;

    fn bind(value: &Value, _cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::String(text) => Ok(Self::from(text)),
            other => Err(mismatch(Self::SHAPE, other)),
        }
    }
}

impl<T: Bind> Bind for Option<T> {
    const SHAPE: &'static Shape = &Shape::Optional(T::SHAPE);

    fn bind(value: &Value, cx: &BindCx<'_>) -> Result<Self, BindError> {
        match value {
            Value::Null => Ok(None),
            other => T::bind(other, cx).map(Some),
        }
    }
}

impl<T: Bind> Bind for Vec<T> {
    const SHAPE: &'static Shape = &Shape::Sequence(T::SHAPE);

    fn bind(value: &Value, cx: &BindCx<'_>) -> Result<Self, BindError> {
        let items = value.as_sequence().ok_or_else(|| mismatch(Self::SHAPE, value))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::bind(item, cx).map_err(|err| err.under(Segment::Index(index)))
            })
            .collect()
    }
}

impl<T: Bind> Bind for BTreeMap<String, T> {
    const SHAPE: &'static Shape = &Shape::Mapping(T::SHAPE);

    fn bind(value: &Value, cx: &BindCx<'_>) -> Result<Self, BindError> {
        let entries = value.as_mapping().ok_or_else(|| mismatch(Self::SHAPE, value))?;
        entries
            .iter()
            .map(|(key, item)| {
                T::bind(item, cx)
                    .map(|typed| (key.clone(), typed))
                    .map_err(|err| err.under(Segment::Key(key.clone())))
            })
            .collect()
    }
}

impl<T: Bind> Bind for HashMap<String, T> {
    const SHAPE: &'static Shape = &Shape::Mapping(T::SHAPE);

    fn bind(value: &Value, cx: &BindCx<'_>) -> Result<Self, BindError> {
        let entries = value.as_mapping().ok_or_else(|| mismatch(Self::SHAPE, value))?;
        entries
            .iter()
            .map(|(key, item)| {
                T::bind(item, cx)
                    .map(|typed| (key.clone(), typed))
                    .map_err(|err| err.under(Segment::Key(key.clone())))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind<T: Bind>(tree: &serde_json::Value) -> Result<T, BindError> {
        Binder::new().bind(&Value::from(tree.clone()))
    }

    #[test]
    fn primitives_bind_strictly() {
        assert_eq!(bind::<i64>(&json!(42)).unwrap(), 42);
        assert_eq!(bind::<bool>(&json!(true)).unwrap(), true);
        assert_eq!(bind::<String>(&json!("foo")).unwrap(), "foo");
        assert_eq!(bind::<PathBuf>(&json!("/data")).unwrap(), PathBuf::from("/data"));
        assert_eq!(bind::<f64>(&json!(2)).unwrap(), 2.0);

        let err = bind::<bool>(&json!(1)).unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { expected: "bool", found: Kind::Integer, .. }));
    }

    #[test]
    fn narrow_integers_are_range_checked() {
        assert_eq!(bind::<u8>(&json!(255)).unwrap(), 255);
        let err = bind::<u8>(&json!(256)).unwrap_err();
        assert!(matches!(err, BindError::OutOfRange { value: 256, target: "u8", .. }));
        let err = bind::<u32>(&json!(-1)).unwrap_err();
        assert!(matches!(err, BindError::OutOfRange { value: -1, .. }));
    }

    #[test]
    fn sequences_report_the_failing_index() {
        let ok: Vec<String> = bind(&json!(["a", "b"])).unwrap();
        assert_eq!(ok, ["a", "b"]);

        let err = bind::<Vec<String>>(&json!(["a", 7])).unwrap_err();
        let BindError::TypeMismatch { at, .. } = err else { panic!("expected mismatch") };
        assert_eq!(at.to_string(), "[1]");
    }

    #[test]
    fn mappings_report_the_failing_key() {
        let ok: BTreeMap<String, i64> = bind(&json!({ "a": 1, "b": 2 })).unwrap();
        assert_eq!(ok["b"], 2);

        let err = bind::<BTreeMap<String, i64>>(&json!({ "a": 1, "b": "x" })).unwrap_err();
        let BindError::TypeMismatch { at, .. } = err else { panic!("expected mismatch") };
        assert_eq!(at.to_string(), "b");
    }

    #[test]
    fn optional_binds_null_to_none() {
        assert_eq!(bind::<Option<i64>>(&json!(null)).unwrap(), None);
        assert_eq!(bind::<Option<i64>>(&json!(5)).unwrap(), Some(5));
    }

    #[test]
    fn root_failures_display_a_root_path() {
        let err = bind::<i64>(&json!("nope")).unwrap_err();
        assert!(err.to_string().contains("at <root>"), "{err}");
    }
}
