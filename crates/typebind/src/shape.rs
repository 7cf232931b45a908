//! # Shapes
//!
//! A [`Shape`] is a structural description of a bindable Rust type, available
//! at compile time through [`Bind::SHAPE`](crate::Bind::SHAPE). Shapes drive
//! both the recursive descent of the binder and the eager validation pass in
//! [`Binder::check`](crate::Binder::check); they carry no mutable state.

/// Structural description of a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Bool,
    Integer,
    Float,
    String,
    /// A filesystem path, bound from a string node.
    Path,
    /// A custom text scalar handled by the rule chain.
    Scalar(ScalarShape),
    /// An omittable value; `Null` or an absent field binds to the empty case.
    Optional(&'static Shape),
    Sequence(&'static Shape),
    /// A string-keyed mapping with homogeneous values.
    Mapping(&'static Shape),
    Record(RecordShape),
    Union(UnionShape),
}

/// Identity of a custom text scalar, matched by conversion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarShape {
    pub name: &'static str,
}

/// One declared field of a record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    /// The key looked up in the mapping node (after any rename).
    pub name: &'static str,
    pub shape: &'static Shape,
    /// Whether the field may be absent; the default lives in generated code.
    pub has_default: bool,
}

/// A record type: a named set of typed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: &'static [FieldShape],
}

/// A tagged union over record variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionShape {
    pub name: &'static str,
    /// Discriminator key; when present in the input it selects the variant.
    pub tag: Option<&'static str>,
    pub variants: &'static [UnionVariant],
}

/// One candidate of a union shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionVariant {
    pub name: &'static str,
    /// The discriminator value that selects this variant.
    pub tag_value: &'static str,
    pub shape: &'static Shape,
}

impl Shape {
    /// A short label for diagnostics ("expected X, found Y").
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Path => "path",
            Self::Scalar(scalar) => scalar.name,
            Self::Optional(inner) => inner.label(),
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::Record(record) => record.name,
            Self::Union(union) => union.name,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&RecordShape> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl RecordShape {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldShape> {
        self.fields.iter().filter(|field| !field.has_default)
    }
}

impl UnionVariant {
    /// The variant's record shape. Union variants must wrap records; this is
    /// enforced by [`Binder::check`](crate::Binder::check).
    #[must_use]
    pub const fn record(&self) -> Option<&RecordShape> {
        self.shape.as_record()
    }
}
