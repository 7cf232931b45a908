//! # Binder
//!
//! The [`Binder`] owns the ordered conversion-rule chain and drives typed
//! binding. It is built once at process start and shared by reference; there
//! is no global registry and no mutation after construction, so concurrent
//! `bind` calls need no synchronization.

use crate::bind::{Bind, BindCx, BindError, FieldPath};
use crate::rules::{Direction, ScalarRule, TokenRule};
use crate::shape::{RecordShape, ScalarShape, Shape, UnionShape};
use crate::value::Value;
use fxhash::FxHashSet;

/// A structurally invalid binding target, reported before any input is read.
///
/// These are programmer errors in the declared configuration types, caught
/// eagerly by [`Binder::check`] so an entry point fails before composition.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// The entry target must be a record, mirroring the `config: T` contract.
    #[error("entry configuration type must be a record, found `{found}`")]
    EntryNotRecord { found: &'static str },

    /// A scalar appears in the target but no registered rule accepts it.
    #[error("no conversion rule registered for scalar `{scalar}`")]
    MissingRule { scalar: &'static str },

    #[error("record `{record}` declares field `{field}` twice")]
    DuplicateField { record: &'static str, field: &'static str },

    /// Union variants must wrap records so shape resolution has fields to
    /// match against.
    #[error("variant `{variant}` of union `{union}` does not wrap a record")]
    VariantNotRecord { union: &'static str, variant: &'static str },

    /// Two untagged variants would accept the same input; resolution would be
    /// nondeterministic, so the declaration is rejected outright.
    #[error("union `{union}` is ambiguous: `{first}` and `{second}` accept the same shapes")]
    AmbiguousVariants { union: &'static str, first: &'static str, second: &'static str },

    #[error("union `{union}` declares tag value {value:?} twice")]
    DuplicateTagValue { union: &'static str, value: &'static str },

    /// A structural helper was handed a shape of the wrong class.
    #[error("expected a {expected} shape, found `{found}`")]
    WrongShape { expected: &'static str, found: &'static str },
}

/// The conversion registry plus the typed-deserialization entry points.
#[derive(Debug)]
pub struct Binder {
    rules: Vec<Box<dyn ScalarRule>>,
}

impl Default for Binder {
    /// A binder with the [`TokenRule`] registered.
    fn default() -> Self {
        Self { rules: vec![Box::new(TokenRule)] }
    }
}

impl Binder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to the chain. Registration happens at startup only;
    /// once binding starts the chain is read-only.
    #[must_use]
    pub fn rule(mut self, rule: impl ScalarRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub(crate) fn rule_for(
        &self,
        scalar: &ScalarShape,
        direction: Direction,
    ) -> Option<&dyn ScalarRule> {
        self.rules.iter().map(AsRef::as_ref).find(|rule| rule.applicable(scalar, direction))
    }

    /// Binds an untyped tree into `T`, recursively.
    ///
    /// Pure: the result depends only on the tree, `T`'s shape, and the rule
    /// chain. Any failure aborts the whole call with a path-qualified error.
    pub fn bind<T: Bind>(&self, tree: &Value) -> Result<T, BindError> {
        let cx = BindCx::new(self);
        T::bind(tree, &cx)
    }

    /// Renders a typed scalar's canonical text back into a tree node.
    pub fn encode_scalar(&self, scalar: &ScalarShape, text: &str) -> Result<Value, BindError> {
        let Some(rule) = self.rule_for(scalar, Direction::Encode) else {
            return Err(BindError::NoRule { scalar: scalar.name, at: FieldPath::default() });
        };
        rule.encode(scalar, text).map_err(BindError::from)
    }

    /// Validates `T` as an entry configuration target before any input is
    /// composed: the root must be a record, every scalar must have a rule,
    /// and unions must resolve deterministically.
    pub fn check<T: Bind>(&self) -> Result<(), ShapeError> {
        if T::SHAPE.as_record().is_none() {
            return Err(ShapeError::EntryNotRecord { found: T::SHAPE.label() });
        }
        self.check_shape(T::SHAPE)
    }

    fn check_shape(&self, shape: &'static Shape) -> Result<(), ShapeError> {
        match shape {
            Shape::Bool | Shape::Integer | Shape::Float | Shape::String | Shape::Path => Ok(()),
            Shape::Scalar(scalar) => {
                if self.rule_for(scalar, Direction::Decode).is_none() {
                    return Err(ShapeError::MissingRule { scalar: scalar.name });
                }
                Ok(())
            }
            Shape::Optional(inner) | Shape::Sequence(inner) | Shape::Mapping(inner) => {
                self.check_shape(inner)
            }
            Shape::Record(record) => self.check_record(record),
            Shape::Union(union) => self.check_union(union),
        }
    }

    fn check_record(&self, record: &'static RecordShape) -> Result<(), ShapeError> {
        let mut seen = FxHashSet::default();
        for field in record.fields {
            if !seen.insert(field.name) {
                return Err(ShapeError::DuplicateField { record: record.name, field: field.name });
            }
            self.check_shape(field.shape)?;
        }
        Ok(())
    }

    fn check_union(&self, union: &'static UnionShape) -> Result<(), ShapeError> {
        for variant in union.variants {
            if variant.record().is_none() {
                return Err(ShapeError::VariantNotRecord {
                    union: union.name,
                    variant: variant.name,
                });
            }
            self.check_shape(variant.shape)?;
        }

        if union.tag.is_some() {
            // A discriminator provides determinism; tag values must be unique.
            let mut seen = FxHashSet::default();
            for variant in union.variants {
                if !seen.insert(variant.tag_value) {
                    return Err(ShapeError::DuplicateTagValue {
                        union: union.name,
                        value: variant.tag_value,
                    });
                }
            }
            return Ok(());
        }

        // Untagged: two variants may never accept the same mapping. A mapping
        // satisfying both exists exactly when the combined required fields
        // fit inside the shared declared fields.
        for (position, first) in union.variants.iter().enumerate() {
            for second in &union.variants[position + 1..] {
                let (Some(a), Some(b)) = (first.record(), second.record()) else {
                    continue;
                };
                let overlap_accepts_both = a
                    .required()
                    .chain(b.required())
                    .all(|field| a.field(field.name).is_some() && b.field(field.name).is_some());
                if overlap_accepts_both {
                    return Err(ShapeError::AmbiguousVariants {
                        union: union.name,
                        first: first.name,
                        second: second.name,
                    });
                }
            }
        }
        Ok(())
    }
}
