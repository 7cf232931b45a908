//! # Conversion rules
//!
//! Custom text scalars (like [`Token`](crate::Token)) cross the binding
//! pipeline through an ordered chain of [`ScalarRule`]s. A rule that does not
//! recognize a scalar type simply declares itself not applicable and the next
//! rule is probed; the first applicable rule wins. The chain is owned by the
//! [`Binder`](crate::Binder), assembled once at startup and immutable after.

use crate::bind::BindError;
use crate::bind::FieldPath;
use crate::shape::ScalarShape;
use crate::token::Token;
use crate::value::{Kind, Value};
use std::borrow::Cow;

/// Which way a conversion runs. The set is closed; there is no third case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Typed value to text node.
    Encode,
    /// Text node to typed value.
    Decode,
}

/// Failure inside a conversion rule that accepted the scalar type.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The source node carries no text form to decode from.
    #[error("scalar `{scalar}` expects a string node, found {found}")]
    NotText { scalar: &'static str, found: Kind },
}

impl From<RuleError> for BindError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::NotText { scalar, found } => {
                Self::UnsupportedShape { scalar, found, at: FieldPath::default() }
            }
        }
    }
}

/// One pluggable conversion rule, probed in registration order.
pub trait ScalarRule: std::fmt::Debug + Send + Sync {
    /// Whether this rule handles `scalar` in `direction`. Returning `false`
    /// is a routing decision, not an error.
    fn applicable(&self, scalar: &ScalarShape, direction: Direction) -> bool;

    /// Extracts the text form of `raw` for the typed parse above the chain.
    fn decode<'v>(&self, scalar: &ScalarShape, raw: &'v Value) -> Result<Cow<'v, str>, RuleError>;

    /// Wraps an already-rendered canonical text back into a tree node.
    fn encode(&self, scalar: &ScalarShape, text: &str) -> Result<Value, RuleError>;
}

/// A scalar type with a canonical text form, routable through the rule chain.
///
/// Implementors pair this with [`bind_text_scalar!`](crate::bind_text_scalar)
/// and a rule whose [`ScalarRule::applicable`] matches [`TextScalar::NAME`].
pub trait TextScalar:
    std::fmt::Display + std::str::FromStr<Err: std::error::Error + Send + Sync + 'static>
{
    /// The scalar identity carried in shapes and matched by rules.
    const NAME: &'static str;
}

/// The shipped rule: routes [`Token`] values through their canonical
/// `"<uuid>:<key>"` text form, in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenRule;

impl ScalarRule for TokenRule {
    fn applicable(&self, scalar: &ScalarShape, _direction: Direction) -> bool {
        scalar.name == Token::NAME
    }

    fn decode<'v>(&self, scalar: &ScalarShape, raw: &'v Value) -> Result<Cow<'v, str>, RuleError> {
        raw.as_str().map_or_else(
            || Err(RuleError::NotText { scalar: scalar.name, found: raw.kind() }),
            |text| Ok(Cow::Borrowed(text.as_str())),
        )
    }

    fn encode(&self, _scalar: &ScalarShape, text: &str) -> Result<Value, RuleError> {
        Ok(Value::String(text.to_owned()))
    }
}

/// Implements [`Bind`](crate::Bind) for a [`TextScalar`], routing its text
/// form through the binder's rule chain before the typed parse.
#[macro_export]
macro_rules! bind_text_scalar {
    ($ty:ty) => {
        impl $crate::Bind for $ty {
            const SHAPE: &'static $crate::Shape = &$crate::Shape::Scalar($crate::ScalarShape {
                name: <$ty as $crate::rules::TextScalar>::NAME,
            });

            fn bind(
                value: &$crate::Value,
                cx: &$crate::BindCx<'_>,
            ) -> ::std::result::Result<Self, $crate::BindError> {
                const SCALAR: $crate::ScalarShape =
                    $crate::ScalarShape { name: <$ty as $crate::rules::TextScalar>::NAME };
                let text = cx.decode_scalar(&SCALAR, value)?;
                text.parse::<$ty>().map_err(|err| $crate::BindError::scalar(SCALAR.name, err))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: ScalarShape = ScalarShape { name: "token" };
    const OTHER: ScalarShape = ScalarShape { name: "fingerprint" };

    #[test]
    fn token_rule_routes_only_tokens() {
        let rule = TokenRule;
        assert!(rule.applicable(&TOKEN, Direction::Decode));
        assert!(rule.applicable(&TOKEN, Direction::Encode));
        assert!(!rule.applicable(&OTHER, Direction::Decode));
        assert!(!rule.applicable(&OTHER, Direction::Encode));
    }

    #[test]
    fn decode_requires_a_string_node() {
        let rule = TokenRule;
        let raw = Value::String("a:b".to_owned());
        let text = rule.decode(&TOKEN, &raw).unwrap();
        assert_eq!(text, "a:b");

        let err = rule.decode(&TOKEN, &Value::Integer(3)).unwrap_err();
        assert!(matches!(err, RuleError::NotText { scalar: "token", found: Kind::Integer }));
    }

    #[test]
    fn encode_wraps_text_into_a_string_node() {
        let rule = TokenRule;
        let node = rule.encode(&TOKEN, "a:b").unwrap();
        assert_eq!(node, Value::String("a:b".to_owned()));
    }
}
