//! # Token
//!
//! An immutable `(uid, key)` credential reference with the canonical text form
//! `"<uuid>:<key>"`. Wherever a token appears in a configuration document it is
//! written in that form; [`Display`](std::fmt::Display) and
//! [`FromStr`](std::str::FromStr) are the authoritative codec.

use crate::bind_text_scalar;
use crate::rules::TextScalar;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use uuid::Uuid;

/// Failure to parse a token from its canonical text form.
#[derive(Debug, thiserror::Error)]
pub enum TokenParseError {
    /// The text carries no `:` separator, so there is no key segment.
    #[error("token text {text:?} has no `:` separator")]
    MissingKey { text: String },

    /// The segment before the first `:` is not a valid UUID.
    #[error("token uid is not a valid UUID: {source}")]
    InvalidUid { source: uuid::Error },
}

/// An immutable pair of a unique id and a string key.
///
/// Equality and hashing are structural. The canonical text form is
/// `"<uuid>:<key>"`; the first `:` is the separator and any segment after a
/// second `:` is dropped on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    uid: Uuid,
    key: String,
}

impl Token {
    #[must_use]
    pub fn new(uid: Uuid, key: impl Into<String>) -> Self {
        Self { uid, key: key.into() }
    }

    #[must_use]
    pub const fn uid(&self) -> Uuid {
        self.uid
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.uid, self.key)
    }
}

impl FromStr for Token {
    type Err = TokenParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut segments = text.split(':');
        let uid = segments.next().unwrap_or_default();
        let key = segments
            .next()
            .ok_or_else(|| TokenParseError::MissingKey { text: text.to_owned() })?;

        let uid = Uuid::parse_str(uid).map_err(|source| TokenParseError::InvalidUid { source })?;
        Ok(Self { uid, key: key.to_owned() })
    }
}

impl TextScalar for Token {
    const NAME: &'static str = "token";
}

bind_text_scalar!(Token);

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
