//! # Composer
//!
//! Thin adapter over the external composition engine (the `config` crate).
//! Layering order: the root document file, then an optional environment
//! overlay, then explicit dotted-key overrides. The composed result is
//! extracted into the crate's own [`Value`] tree; all file and environment
//! I/O happens here and nowhere else in the crate.

use crate::value::Value;
use config::{Case, Config, Environment, File};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::info;

/// Failure while composing the untyped configuration tree.
#[typebind_derive::bind_error]
pub enum ComposeError {
    /// The composition engine rejected a source or the merge failed.
    #[error("Composition error{}: {source}", format_context(.context))]
    Engine { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// Malformed override arguments or other orchestration faults.
    #[error("Internal composition error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Builds an untyped config tree from a directory, a root document name,
/// process-supplied overrides, and an optional environment overlay.
#[derive(Debug, Clone)]
pub struct Composer {
    dir: PathBuf,
    root: String,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl Composer {
    /// A composer rooted at `dir`, reading the `config` document by default.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), root: "config".to_owned(), env_prefix: None, overrides: Vec::new() }
    }

    /// Sets the root document name (extension is inferred by the engine).
    #[must_use]
    pub fn root(mut self, name: impl Into<String>) -> Self {
        self.root = name.into();
        self
    }

    /// Enables the environment overlay: `PREFIX__SECTION__KEY` maps to
    /// `section.key`, with scalar values parsed.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Adds one dotted-key override, applied after all file and environment
    /// sources.
    #[must_use]
    pub fn override_(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Adds overrides from `key=value` arguments, the form a process passes
    /// through from its command line.
    pub fn args<I>(mut self, args: I) -> Result<Self, ComposeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, value)) = arg.split_once('=') else {
                return Err(format!("override {arg:?} is not of the form key=value").into());
            };
            self.overrides.push((key.to_owned(), value.to_owned()));
        }
        Ok(self)
    }

    /// Runs the composition engine and extracts the merged untyped tree.
    pub fn compose(&self) -> Result<Value, ComposeError> {
        let path = self.dir.join(&self.root);
        info!("Composing configuration from {}", path.display());

        let mut builder = Config::builder().add_source(File::from(path.as_path()).required(true));
        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .convert_case(Case::Snake)
                    .try_parsing(true),
            );
        }
        for (key, value) in &self.overrides {
            builder = builder
                .set_override(key.as_str(), parse_override(value))
                .context("Failed to apply override")?;
        }

        let composed = builder.build().context("Failed to compose configuration")?;
        let tree: serde_json::Value =
            composed.try_deserialize().context("Failed to extract configuration tree")?;
        Ok(Value::from(tree))
    }
}

/// Override values arrive as text; scalars are parsed the same way the
/// environment overlay parses them, so `answer=42` lands as an integer.
fn parse_override(value: &str) -> config::Value {
    if let Ok(int) = value.parse::<i64>() {
        return int.into();
    }
    if let Ok(float) = value.parse::<f64>() {
        return float.into();
    }
    match value {
        "true" => true.into(),
        "false" => false.into(),
        _ => value.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_scalars_arrive_typed() {
        assert_eq!(parse_override("42").into_int().unwrap(), 42);
        assert_eq!(parse_override("0.5").into_float().unwrap(), 0.5);
        assert!(parse_override("true").into_bool().unwrap());
        assert_eq!(parse_override("/data").into_string().unwrap(), "/data");
    }

    #[test]
    fn args_accept_key_value_pairs() {
        let composer = Composer::new("conf").args(["answer=42", "name=foo"]).unwrap();
        assert_eq!(composer.overrides.len(), 2);
        assert_eq!(composer.overrides[0], ("answer".to_owned(), "42".to_owned()));
    }

    #[test]
    fn malformed_args_are_rejected() {
        let err = Composer::new("conf").args(["answer"]).unwrap_err();
        assert!(matches!(err, ComposeError::Internal { .. }));
        assert!(err.to_string().contains("key=value"));
    }

    #[test]
    fn missing_root_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Composer::new(dir.path()).compose().unwrap_err();
        assert!(matches!(err, ComposeError::Engine { .. }));
    }
}
