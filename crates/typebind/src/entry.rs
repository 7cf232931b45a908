//! # Entry point
//!
//! [`EntryPoint`] adapts the composition engine to a statically-typed calling
//! convention: compose the untyped tree, bind it into the entry function's
//! declared configuration type, then call the function with the typed value.
//! The target type is validated *before* any composition I/O, so a misdeclared
//! configuration type fails fast with a shape error rather than mid-parse.

use crate::bind::{Bind, BindError};
use crate::binder::{Binder, ShapeError};
use crate::compose::{ComposeError, Composer};
use crate::value::Value;
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::debug;

/// Failure while running a typed entry point.
#[typebind_derive::bind_error]
pub enum EntryError {
    /// The declared configuration type is not a valid binding target.
    #[error("Entry configuration type error{}: {source}", format_context(.context))]
    Shape { source: ShapeError, context: Option<Cow<'static, str>> },

    /// The composition engine failed to produce a tree.
    #[error("Entry composition error{}: {source}", format_context(.context))]
    Compose { source: ComposeError, context: Option<Cow<'static, str>> },

    /// The composed tree does not match the declared configuration type.
    #[error("Entry binding error{}: {source}", format_context(.context))]
    Bind { source: BindError, context: Option<Cow<'static, str>> },
}

/// A configured typed entry point: composition source plus binder.
#[derive(Debug)]
pub struct EntryPoint {
    composer: Composer,
    binder: Binder,
}

impl EntryPoint {
    /// Starts building an entry point reading configuration from `config_dir`.
    #[must_use]
    pub fn builder(config_dir: impl Into<PathBuf>) -> EntryPointBuilder {
        EntryPointBuilder {
            composer: Composer::new(config_dir),
            binder: Binder::new(),
            args: Vec::new(),
        }
    }

    /// Composes, binds into `T`, and calls `entry` with the typed value,
    /// propagating its return value unchanged.
    ///
    /// The target shape is checked before composition, so no file is read for
    /// a misdeclared configuration type.
    pub fn run<T: Bind, R>(&self, entry: impl FnOnce(T) -> R) -> Result<R, EntryError> {
        self.binder.check::<T>()?;
        let tree = self.composer.compose()?;
        self.call(&tree, entry)
    }

    /// Binds an already-composed tree and calls `entry`, skipping the
    /// composition engine. Host runners that compose elsewhere use this.
    pub fn run_on<T: Bind, R>(
        &self,
        tree: &Value,
        entry: impl FnOnce(T) -> R,
    ) -> Result<R, EntryError> {
        self.binder.check::<T>()?;
        self.call(tree, entry)
    }

    fn call<T: Bind, R>(&self, tree: &Value, entry: impl FnOnce(T) -> R) -> Result<R, EntryError> {
        debug!("Binding configuration into `{}`", T::SHAPE.label());
        let config = self.binder.bind::<T>(tree)?;
        Ok(entry(config))
    }
}

/// Builder for [`EntryPoint`].
#[derive(Debug)]
pub struct EntryPointBuilder {
    composer: Composer,
    binder: Binder,
    args: Vec<String>,
}

impl EntryPointBuilder {
    /// Root document name; defaults to `config`.
    #[must_use]
    pub fn root(mut self, name: impl Into<String>) -> Self {
        self.composer = self.composer.root(name);
        self
    }

    /// Environment-overlay prefix, e.g. `APP` for `APP__SERVER__PORT`.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.composer = self.composer.env_prefix(prefix);
        self
    }

    /// One dotted-key override.
    #[must_use]
    pub fn override_(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.composer = self.composer.override_(key, value);
        self
    }

    /// Process-supplied `key=value` override arguments, validated at
    /// [`build`](Self::build) time.
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replaces the default binder, e.g. to register extra scalar rules.
    #[must_use]
    pub fn binder(mut self, binder: Binder) -> Self {
        self.binder = binder;
        self
    }

    pub fn build(self) -> Result<EntryPoint, EntryError> {
        let composer = self.composer.args(self.args)?;
        Ok(EntryPoint { composer, binder: self.binder })
    }
}
