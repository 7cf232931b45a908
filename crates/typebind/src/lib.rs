//! Typed configuration binding for command-line entry points.
//!
//! This crate turns the loosely-typed tree produced by a configuration
//! composition engine into a statically-typed, immutable configuration record
//! before any entry-function code runs. Declare the record with
//! [`#[config_model]`](config_model), point an [`EntryPoint`] at a config
//! directory, and the pipeline composes, binds, and calls the function:
//!
//! composition engine → [`Value`] tree → [`Binder::bind`] → typed record →
//! entry function.
//!
//! Custom text scalars such as [`Token`] (canonical form `"<uuid>:<key>"`)
//! cross the pipeline through an ordered chain of conversion rules; tagged
//! unions resolve by discriminator field or by shape, and every mismatch is
//! reported with the full field path before any user code executes.
//!
//! ## Example
//! ```rust
//! use typebind::prelude::*;
//!
//! #[config_model]
//! struct AppConfig {
//!     name: String,
//!     #[bind(default)]
//!     verbose: bool,
//! }
//!
//! # fn main() -> Result<(), EntryError> {
//! let tree = Value::from(serde_json::json!({ "name": "demo" }));
//! let entry = EntryPoint::builder("config").build()?;
//! let greeting = entry.run_on(&tree, |config: AppConfig| {
//!     assert!(!config.verbose);
//!     format!("hello {}", config.name)
//! })?;
//! assert_eq!(greeting, "hello demo");
//! # Ok(())
//! # }
//! ```

mod bind;
mod binder;
mod compose;
mod entry;
pub mod rules;
mod shape;
mod token;
mod value;

pub use bind::{Bind, BindCx, BindError, FieldPath, RecordBinder, Segment};
pub use binder::{Binder, ShapeError};
pub use compose::{ComposeError, ComposeErrorExt, Composer};
pub use entry::{EntryError, EntryErrorExt, EntryPoint, EntryPointBuilder};
pub use rules::{Direction, RuleError, ScalarRule, TextScalar, TokenRule};
pub use shape::{FieldShape, RecordShape, ScalarShape, Shape, UnionShape, UnionVariant};
pub use token::{Token, TokenParseError};
pub use typebind_derive::{bind_error, config_model};
pub use value::{Kind, Value};

pub mod prelude {
    pub use crate::bind::{Bind, BindError};
    pub use crate::binder::{Binder, ShapeError};
    pub use crate::compose::{ComposeError, Composer};
    pub use crate::entry::{EntryError, EntryPoint};
    pub use crate::token::{Token, TokenParseError};
    pub use crate::value::Value;
    pub use typebind_derive::{bind_error, config_model};
}
