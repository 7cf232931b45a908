#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the typebind configuration pipeline: declaring
//! bindable configuration models and domain error enums.
//!
//! See each macro's docstring for examples; they are `ignore`d to avoid
//! compiling in this crate, but should be copied into consuming crates'
//! tests/examples as needed.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro to declare a bindable configuration model.
///
/// Applied to a struct, it implements `typebind::Bind` with a record shape:
/// each named field becomes a declared record field, bound recursively from a
/// mapping node. Applied to an enum of newtype variants, it implements `Bind`
/// with a union shape resolved by discriminator field or by structural match.
///
/// # Injected Behaviors
///
/// * **Derives**: Automatically adds `Debug`, `Clone`, and `PartialEq` if
///   missing, giving plain-data value semantics.
/// * **Strict fields**: input keys that no declared field consumes are
///   rejected during binding.
///
/// # Arguments (enums only)
///
/// * `tag = "kind"` - names the discriminator field. When the input mapping
///   carries that key its value selects the variant; otherwise resolution
///   falls back to shape matching.
///
/// # Field Attributes
///
/// * `#[bind(default)]` - absent fields take `Default::default()`.
/// * `#[bind(default = path)]` - absent fields take `path()`.
/// * `#[bind(rename = "...")]` - the mapping key to look up instead of the
///   field name. On an enum variant, the discriminator value instead of the
///   variant name.
///
/// `Option<T>` fields are omittable without any attribute and default to
/// `None`.
///
/// # Example
///
/// ```rust,ignore
/// use typebind_derive::config_model;
///
/// #[config_model]
/// pub struct ServerConfig {
///     pub host: String,
///     #[bind(default)]
///     pub port: u16,
/// }
///
/// #[config_model(tag = "kind")]
/// pub enum Input {
///     RemoteInput(RemoteInput),
///     LocalInput(LocalInput),
/// }
/// ```
#[proc_macro_attribute]
pub fn config_model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::model::expand_config_model(args.into(), input).into()
}

/// A high-level attribute macro for defining domain-specific error enums.
///
/// This macro reduces boilerplate by transforming a standard enum into a
/// fully-featured error type.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds
///   `.context()` to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a
///   `source` field, enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides specialized `From<&str>` and
///   `From<String>` implementations if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Variants that support context must include a
///    `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a
///    field marked with `#[source]`/`#[from]`.
/// 4. At most one enum per module: a `format_context` helper is emitted at
///    module scope alongside the enum.
///
/// # Example
///
/// ```rust,ignore
/// use typebind_derive::bind_error;
/// use std::borrow::Cow;
///
/// #[bind_error]
/// pub enum LoaderError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io {
///         #[source]
///         source: std::io::Error,
///         context: Option<Cow<'static, str>>,
///     },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn bind_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
