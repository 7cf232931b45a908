use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta, Type};

/// Expands the `#[config_model]` attribute macro.
///
/// Structs become record shapes, enums of newtype variants become union
/// shapes; both receive a generated `typebind::Bind` impl and plain-data
/// derives.
pub fn expand_config_model(args: TokenStream, input: DeriveInput) -> TokenStream {
    let tag = match parse_model_args(args) {
        Ok(tag) => tag,
        Err(err) => return err,
    };

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &input.generics,
            "config_model does not support generic types",
        )
        .to_compile_error();
    }

    match &input.data {
        Data::Struct(_) => {
            if let Some(tag) = tag {
                return syn::Error::new_spanned(tag, "tag = \"...\" applies to enums only")
                    .to_compile_error();
            }
            expand_record(input)
        }
        Data::Enum(_) => expand_union(input, tag),
        Data::Union(_) => syn::Error::new_spanned(
            &input.ident,
            "config_model supports structs and enums, not unions",
        )
        .to_compile_error(),
    }
}

struct FieldPlan {
    ident: Ident,
    ty: Type,
    key: LitStr,
    /// Expression producing the value when the key is absent; `None` means
    /// the field is required.
    default: Option<TokenStream>,
}

fn expand_record(mut input: DeriveInput) -> TokenStream {
    let Data::Struct(data) = &mut input.data else { unreachable!() };
    let Fields::Named(fields) = &mut data.fields else {
        return syn::Error::new_spanned(
            &input.ident,
            "config_model structs require named fields",
        )
        .to_compile_error();
    };

    let mut plans = Vec::new();
    for field in &mut fields.named {
        let opts = match take_bind_opts(&mut field.attrs) {
            Ok(opts) => opts,
            Err(err) => return err,
        };
        let Some(ident) = field.ident.clone() else { continue };
        let key = opts
            .rename
            .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
        let default = match opts.default {
            Some(DefaultKind::Std) => Some(quote! { ::std::default::Default::default }),
            Some(DefaultKind::Path(path)) => Some(quote! { #path }),
            // Option fields are omittable by construction.
            None if is_option(&field.ty) => Some(quote! { ::std::default::Default::default }),
            None => None,
        };
        plans.push(FieldPlan { ident, ty: field.ty.clone(), key, default });
    }

    let name = input.ident.clone();
    let name_str = LitStr::new(&name.to_string(), name.span());

    let shape_fields = plans.iter().map(|plan| {
        let key = &plan.key;
        let ty = &plan.ty;
        let has_default = plan.default.is_some();
        quote! {
            ::typebind::FieldShape {
                name: #key,
                shape: <#ty as ::typebind::Bind>::SHAPE,
                has_default: #has_default,
            }
        }
    });

    let bind_fields = plans.iter().map(|plan| {
        let ident = &plan.ident;
        let key = &plan.key;
        plan.default.as_ref().map_or_else(
            || quote! { #ident: record.field(#key)? },
            |default| quote! { #ident: record.field_or(#key, #default)? },
        )
    });

    let extra_derives = missing_value_derives(&input.attrs);

    quote! {
        #extra_derives
        #input

        #[automatically_derived]
        impl ::typebind::Bind for #name {
            const SHAPE: &'static ::typebind::Shape =
                &::typebind::Shape::Record(::typebind::RecordShape {
                    name: #name_str,
                    fields: &[ #(#shape_fields),* ],
                });

            fn bind(
                value: &::typebind::Value,
                cx: &::typebind::BindCx<'_>,
            ) -> ::std::result::Result<Self, ::typebind::BindError> {
                let record = cx.record(value, <Self as ::typebind::Bind>::SHAPE)?;
                record.deny_unknown()?;
                ::std::result::Result::Ok(Self { #(#bind_fields),* })
            }
        }
    }
}

struct VariantPlan {
    ident: Ident,
    ty: Type,
    tag_value: LitStr,
}

fn expand_union(mut input: DeriveInput, tag: Option<LitStr>) -> TokenStream {
    let Data::Enum(data) = &mut input.data else { unreachable!() };

    let mut plans = Vec::new();
    for variant in &mut data.variants {
        let opts = match take_bind_opts(&mut variant.attrs) {
            Ok(opts) => opts,
            Err(err) => return err,
        };
        if opts.default.is_some() {
            return syn::Error::new_spanned(
                &variant.ident,
                "bind(default) is not supported on union variants",
            )
            .to_compile_error();
        }
        let Fields::Unnamed(fields) = &variant.fields else {
            return newtype_error(&variant.ident);
        };
        let mut types = fields.unnamed.iter();
        let (Some(field), None) = (types.next(), types.next()) else {
            return newtype_error(&variant.ident);
        };
        let tag_value = opts
            .rename
            .unwrap_or_else(|| LitStr::new(&variant.ident.to_string(), variant.ident.span()));
        plans.push(VariantPlan { ident: variant.ident.clone(), ty: field.ty.clone(), tag_value });
    }

    let name = input.ident.clone();
    let name_str = LitStr::new(&name.to_string(), name.span());
    let tag_tokens = tag.map_or_else(
        || quote! { ::std::option::Option::None },
        |tag| quote! { ::std::option::Option::Some(#tag) },
    );

    let shape_variants = plans.iter().map(|plan| {
        let variant_str = LitStr::new(&plan.ident.to_string(), plan.ident.span());
        let tag_value = &plan.tag_value;
        let ty = &plan.ty;
        quote! {
            ::typebind::UnionVariant {
                name: #variant_str,
                tag_value: #tag_value,
                shape: <#ty as ::typebind::Bind>::SHAPE,
            }
        }
    });

    let arms = plans.iter().enumerate().map(|(index, plan)| {
        let ident = &plan.ident;
        let ty = &plan.ty;
        quote! {
            #index => <#ty as ::typebind::Bind>::bind(&node, cx).map(Self::#ident),
        }
    });

    let extra_derives = missing_value_derives(&input.attrs);

    quote! {
        #extra_derives
        #input

        #[automatically_derived]
        impl ::typebind::Bind for #name {
            const SHAPE: &'static ::typebind::Shape =
                &::typebind::Shape::Union(::typebind::UnionShape {
                    name: #name_str,
                    tag: #tag_tokens,
                    variants: &[ #(#shape_variants),* ],
                });

            fn bind(
                value: &::typebind::Value,
                cx: &::typebind::BindCx<'_>,
            ) -> ::std::result::Result<Self, ::typebind::BindError> {
                let (index, node) = cx.union(value, <Self as ::typebind::Bind>::SHAPE)?;
                match index {
                    #(#arms)*
                    _ => ::std::unreachable!("union variant index out of range"),
                }
            }
        }
    }
}

fn newtype_error(ident: &Ident) -> TokenStream {
    syn::Error::new_spanned(
        ident,
        "config_model enum variants must be newtypes wrapping a record type",
    )
    .to_compile_error()
}

enum DefaultKind {
    Std,
    Path(syn::Path),
}

struct BindOpts {
    rename: Option<LitStr>,
    default: Option<DefaultKind>,
}

fn take_bind_opts(attrs: &mut Vec<Attribute>) -> Result<BindOpts, TokenStream> {
    let mut opts = BindOpts { rename: None, default: None };
    let mut kept = Vec::new();

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("bind") {
            kept.push(attr);
            continue;
        }
        let res = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value = meta.value()?;
                opts.rename = Some(value.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("default") {
                if meta.input.peek(syn::Token![=]) {
                    let value = meta.value()?;
                    opts.default = Some(DefaultKind::Path(value.parse()?));
                } else {
                    opts.default = Some(DefaultKind::Std);
                }
                return Ok(());
            }
            Err(meta.error("unsupported bind attribute; expected rename or default"))
        });
        if let Err(err) = res {
            return Err(err.to_compile_error());
        }
    }

    *attrs = kept;
    Ok(opts)
}

fn parse_model_args(args: TokenStream) -> Result<Option<LitStr>, TokenStream> {
    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;

    let mut tag = None;
    for meta in metas {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "Expected name-value arguments like `tag = \"...\"`",
            )
            .to_compile_error());
        };
        if !name_value.path.is_ident("tag") {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Unsupported argument; expected tag",
            )
            .to_compile_error());
        }
        if tag.is_some() {
            return Err(
                syn::Error::new_spanned(name_value, "Duplicate argument").to_compile_error()
            );
        }
        let syn::Expr::Lit(expr_lit) = &name_value.value else {
            return Err(syn::Error::new_spanned(
                &name_value.value,
                "tag must be a string literal",
            )
            .to_compile_error());
        };
        let syn::Lit::Str(lit) = &expr_lit.lit else {
            return Err(syn::Error::new_spanned(
                &expr_lit.lit,
                "tag must be a string literal",
            )
            .to_compile_error());
        };
        tag = Some(lit.clone());
    }
    Ok(tag)
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|segment| segment.ident == "Option")
}

fn missing_value_derives(attrs: &[Attribute]) -> TokenStream {
    let derives = derived_trait_names(attrs);
    let mut tokens = Vec::new();
    if !derives.contains("Debug") {
        tokens.push(quote! { Debug });
    }
    if !derives.contains("Clone") {
        tokens.push(quote! { Clone });
    }
    if !derives.contains("PartialEq") {
        tokens.push(quote! { PartialEq });
    }

    if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
}

fn derived_trait_names(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs {
        if !attr.path().is_ident("derive") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident() {
                traits.insert(ident.to_string());
            } else if let Some(ident) = meta.path.segments.last().map(|seg| seg.ident.to_string()) {
                traits.insert(ident);
            }
            Ok(())
        });
    }

    traits
}
