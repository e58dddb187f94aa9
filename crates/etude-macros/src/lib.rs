//! Procedural macros for Etude resolver units.
//!
//! - `#[resolvers]` turns an inherent impl block into a resolver group and
//!   links it as a discoverable unit of the file it is written in.
//!
//! # How it works
//!
//! The impl block is emitted unchanged apart from the helper attributes.
//! Alongside it the macro generates:
//!
//! - an `etude_core::discovery::ResolverGroup` impl binding every resolver
//!   method to one shared `Arc<Self>`
//! - a load function constructing the group once, via `new()` when the
//!   block defines one and `Default` otherwise
//! - an `inventory` submission tagging that load function with `file!()`
//!   and the crate's manifest directory, so discovery can match it to the
//!   walked source file
//!
//! # Examples
//!
//! ```rust,ignore
//! use etude_core::prelude::*;
//!
//! pub struct UsersResolvers {
//!     users: Vec<User>,
//! }
//!
//! #[resolvers]
//! impl UsersResolvers {
//!     pub fn new() -> Self {
//!         UsersResolvers { users: seed() }
//!     }
//!
//!     // POST /api/getUsersByName, only for callers presenting `admin`
//!     #[require_identity("admin")]
//!     pub async fn get_users_by_name(&self, ctx: RequestContext) -> Result<Vec<User>, ResolverError> {
//!         let query: ByName = ctx.parse()?;
//!         Ok(self.users.iter().filter(|u| u.name == query.name).cloned().collect())
//!     }
//!
//!     // POST /api/countUsers, open to everyone
//!     pub async fn count_users(&self) -> Result<usize, ResolverError> {
//!         Ok(self.users.len())
//!     }
//!
//!     #[resolver(skip)]
//!     pub fn users(&self) -> &[User] {
//!         &self.users
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, ReturnType, Type,
    Visibility,
};

/// Turn an inherent impl block into a discoverable resolver group.
///
/// Every `pub async fn` taking `&self` and at most one further argument (the
/// `RequestContext`) becomes a resolver named after the method in
/// lowerCamelCase. Method attributes:
///
/// - `#[require_identity("label")]` gates the resolver on an exact identity
/// - `#[resolver(rename = "name")]` overrides the wire name
/// - `#[resolver(skip)]` keeps a public method out of the group
///
/// The group is constructed once per discovery, with `new()` (optionally
/// `async`, optionally returning `Result`) or `Default::default()`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// pub struct SystemResolvers;
///
/// #[resolvers]
/// impl SystemResolvers {
///     pub async fn ping(&self) -> Result<&'static str, ResolverError> {
///         Ok("pong")
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn resolvers(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::TokenStream::from(attr).span(),
            "#[resolvers] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let mut input = parse_macro_input!(item as ItemImpl);
    match expand_group(&mut input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// How the group instance is built by the load function.
struct Constructor {
    is_async: bool,
    fallible: bool,
}

/// One resolver method, after its helper attributes were consumed.
struct ResolverMethod {
    method: syn::Ident,
    wire_name: Option<LitStr>,
    identity: Option<LitStr>,
    takes_context: bool,
}

#[derive(Default)]
struct MethodAttrs {
    identity: Option<LitStr>,
    rename: Option<LitStr>,
    skip: bool,
}

fn expand_group(input: &mut ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[resolvers] must be placed on an inherent impl block, not a trait impl",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[resolvers] does not support generic groups",
        ));
    }

    let mut constructor = None;
    let mut methods = Vec::new();

    for item in input.items.iter_mut() {
        let ImplItem::Fn(func) = item else { continue };
        let attrs = take_method_attrs(&mut func.attrs)?;

        if func.sig.ident == "new" {
            if attrs.identity.is_some() || attrs.rename.is_some() {
                return Err(syn::Error::new_spanned(
                    &func.sig.ident,
                    "the group constructor cannot be a resolver",
                ));
            }
            constructor = Some(constructor_of(func)?);
            continue;
        }

        if let Some(method) = resolver_method(func, attrs)? {
            methods.push(method);
        }
    }

    let self_ty = &input.self_ty;
    let entries = methods.iter().map(resolver_entry);
    let construct = construct_group(self_ty, constructor.as_ref());

    Ok(quote! {
        #input

        impl ::etude_core::discovery::ResolverGroup for #self_ty {
            fn resolvers(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::etude_core::resolver::Resolver> {
                ::std::vec![#(#entries),*]
            }
        }

        const _: () = {
            fn __etude_load_unit() -> ::etude_core::discovery::UnitFuture {
                ::etude_core::discovery::unit_future(async {
                    let group = #construct;
                    ::std::result::Result::<_, ::etude_core::discovery::LoadError>::Ok(
                        ::etude_core::discovery::LoadedUnit::group(group),
                    )
                })
            }

            ::etude_core::inventory::submit! {
                ::etude_core::discovery::LinkedUnit::new(
                    ::std::file!(),
                    ::std::env!("CARGO_MANIFEST_DIR"),
                    ::std::module_path!(),
                    __etude_load_unit,
                )
            }
        };
    })
}

/// Strip `#[require_identity]` and `#[resolver]` from a method.
fn take_method_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<MethodAttrs> {
    let mut parsed = MethodAttrs::default();
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if attr.path().is_ident("require_identity") {
            if parsed.identity.is_some() {
                return Err(syn::Error::new_spanned(
                    &attr,
                    "a resolver accepts a single #[require_identity] label",
                ));
            }
            let label: LitStr = attr.parse_args()?;
            if label.value().is_empty() {
                return Err(syn::Error::new_spanned(&label, "identity label must not be empty"));
            }
            parsed.identity = Some(label);
        } else if attr.path().is_ident("resolver") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    if name.value().is_empty() {
                        return Err(meta.error("resolver name must not be empty"));
                    }
                    parsed.rename = Some(name);
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `rename = \"...\"` or `skip`"))
                }
            })?;
        } else {
            kept.push(attr);
        }
    }

    *attrs = kept;
    Ok(parsed)
}

fn constructor_of(func: &ImplItemFn) -> syn::Result<Constructor> {
    if !func.sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.inputs,
            "the group constructor `new` must take no arguments",
        ));
    }

    Ok(Constructor {
        is_async: func.sig.asyncness.is_some(),
        fallible: returns_result(&func.sig.output),
    })
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Result"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}

/// Decide whether a method is a resolver. Public `&self` methods must be
/// resolver-shaped unless skipped.
fn resolver_method(func: &ImplItemFn, attrs: MethodAttrs) -> syn::Result<Option<ResolverMethod>> {
    let sig = &func.sig;
    let borrows_self = matches!(
        sig.inputs.first(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    let is_public = matches!(func.vis, Visibility::Public(_));
    let annotated = attrs.identity.is_some() || attrs.rename.is_some();

    if attrs.skip {
        if annotated {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "a skipped method cannot be renamed or gated",
            ));
        }
        return Ok(None);
    }

    if !(is_public && borrows_self) {
        if annotated {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "resolver methods must be `pub` and take `&self`",
            ));
        }
        return Ok(None);
    }

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "resolver methods must be `async`; mark helpers with #[resolver(skip)]",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "resolver methods cannot be generic",
        ));
    }

    let takes_context = match sig.inputs.len() {
        1 => false,
        2 => true,
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.inputs,
                "resolver methods take `&self` and at most a `RequestContext`",
            ))
        }
    };

    Ok(Some(ResolverMethod {
        method: sig.ident.clone(),
        wire_name: attrs.rename,
        identity: attrs.identity,
        takes_context,
    }))
}

fn resolver_entry(resolver: &ResolverMethod) -> TokenStream2 {
    let method = &resolver.method;
    let span = method.span();

    let name = match &resolver.wire_name {
        Some(name) => quote! { #name },
        None => quote! { ::etude_core::naming::wire_name(::std::stringify!(#method)) },
    };

    let call = if resolver.takes_context {
        quote_spanned! {span=> group.#method(ctx).await }
    } else {
        quote_spanned! {span=> { let _ = ctx; group.#method().await } }
    };

    let gate = resolver.identity.as_ref().map(|label| {
        quote! {
            let resolver = ::etude_core::gate::require_identity(#label).wrap(resolver);
        }
    });

    quote! {
        {
            let shared = ::std::sync::Arc::clone(&self);
            let resolver = ::etude_core::resolver::Resolver::new(
                #name,
                move |ctx: ::etude_core::resolver::RequestContext| {
                    let group = ::std::sync::Arc::clone(&shared);
                    async move { #call }
                },
            );
            #gate
            resolver
        }
    }
}

fn construct_group(self_ty: &Type, constructor: Option<&Constructor>) -> TokenStream2 {
    match constructor {
        None => quote! { <#self_ty as ::std::default::Default>::default() },
        Some(Constructor { is_async, fallible }) => {
            let awaited = is_async.then(|| quote! { .await });
            let checked = fallible.then(|| quote! { ? });
            quote! { <#self_ty>::new() #awaited #checked }
        }
    }
}
