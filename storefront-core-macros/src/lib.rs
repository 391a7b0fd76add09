//! `#[derive(Request)]`: a `Debug` impl for effect requests that is safe to
//! feed to the tracing observer.
//!
//! - fields named `returns` are callbacks and are left out entirely;
//! - fields marked `#[request(redact)]` print as `<redacted>` (headers carrying
//!   CSRF tokens, form bodies).

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields};

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldMode {
    Show,
    Redact,
    Skip,
}

#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => struct_body(name, &data.fields)?,
        Data::Enum(data) => {
            let mut arms = Vec::new();
            for variant in &data.variants {
                arms.push(variant_arm(name, &variant.ident, &variant.fields)?);
            }
            quote! {
                match self {
                    #(#arms),*
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Request derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Debug for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }
    })
}

fn field_mode(field: &Field) -> syn::Result<FieldMode> {
    if field.ident.as_ref().is_some_and(|id| id == "returns") {
        return Ok(FieldMode::Skip);
    }
    let mut mode = FieldMode::Show;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("request")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("redact") {
                mode = FieldMode::Redact;
                Ok(())
            } else if meta.path.is_ident("skip") {
                mode = FieldMode::Skip;
                Ok(())
            } else {
                Err(meta.error("expected `redact` or `skip`"))
            }
        })?;
    }
    Ok(mode)
}

fn value_tokens(mode: FieldMode, access: TokenStream2) -> TokenStream2 {
    match mode {
        FieldMode::Redact => quote! { &::std::format_args!("<redacted>") },
        _ => access,
    }
}

fn struct_body(name: &syn::Ident, fields: &Fields) -> syn::Result<TokenStream2> {
    match fields {
        Fields::Named(named) => {
            let mut writers = Vec::new();
            for field in &named.named {
                let mode = field_mode(field)?;
                if mode == FieldMode::Skip {
                    continue;
                }
                let ident = field.ident.as_ref().expect("named field");
                let value = value_tokens(mode, quote! { &self.#ident });
                writers.push(quote! { .field(stringify!(#ident), #value) });
            }
            Ok(quote! {
                f.debug_struct(stringify!(#name))
                    #(#writers)*
                    .finish()
            })
        }
        Fields::Unnamed(unnamed) => {
            let mut writers = Vec::new();
            for (i, field) in unnamed.unnamed.iter().enumerate() {
                let mode = field_mode(field)?;
                if mode == FieldMode::Skip {
                    continue;
                }
                let idx = syn::Index::from(i);
                let value = value_tokens(mode, quote! { &self.#idx });
                writers.push(quote! { d.field(#value); });
            }
            Ok(quote! {
                let mut d = f.debug_tuple(stringify!(#name));
                #(#writers)*
                d.finish()
            })
        }
        Fields::Unit => Ok(quote! { f.write_str(stringify!(#name)) }),
    }
}

fn variant_arm(
    name: &syn::Ident,
    vident: &syn::Ident,
    fields: &Fields,
) -> syn::Result<TokenStream2> {
    let label = quote! { concat!(stringify!(#name), "::", stringify!(#vident)) };
    match fields {
        Fields::Unit => Ok(quote! { #name::#vident => f.write_str(#label) }),
        Fields::Unnamed(unnamed) => {
            let bindings: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let mut writes = Vec::new();
            for (binding, field) in bindings.iter().zip(&unnamed.unnamed) {
                let mode = field_mode(field)?;
                if mode == FieldMode::Skip {
                    continue;
                }
                let value = value_tokens(mode, quote! { #binding });
                writes.push(quote! { d.field(#value); });
            }
            Ok(quote! {
                #name::#vident( #( #bindings ),* ) => {
                    #( let _ = #bindings; )*
                    let mut d = f.debug_tuple(#label);
                    #(#writes)*
                    d.finish()
                }
            })
        }
        Fields::Named(named) => {
            let bindings: Vec<_> = named
                .named
                .iter()
                .filter_map(|fld| fld.ident.clone())
                .collect();
            let mut writes = Vec::new();
            for field in &named.named {
                let mode = field_mode(field)?;
                if mode == FieldMode::Skip {
                    continue;
                }
                let id = field.ident.as_ref().expect("named field");
                let value = value_tokens(mode, quote! { #id });
                writes.push(quote! { d.field(stringify!(#id), #value); });
            }
            Ok(quote! {
                #name::#vident { #( #bindings ),* } => {
                    #( let _ = #bindings; )*
                    let mut d = f.debug_struct(#label);
                    #(#writes)*
                    d.finish()
                }
            })
        }
    }
}
