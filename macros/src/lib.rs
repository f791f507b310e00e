//! Derive macro for `repokit::Entity`.
//!
//! ```ignore
//! #[derive(Debug, Default, Serialize, Deserialize, Entity)]
//! #[entity(table = "accounts", unique = "email")]
//! struct Account {
//!     id: i64,
//!     email: String,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Lit, Token, parse::Parse, parse::ParseStream, parse_macro_input};

#[derive(Default)]
struct EntityArgs {
    table: Option<String>,
    unique: Vec<String>,
}

impl Parse for EntityArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = EntityArgs::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "table" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        args.table = Some(s.value());
                    } else {
                        return Err(syn::Error::new(lit.span(), "table must be a string literal"));
                    }
                }
                "unique" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        args.unique.push(s.value());
                    } else {
                        return Err(syn::Error::new(
                            lit.span(),
                            "unique must be a string literal",
                        ));
                    }
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!(
                            "unknown attribute `{}`, expected `table` or `unique`",
                            other
                        ),
                    ));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// Implements `repokit::Entity` for a struct.
///
/// The table defaults to the snake_case struct name. `#[entity(...)]` accepts
/// `table = "..."` and any number of `unique = "..."` entries.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand_entity(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !matches!(input.data, syn::Data::Struct(_)) {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Entity can only be derived for structs",
        ));
    }

    let mut args = EntityArgs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("entity")) {
        let parsed: EntityArgs = attr.parse_args()?;
        if parsed.table.is_some() {
            args.table = parsed.table;
        }
        args.unique.extend(parsed.unique);
    }

    let name = &input.ident;
    let table = args
        .table
        .unwrap_or_else(|| to_snake_case(&name.to_string()));
    let unique = &args.unique;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::repokit::Entity for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;

            fn unique_fields() -> &'static [&'static str] {
                &[#(#unique),*]
            }
        }
    })
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_table_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("UserAccount"), "user_account");
        assert_eq!(to_snake_case("HTTPRequestLog"), "http_request_log");
        assert_eq!(to_snake_case("Order2Item"), "order2_item");
    }

    #[test]
    fn test_parse_entity_args() {
        let args: EntityArgs =
            syn::parse_str(r#"table = "accounts", unique = "email", unique = "handle""#).unwrap();
        assert_eq!(args.table.as_deref(), Some("accounts"));
        assert_eq!(args.unique, vec!["email".to_string(), "handle".to_string()]);
    }

    #[test]
    fn test_parse_entity_args_unknown_attribute() {
        let result: syn::Result<EntityArgs> = syn::parse_str(r#"name = "accounts""#);
        let err = result.err().expect("unknown attribute should fail");
        assert!(err.to_string().contains("unknown attribute `name`"));
    }
}
