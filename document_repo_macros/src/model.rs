use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, FieldsNamed, Ident, LitStr, Type};

#[derive(Default)]
struct ModelArgs {
    data: Option<Type>,
    patch: Option<Type>,
    id_field: Option<LitStr>,
    created_at_field: Option<LitStr>,
    updated_at_field: Option<LitStr>,
}

pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let args = extract_args(input)?;
    let fields = named_fields(input)?;

    let id = marked_field(fields, "id")?
        .or_else(|| field_named(fields, "id"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                name,
                "Model derive: no field marked with #[model(id)] and no field named `id`",
            )
        })?;
    let created_at = marked_field(fields, "created_at")?.or_else(|| field_named(fields, "created_at"));
    let updated_at = marked_field(fields, "updated_at")?.or_else(|| field_named(fields, "updated_at"));

    let document = quote! { ::document_repo::Document };
    let data = args.data.map_or_else(|| document.clone(), |ty| quote! { #ty });
    let patch = args.patch.map_or_else(|| document.clone(), |ty| quote! { #ty });

    let id_const = args
        .id_field
        .map(|field| quote! { const ID_FIELD: &'static str = #field; });
    let created_at_const = args
        .created_at_field
        .map(|field| quote! { const CREATED_AT_FIELD: &'static str = #field; });
    let updated_at_const = args
        .updated_at_field
        .map(|field| quote! { const UPDATED_AT_FIELD: &'static str = #field; });

    let created_at_body = date_accessor(created_at);
    let updated_at_body = date_accessor(updated_at);

    Ok(quote! {
        impl ::document_repo::Model for #name {
            type Data = #data;
            type Patch = #patch;

            #id_const
            #created_at_const
            #updated_at_const

            fn id(&self) -> &str {
                &self.#id
            }

            fn created_at(&self) -> ::std::option::Option<::document_repo::__private::DateTime<::document_repo::__private::Utc>> {
                #created_at_body
            }

            fn updated_at(&self) -> ::std::option::Option<::document_repo::__private::DateTime<::document_repo::__private::Utc>> {
                #updated_at_body
            }
        }
    })
}

fn date_accessor(field: Option<Ident>) -> TokenStream2 {
    match field {
        Some(field) => quote! { ::document_repo::__private::ModelDate::model_date(&self.#field) },
        None => quote! { ::std::option::Option::None },
    }
}

fn extract_args(input: &DeriveInput) -> syn::Result<ModelArgs> {
    let mut args = ModelArgs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("model") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("data") {
                args.data = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("patch") {
                args.patch = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("id_field") {
                args.id_field = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("created_at_field") {
                args.created_at_field = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("updated_at_field") {
                args.updated_at_field = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unsupported model attribute"));
            }
            Ok(())
        })?;
    }
    Ok(args)
}

fn named_fields(input: &DeriveInput) -> syn::Result<&FieldsNamed> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            return Ok(fields);
        }
    }
    Err(syn::Error::new_spanned(
        &input.ident,
        "Model derive: only structs with named fields are supported",
    ))
}

fn marked_field(fields: &FieldsNamed, marker: &str) -> syn::Result<Option<Ident>> {
    for field in &fields.named {
        for attr in &field.attrs {
            if !attr.path().is_ident("model") {
                continue;
            }

            let mut marked = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(marker) {
                    marked = true;
                }
                Ok(())
            })?;
            if marked {
                return Ok(field.ident.clone());
            }
        }
    }
    Ok(None)
}

fn field_named(fields: &FieldsNamed, name: &str) -> Option<Ident> {
    fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == name)
        .cloned()
}
