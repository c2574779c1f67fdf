use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro describing the CSV columns of a record type.
///
/// For each named field it collects:
/// - the column name (`#[serde(rename = "...")]` wins over the field name)
/// - whether the column is required (anything but `Option<T>`)
/// - a description taken from the doc comments
/// - an optional sample value from `#[csv(example = "...")]`
///
/// The generated `csv_columns()` returns `&'static [crate::cmd::CsvColumn]`.
#[proc_macro_derive(CsvSchema, attributes(serde, csv))]
pub fn derive_csv_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "CsvSchema needs named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "CsvSchema only supports structs")
                .to_compile_error()
                .into()
        }
    };

    let mut columns = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let column = match serde_rename(&field.attrs) {
            Ok(rename) => rename.unwrap_or_else(|| ident.to_string()),
            Err(err) => return err.to_compile_error().into(),
        };
        let example = match csv_example(&field.attrs) {
            Ok(example) => example.unwrap_or_default(),
            Err(err) => return err.to_compile_error().into(),
        };
        let required = !is_option_type(&field.ty);
        let description = doc_comment(&field.attrs);

        columns.push(quote! {
            crate::cmd::CsvColumn {
                name: #column,
                required: #required,
                description: #description,
                example: #example,
            }
        });
    }

    let expanded = quote! {
        impl #name {
            pub fn csv_columns() -> &'static [crate::cmd::CsvColumn] {
                static COLUMNS: &[crate::cmd::CsvColumn] = &[
                    #(#columns),*
                ];
                COLUMNS
            }
        }
    };

    TokenStream::from(expanded)
}

fn serde_rename(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.input.peek(syn::Token![=]) {
                // other key = value options (default = "...", with = "...")
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(rename)
}

fn csv_example(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut example = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("csv")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("example") {
                let value: LitStr = meta.value()?.parse()?;
                example = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported csv attribute"))
            }
        })?;
    }
    Ok(example)
}

fn doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
