use darling::{FromDeriveInput, FromField, util::Ignored};
use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::{quote, quote_spanned};
use syn::{DeriveInput, Ident, Type, Visibility, ext::IdentExt, parse_macro_input, spanned::Spanned};

#[derive(FromDeriveInput)]
#[darling(supports(struct_named))]
struct DestinationInput {
    data: darling::ast::Data<Ignored, BindField>,
    generics: syn::Generics,
    ident: syn::Ident,
}

#[derive(Debug)]
struct BindField {
    ident: Ident,
    ty: Type,
    vis: Visibility,
    /// `(namespace, directive)` pairs, in declaration order.
    /// The directive is empty for bare entries, e.g. `#[bind(form)]`.
    annotations: Vec<(String, String)>,
}

impl BindField {
    fn is_bindable(&self) -> bool {
        matches!(self.vis, Visibility::Public(_)) && !self.annotations.is_empty()
    }
}

impl FromField for BindField {
    fn from_field(field: &syn::Field) -> darling::Result<Self> {
        let mut errors = darling::Error::accumulator();
        let mut annotations: Vec<(String, String)> = Vec::new();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("bind")) {
            let outcome = attr.parse_nested_meta(|meta| {
                let namespace = meta.path.require_ident()?.unraw().to_string();
                let directive = if meta.input.peek(syn::Token![=]) {
                    meta.value()?.parse::<syn::LitStr>()?.value()
                } else {
                    String::new()
                };
                if annotations.iter().any(|(ns, _)| *ns == namespace) {
                    return Err(meta.error(format!(
                        "The `{namespace}` namespace is specified more than once for this field."
                    )));
                }
                annotations.push((namespace, directive));
                Ok(())
            });
            errors.handle(outcome.map_err(darling::Error::from));
        }

        errors.finish_with(Self {
            ident: field.ident.clone().unwrap(),
            ty: field.ty.clone(),
            vis: field.vis.clone(),
            annotations,
        })
    }
}

pub(super) fn derive_destination(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match _derive_destination(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn _derive_destination(input: DeriveInput) -> Result<proc_macro2::TokenStream, darling::Error> {
    let input = DestinationInput::from_derive_input(&input)?;
    reject_invalid_inputs(&input)?;

    let struct_ident = &input.ident;
    let fields = input
        .data
        .take_struct()
        // Other shapes are rejected by `darling`.
        .expect("`Destination` only supports structs with named fields.");

    let declarations = fields.iter().map(|field| {
        let name = field.ident.unraw().to_string();
        let visible = matches!(field.vis, Visibility::Public(_));
        let annotations = field
            .annotations
            .iter()
            .map(|(namespace, directive)| quote! { (#namespace, #directive) });
        quote! {
            ::formbind::fields::FieldDecl {
                name: #name,
                visible: #visible,
                annotations: &[#(#annotations),*],
            }
        }
    });

    let accessors = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_bindable())
        .map(|(index, field)| {
            let index = Literal::usize_unsuffixed(index);
            let field_ident = &field.ident;
            let ty_span = field.ty.span();
            quote_spanned! { ty_span =>
                #index => ::core::option::Option::Some(&mut self.#field_ident as &mut dyn ::formbind::coerce::Bind)
            }
        });

    let zero_checks = fields
        .iter()
        .filter(|field| field.is_bindable())
        .map(|field| {
            let field_ident = &field.ident;
            quote! { ::formbind::coerce::Bind::is_zero(&self.#field_ident) }
        });

    Ok(quote! {
        impl ::formbind::fields::Destination for #struct_ident {
            fn declared_fields() -> &'static [::formbind::fields::FieldDecl] {
                const FIELDS: &[::formbind::fields::FieldDecl] = &[#(#declarations),*];
                FIELDS
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::formbind::coerce::Bind> {
                match index {
                    #(#accessors,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        // Records can't be nested inside other records.
        impl ::formbind::coerce::Bind for #struct_ident {
            fn slot(&mut self) -> ::formbind::coerce::Slot<'_> {
                ::formbind::coerce::Slot::Unsupported(::core::any::type_name::<Self>())
            }

            // A record is unset when none of its bindable fields holds a value.
            fn is_zero(&self) -> bool {
                true #(&& #zero_checks)*
            }
        }
    })
}

fn reject_invalid_inputs(input: &DestinationInput) -> Result<(), darling::Error> {
    let struct_ident = &input.ident;
    if let Some(generic) = input.generics.type_params().next() {
        return Err(darling::Error::custom(format!(
            "`#[derive(Destination)]` can't be applied to structs with generic type parameters, such as `{struct_ident}`.\n\n\
            help: Consider using concrete types instead.",
        ))
        .with_span(generic));
    }
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(darling::Error::custom(format!(
            "`#[derive(Destination)]` can't be applied to structs with generic lifetimes, such as `{struct_ident}`.\n\n\
            help: Destinations must own their data.",
        ))
        .with_span(lifetime));
    }
    if let Some(param) = input.generics.const_params().next() {
        return Err(darling::Error::custom(format!(
            "`#[derive(Destination)]` can't be applied to structs with const generic parameters, such as `{struct_ident}`.",
        ))
        .with_span(param));
    }
    Ok(())
}
