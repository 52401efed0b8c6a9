use proc_macro::TokenStream;

mod destination;

#[proc_macro_derive(Destination, attributes(bind))]
pub fn derive_destination(input: TokenStream) -> TokenStream {
    destination::derive_destination(input)
}
