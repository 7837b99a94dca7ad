#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Not an issue in a macro crate"
)]
//! Procedural macro turning a string-form SID into its binary layout at compile time.
mod expand;
use expand::binary_sid_impl;
use proc_macro::TokenStream;

use syn::{LitStr, parse_macro_input};

/// Expands `binary_sid!("S-1-5-21-1-2-3-1105")` into a `[u8; 8 + 4 * N]` array
/// literal holding the binary SID, as a directory would return it in `objectSid`.
///
/// Invalid SID strings are reported as compile errors.
#[proc_macro]
pub fn binary_sid(input: TokenStream) -> TokenStream {
    let lit = parse_macro_input!(input as LitStr);
    match binary_sid_impl(&lit) {
        Ok(token_stream) => token_stream,
        Err(err) => err.to_compile_error(),
    }
    .into()
}
