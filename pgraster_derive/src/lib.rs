//! Attribute macros shared by the pgraster crates.
//!
//! `#[context("...")]` wraps the error of a fallible function with a formatted
//! message, so every query or decode step reports where it failed:
//!
//! ```ignore
//! #[context("counting rows of {}", selector)]
//! async fn count(selector: &SourceSelector) -> Result<u64> { ... }
//! ```
//!
//! The arguments are `format!` arguments. A leading `move,` turns the wrapped
//! body into a `move` closure or `async move` block.

extern crate proc_macro;

mod args;
mod context;

use proc_macro::TokenStream;
use syn::parse_macro_input;

#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = parse_macro_input!(args as args::ContextArgs);
	let function = parse_macro_input!(input as syn::ItemFn);

	match context::expand(&args, function) {
		Ok(tokens) => tokens.into(),
		Err(err) => err.to_compile_error().into(),
	}
}
