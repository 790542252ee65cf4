use crate::args::ContextArgs;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::{ToTokens, quote};
use syn::{Expr, ItemFn, ReturnType, Stmt};

/// Rewrites the body of `function` so that its error is wrapped with the
/// formatted context message.
///
/// Async functions await the original body inside an `async` block; sync
/// functions run it inside an immediately called closure. Both then map the
/// error through `anyhow::Error::context`.
pub fn expand(args: &ContextArgs, mut function: ItemFn) -> syn::Result<TokenStream2> {
	let ContextArgs { move_token, message } = args;
	let body = &function.block;
	let err = Ident::new("err", Span::mixed_site());

	let return_type = match &function.sig.output {
		ReturnType::Default => {
			return Err(syn::Error::new_spanned(
				&function.sig,
				"#[context] requires a function returning Result",
			));
		}
		ReturnType::Type(_, ty) => ty.clone(),
	};

	let wrapped = if function.sig.asyncness.is_some() {
		let result = Ident::new("result", Span::mixed_site());
		quote! {
			let #result: #return_type = async #move_token { #body }.await;
			#result.map_err(|#err| #err.context(format!(#message)).into())
		}
	} else {
		let once = Ident::new("once", Span::mixed_site());
		quote! {
			// a non-Copy value moved into the closure makes it FnOnce
			let #once = ::core::iter::empty::<()>();
			(#move_token || -> #return_type {
				::core::mem::drop(#once);
				#body
			})().map_err(|#err| #err.context(format!(#message)).into())
		}
	};

	function.block.stmts = vec![Stmt::Expr(Expr::Verbatim(wrapped), None)];
	Ok(function.into_token_stream())
}

#[cfg(test)]
mod tests {
	use super::*;
	use syn::parse_str;

	fn render(args: &str, function: &str) -> syn::Result<String> {
		let args: ContextArgs = parse_str(args)?;
		let function: ItemFn = parse_str(function)?;
		let tokens = expand(&args, function)?;
		let file: syn::File = syn::parse2(tokens)?;
		Ok(prettyplease::unparse(&file).split_whitespace().collect())
	}

	#[test]
	fn sync_function_runs_body_in_closure() {
		let code = render(
			r#""decoding band {}", index"#,
			"fn decode(index: usize) -> anyhow::Result<u8> { Ok(1) }",
		)
		.unwrap();
		assert!(code.contains("fndecode(index:usize)->anyhow::Result<u8>"), "{code}");
		assert!(code.contains("||->anyhow::Result<u8>"), "{code}");
		assert!(code.contains(r#".context(format!("decodingband{}",index))"#), "{code}");
		assert!(!code.contains(".await"), "{code}");
	}

	#[test]
	fn async_function_awaits_body() {
		let code = render(
			r#"move, "querying {}", table"#,
			"async fn query(table: String) -> anyhow::Result<()> { Ok(()) }",
		)
		.unwrap();
		assert!(code.contains("asyncmove{"), "{code}");
		assert!(code.contains(".await"), "{code}");
		assert!(code.contains(r#".context(format!("querying{}",table))"#), "{code}");
	}

	#[test]
	fn function_without_result_is_rejected() {
		let err = render(r#""nothing""#, "fn nothing() {}").unwrap_err();
		assert!(err.to_string().contains("returning Result"), "{err}");
	}
}
