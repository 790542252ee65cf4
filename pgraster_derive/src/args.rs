use proc_macro2::TokenStream as TokenStream2;
use syn::{
	Token,
	parse::{self, Parse, ParseStream},
};

/// Parsed arguments of `#[context(...)]`: an optional `move,` prefix followed
/// by the `format!` arguments of the context message.
#[derive(Debug)]
pub struct ContextArgs {
	pub move_token: Option<Token![move]>,
	pub message: TokenStream2,
}

impl Parse for ContextArgs {
	fn parse(input: ParseStream<'_>) -> parse::Result<Self> {
		let move_token = if input.peek(Token![move]) {
			let token = input.parse()?;
			input.parse::<Token![,]>()?;
			Some(token)
		} else {
			None
		};
		let message: TokenStream2 = input.parse()?;
		if message.is_empty() {
			return Err(input.error("expected a context message"));
		}
		Ok(Self { move_token, message })
	}
}

#[cfg(test)]
mod tests {
	use super::ContextArgs;
	use syn::parse_str;

	#[test]
	fn plain_message() {
		let args: ContextArgs = parse_str(r#""reading block {}", key"#).unwrap();
		assert!(args.move_token.is_none());
		assert_eq!(args.message.to_string(), r#""reading block {}" , key"#);
	}

	#[test]
	fn message_with_move() {
		let args: ContextArgs = parse_str(r#"move, "opening {}", name"#).unwrap();
		assert!(args.move_token.is_some());
		assert_eq!(args.message.to_string(), r#""opening {}" , name"#);
	}

	#[test]
	fn move_without_comma_fails() {
		let err = parse_str::<ContextArgs>(r#"move "opening""#).unwrap_err();
		assert!(err.to_string().contains(','), "unexpected error: {err}");
	}

	#[test]
	fn empty_message_fails() {
		let err = parse_str::<ContextArgs>("").unwrap_err();
		assert!(err.to_string().contains("context message"), "unexpected error: {err}");
	}
}
