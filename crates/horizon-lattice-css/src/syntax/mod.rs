//! CSS syntax layer: character scanners, tokens, tokenizer and serializer.
//!
//! ```
//! use horizon_lattice_css::syntax::{from_token, tokenize, TokenKind};
//!
//! let tokens = tokenize("10px");
//! assert_eq!(tokens[0].kind(), TokenKind::Dimension);
//! assert_eq!(from_token(&tokens[0]), "10px");
//! ```

mod scanner;
mod serialize;
mod token;
mod tokenizer;

pub use scanner::{CharScanner, REPLACEMENT_CHARACTER, ReaderScanner, StrScanner};
pub use serialize::{escape_ident, format_number, from_token, serialize_tokens};
pub use token::{Span, Token, TokenKind};
pub use tokenizer::{Tokenizer, tokenize};
