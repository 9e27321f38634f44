//! A small Lisp: an S-expression reader, a printer and a tree-walking
//! evaluator over shared, lexically scoped environments.
//!
//! The whole pipeline is three calls:
//!
//! ```
//! use conslisp::{eval, new_global_environment, parse, print};
//!
//! let env = new_global_environment();
//! eval(&parse("(define square (x) (mul x x))"), &env);
//! assert_eq!(print(&eval(&parse("(square 5)"), &env)), "25");
//! ```

// Declare modules publicly so they are part of the library interface
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
mod pretty_print;
pub mod primitives;
pub mod session;
pub mod source;
pub mod types;

pub use environment::{Environment, new_global_environment};
pub use evaluator::{Fault, eval};
pub use lexer::{LexerError, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse, read_str};
pub use session::Session;
pub use source::Span;
pub use types::{Sexpr, print};
