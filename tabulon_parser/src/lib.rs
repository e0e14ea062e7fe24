//! This crate parses spreadsheet formula text into a raw expression tree.
//!
//! The grammar covers infix arithmetic over `+ - * /` with unary signs,
//! parentheses, numeric literals and A1-style cell names. The parser makes
//! no judgement about whether a cell name is in range for any particular
//! sheet; that is the engine's concern.
//!
//! ## Example
//! ```
//! use tabulon_parser::raw_parser::*;
//!
//! let parsed = parse_formula_text("1+B2*3");
//!
//! assert_eq!(parsed.unwrap(),
//!     Expression::Add(
//!         Box::new(Expression::Literal("1".to_string())),
//!         Box::new(Expression::Multiply(
//!             Box::new(Expression::Cell("B2".to_string())),
//!             Box::new(Expression::Literal("3".to_string()))
//!         ))
//!     )
//! );
//! ```

pub mod raw_parser;
