//! Value tree and path addressing for **Prism** resource payloads.
//!
//! This crate is intentionally dependency-free so it can be consumed by
//! payload editors and tooling without pulling in any engine or GPU code.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`value`] | `Value` and path-addressed `get` / `get_mut` / `set` |
//! | [`path`] | `Path`, `Segment`, `ToPath` |
//! | [`error`] | `PathError` |
//! | [`lexer`] | `Lexer`, `Token` |
//! | [`parser`] | `parse_path` entry point |
//!
//! # Path grammar
//!
//! ```text
//! path    := segment ('.' segment)*
//! segment := ident ('[' digits ']')*
//! ident   := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! Keys are never created by `set`. An index equal to the sequence length is
//! accepted only as the final segment of a `set`, and appends.
//!
//! # Quick start
//!
//! ```rust
//! use prism_value::Value;
//!
//! let mut lights = Value::object([(
//!     "u_Lights",
//!     Value::array([Value::object([
//!         ("direction", Value::from([0.0, 0.0, 1.0])),
//!         ("strength", Value::from(1.0)),
//!     ])]),
//! )]);
//!
//! lights.set("u_Lights[0].strength", Value::from(0.5)).unwrap();
//! assert_eq!(lights.get("u_Lights[0].strength").unwrap(), &Value::from(0.5));
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod value;

pub use error::PathError;
pub use parser::parse_path;
pub use path::{Path, Segment, ToPath};
pub use value::Value;

#[cfg(test)]
mod path_tests {
    use super::*;

    fn ok(src: &str) -> Vec<Segment> { parse_path(src).unwrap().segments().to_vec() }
    fn err(src: &str) -> PathError { parse_path(src).unwrap_err() }
    fn field(s: &str) -> Segment { Segment::Field(s.to_string()) }

    #[test] fn single_field() { assert_eq!(ok("u_Camera"), vec![field("u_Camera")]); }
    #[test] fn nested_fields() { assert_eq!(ok("a.b_2.c"), vec![field("a"), field("b_2"), field("c")]); }
    #[test] fn indexed_field() {
        assert_eq!(ok("u_Lights[0].color"), vec![field("u_Lights"), Segment::Index(0), field("color")]);
    }
    #[test] fn multiple_indices() {
        assert_eq!(ok("grid[3][12]"), vec![field("grid"), Segment::Index(3), Segment::Index(12)]);
    }
    #[test] fn leading_underscore() { assert_eq!(ok("_x"), vec![field("_x")]); }
    #[test] fn display_keeps_source() { assert_eq!(parse_path("a[1].b").unwrap().to_string(), "a[1].b"); }
    #[test] fn from_segments_renders_canonically() {
        let p = Path::from_segments(vec![field("a"), Segment::Index(2), field("b")]);
        assert_eq!(p.as_str(), "a[2].b");
    }

    fn assert_syntax(e: PathError, at: usize) {
        match e {
            PathError::Syntax { offset, .. } => assert_eq!(offset, at),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test] fn err_empty() { assert_syntax(err(""), 0); }
    #[test] fn err_trailing_bracket() { assert_syntax(err("u_Lights[0].color]"), 17); }
    #[test] fn err_leading_digit() { assert_syntax(err("0abc"), 0); }
    #[test] fn err_leading_index() { assert_syntax(err("[0]"), 0); }
    #[test] fn err_trailing_dot() { assert_syntax(err("a."), 2); }
    #[test] fn err_double_dot() { assert_syntax(err("a..b"), 2); }
    #[test] fn err_unclosed_index() { assert_syntax(err("a[1"), 3); }
    #[test] fn err_negative_index() { assert_syntax(err("a[-1]"), 2); }
    #[test] fn err_empty_index() { assert_syntax(err("a[]"), 2); }
    #[test] fn err_whitespace() { assert_syntax(err("a. b"), 2); }
    #[test] fn err_index_overflow() { assert_syntax(err("a[99999999999999999999999]"), 2); }
}
