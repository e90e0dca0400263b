//! Parsing of protobuf source files into a raw syntax tree.
//!
//! See the documentation for [`parse()`] for details.
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/protoast-parse/0.1.0/")]

pub mod ast;
mod error;
mod lex;
mod parse;
#[cfg(test)]
mod tests;
mod visit;

pub use self::error::ParseError;
pub use self::visit::Visitor;

/// The largest field number a message may declare.
pub const MAX_MESSAGE_FIELD_NUMBER: i32 = 536_870_911;

const MAX_FILE_LEN: usize = i32::MAX as usize;

/// Parses a protobuf source file into a raw syntax tree.
///
/// Names are not resolved and no semantic checks are done beyond what the grammar requires. All
/// syntax errors in the file are collected: the first is the primary diagnostic of the returned
/// [`ParseError`] and the rest are attached as related diagnostics.
///
/// The `name` is only used in diagnostics.
///
/// # Examples
///
/// ```
/// # use protoast_parse::{ast, parse};
/// let source = r#"
///     syntax = "proto3";
///
///     // A greeting.
///     message Foo {
///         string name = 1;
///     }
/// "#;
/// let file = parse("foo.proto", source).unwrap();
///
/// assert_eq!(file.elements.len(), 2);
/// match &file.elements[1] {
///     ast::Element::Message(message) => {
///         assert_eq!(message.name, "Foo");
///         assert_eq!(message.comment.as_ref().unwrap().text(), " A greeting.");
///     }
///     _ => panic!("expected a message"),
/// }
///
/// let err = parse("bar.proto", "message Foo { int32 bar = 0; }").unwrap_err();
/// assert_eq!(
///     format!("{:?}", err),
///     "bar.proto:1:27: message numbers must be between 1 and 536870911"
/// );
/// ```
pub fn parse(name: &str, source: &str) -> Result<ast::File, ParseError> {
    if source.len() > MAX_FILE_LEN {
        return Err(ParseError::new(
            vec![error::ParseErrorKind::FileTooLarge],
            name,
            String::new(),
        ));
    }

    let mut parser = parse::Parser::new(source);
    let file = parser.parse_file();
    let errors = parser.into_errors();
    if errors.is_empty() {
        Ok(file)
    } else {
        Err(ParseError::new(errors, name, source.to_owned()))
    }
}
