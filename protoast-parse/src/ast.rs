//! The raw syntax tree produced by [`parse()`](crate::parse).
//!
//! Nodes keep the structure of the source file: every container holds an ordered list of
//! [`Element`]s, and type references are kept as written. Resolution happens elsewhere.

use std::fmt::{self, Write};

pub use logos::Span;

/// A parsed protobuf source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    /// The top-level statements, in source order.
    pub elements: Vec<Element>,
}

/// Any statement which may appear in a file or in the body of a definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `syntax = "proto3";`
    Syntax(Syntax),
    /// `package foo.bar;`
    Package(Package),
    /// `import "foo.proto";`
    Import(Import),
    /// `option foo = 1;`
    Option(OptionDef),
    /// A `message` or `extend` block.
    Message(Message),
    /// `enum Foo { ... }`
    Enum(Enum),
    /// A value inside an enum.
    EnumField(EnumField),
    /// A plain message field.
    NormalField(NormalField),
    /// A `map<K, V>` field.
    MapField(MapField),
    /// `oneof foo { ... }`
    Oneof(Oneof),
    /// A field inside a oneof.
    OneofField(OneofField),
    /// `service Foo { ... }`
    Service(Service),
    /// An `rpc` inside a service.
    Rpc(Rpc),
    /// `reserved 1, 2 to 5;` or `reserved "foo";`
    Reserved(Reserved),
    /// `extensions 100 to max;`
    Extensions(Extensions),
    /// A proto2 `group` field.
    Group(Group),
    /// A comment which is not attached to any declaration.
    Comment(Comment),
}

/// An identifier and its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    /// The identifier text.
    pub value: String,
    /// The location of the identifier.
    pub span: Span,
}

/// A possibly-qualified type name, such as `.foo.Bar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// The location of the leading dot, if the name is fully qualified.
    pub leading_dot: Option<Span>,
    /// The dot-separated name components.
    pub parts: Vec<Ident>,
}

/// A comment block. Consecutive `//` lines form a single comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The comment text with comment markers removed, one entry per source line.
    pub lines: Vec<String>,
    /// The location of the whole comment.
    pub span: Span,
}

/// `syntax = "proto3";`
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    /// The syntax version, `proto2` or `proto3`.
    pub value: String,
    /// The location of the version string.
    pub value_span: Span,
    /// The location of the statement.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `package foo.bar;`
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// The package name.
    pub name: TypeName,
    /// The location of the statement.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// The modifier of an import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import weak`
    Weak,
    /// `import public`
    Public,
}

/// `import "foo.proto";`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// The `weak` or `public` modifier.
    pub kind: Option<ImportKind>,
    /// The imported file name.
    pub path: String,
    /// The location of the imported file name.
    pub path_span: Span,
    /// The location of the statement.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// An option, either as a statement or inside a `[...]` list.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    /// The option name as written, without whitespace, e.g. `(foo.bar).baz`.
    pub name: String,
    /// The location of the option name.
    pub name_span: Span,
    /// The option value.
    pub value: Literal,
    /// The location of the option.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// The value.
    pub kind: LiteralKind,
    /// The location of the value.
    pub span: Span,
}

/// The different kinds of constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    /// An identifier or dotted name, such as `true` or `SPEED`.
    Ident(String),
    /// An integer.
    Int {
        /// Whether the integer was preceded by `-`.
        negative: bool,
        /// The magnitude.
        value: u64,
    },
    /// A floating point number.
    Float(f64),
    /// A string, with adjacent string literals concatenated.
    String(String),
    /// A `[a, b, c]` list.
    Array(Vec<Literal>),
    /// A `{ key: value }` aggregate.
    Map(Vec<MapEntry>),
}

/// A `key: value` entry of an aggregate literal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// The entry key.
    pub name: Ident,
    /// The entry value.
    pub value: Literal,
    /// The location of the entry.
    pub span: Span,
}

/// A `message` or `extend` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The message name, or the extended type name for `extend` blocks.
    pub name: String,
    /// The location of the name.
    pub name_span: Span,
    /// Whether this is an `extend` block.
    pub is_extend: bool,
    /// The body of the message.
    pub elements: Vec<Element>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `enum Foo { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// The enum name.
    pub name: Ident,
    /// Values, options and reserved statements.
    pub elements: Vec<Element>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `FOO = 1;`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumField {
    /// The value name.
    pub name: Ident,
    /// The numeric value.
    pub value: i32,
    /// The location of the numeric value.
    pub value_span: Span,
    /// Options in the `[...]` list.
    pub options: Vec<OptionDef>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// The label of a message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    /// `optional`
    Optional,
    /// `required`
    Required,
    /// `repeated`
    Repeated,
}

/// `repeated Foo foo = 1;`
#[derive(Debug, Clone, PartialEq)]
pub struct NormalField {
    /// The field labels, in source order. `repeated optional` is allowed.
    pub labels: Vec<FieldLabel>,
    /// The field type as written.
    pub ty: TypeName,
    /// The field name.
    pub name: Ident,
    /// The field number.
    pub number: i32,
    /// The location of the field number.
    pub number_span: Span,
    /// Options in the `[...]` list.
    pub options: Vec<OptionDef>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

impl NormalField {
    /// Whether the field is labelled `optional`.
    pub fn is_optional(&self) -> bool {
        self.labels.contains(&FieldLabel::Optional)
    }

    /// Whether the field is labelled `repeated`.
    pub fn is_repeated(&self) -> bool {
        self.labels.contains(&FieldLabel::Repeated)
    }
}

/// `map<string, Foo> foo = 1;`
#[derive(Debug, Clone, PartialEq)]
pub struct MapField {
    /// The key type as written.
    pub key_ty: TypeName,
    /// The value type as written.
    pub value_ty: TypeName,
    /// The field name.
    pub name: Ident,
    /// The field number.
    pub number: i32,
    /// The location of the field number.
    pub number_span: Span,
    /// Options in the `[...]` list.
    pub options: Vec<OptionDef>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `oneof foo { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Oneof {
    /// The oneof name.
    pub name: Ident,
    /// Fields and options.
    pub elements: Vec<Element>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// A field inside a oneof.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofField {
    /// The field type as written.
    pub ty: TypeName,
    /// The field name.
    pub name: Ident,
    /// The field number.
    pub number: i32,
    /// The location of the field number.
    pub number_span: Span,
    /// Options in the `[...]` list.
    pub options: Vec<OptionDef>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `service Foo { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// The service name.
    pub name: Ident,
    /// Methods and options.
    pub elements: Vec<Element>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `rpc Foo(Request) returns (stream Response);`
#[derive(Debug, Clone, PartialEq)]
pub struct Rpc {
    /// The method name.
    pub name: Ident,
    /// The request type as written.
    pub input_ty: TypeName,
    /// Whether the request is marked `stream`.
    pub client_streaming: bool,
    /// The response type as written.
    pub output_ty: TypeName,
    /// Whether the response is marked `stream`.
    pub server_streaming: bool,
    /// Options in the method body.
    pub options: Vec<OptionDef>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `reserved ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct Reserved {
    /// The reserved numbers or names.
    pub kind: ReservedKind,
    /// The location of the statement.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// The contents of a `reserved` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservedKind {
    /// Reserved field numbers.
    Ranges(Vec<ReservedRange>),
    /// Reserved field names.
    Names(Vec<Ident>),
}

/// `1`, `2 to 5` or `10 to max`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedRange {
    /// The first number in the range.
    pub start: i32,
    /// The end of the range.
    pub end: ReservedRangeEnd,
    /// The location of the range.
    pub span: Span,
}

/// The upper bound of a [`ReservedRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedRangeEnd {
    /// A single number.
    None,
    /// An inclusive upper bound.
    Int(i32),
    /// `max`
    Max,
}

/// `extensions 100 to 199;`
#[derive(Debug, Clone, PartialEq)]
pub struct Extensions {
    /// The extension number ranges.
    pub ranges: Vec<ReservedRange>,
    /// Options in the `[...]` list.
    pub options: Vec<OptionDef>,
    /// The location of the statement.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

/// `optional group Foo = 1 { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// The field labels, in source order.
    pub labels: Vec<FieldLabel>,
    /// The group name.
    pub name: Ident,
    /// The field number.
    pub number: i32,
    /// The location of the field number.
    pub number_span: Span,
    /// The body of the group.
    pub elements: Vec<Element>,
    /// The location of the definition.
    pub span: Span,
    /// The leading comment, if any.
    pub comment: Option<Comment>,
}

impl Ident {
    pub(crate) fn new(value: impl Into<String>, span: Span) -> Self {
        Ident {
            value: value.into(),
            span,
        }
    }
}

impl TypeName {
    /// The location of the whole name.
    pub fn span(&self) -> Span {
        let start = match &self.leading_dot {
            Some(dot) => dot.start,
            None => self.parts.first().map_or(0, |part| part.span.start),
        };
        let end = self.parts.last().map_or(start, |part| part.span.end);
        start..end
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.leading_dot.is_some() {
            f.write_char('.')?;
        }
        for (index, part) in self.parts.iter().enumerate() {
            if index != 0 {
                f.write_char('.')?;
            }
            f.write_str(&part.value)?;
        }
        Ok(())
    }
}

impl Comment {
    /// The comment lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LiteralKind::Ident(value) => f.write_str(value),
            LiteralKind::Int { negative, value } => {
                if *negative {
                    f.write_char('-')?;
                }
                write!(f, "{}", value)
            }
            LiteralKind::Float(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    write!(f, "{:.1}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            LiteralKind::String(value) => {
                f.write_char('"')?;
                for ch in value.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        ch => f.write_char(ch)?,
                    }
                }
                f.write_char('"')
            }
            LiteralKind::Array(values) => {
                f.write_char('[')?;
                for (index, value) in values.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_char(']')
            }
            LiteralKind::Map(entries) => {
                if entries.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (index, entry) in entries.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.name.value, entry.value)?;
                }
                f.write_str(" }")
            }
        }
    }
}
