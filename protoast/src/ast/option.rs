use std::fmt;

use indexmap::IndexMap;

use super::{Ast, EnumValueId, ExtensionId, ValueId};

/// The kind of declaration an option is attached to.
///
/// Each category corresponds to one of the `google.protobuf.*Options` messages, which custom
/// options extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OptionCategory {
    File,
    Message,
    Field,
    Oneof,
    Enum,
    EnumValue,
    Service,
    Method,
}

impl OptionCategory {
    /// The full name of the options message extended by options of this category.
    pub fn extendee(self) -> &'static str {
        match self {
            OptionCategory::File => "google.protobuf.FileOptions",
            OptionCategory::Message => "google.protobuf.MessageOptions",
            OptionCategory::Field => "google.protobuf.FieldOptions",
            OptionCategory::Oneof => "google.protobuf.OneofOptions",
            OptionCategory::Enum => "google.protobuf.EnumOptions",
            OptionCategory::EnumValue => "google.protobuf.EnumValueOptions",
            OptionCategory::Service => "google.protobuf.ServiceOptions",
            OptionCategory::Method => "google.protobuf.MethodOptions",
        }
    }
}

impl fmt::Display for OptionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extendee())
    }
}

/// An `option` statement or a `[...]` option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    /// The option name with brackets removed, e.g. `common.v1.log.level`.
    pub name: String,
    /// The declaration kind the option is attached to.
    pub category: OptionCategory,
    /// The extension declaring the option. `None` for built-in options.
    pub extension: Option<ExtensionId>,
    /// The value, or `None` if it could not be converted to the option's type.
    pub value: Option<ValueId>,
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// The literal source text, for options without a declared type.
    Embedded(String),
    /// A value of an enum-typed option.
    Enum(EnumValueId),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// A boolean.
    Bool(bool),
    /// A list of values.
    Array(Vec<ValueId>),
    /// An aggregate value, keyed by field name in source order.
    Map(IndexMap<String, ValueId>),
}

impl OptionValue {
    /// Returns a value which formats this value for display.
    pub fn display<'a>(&'a self, ast: &'a Ast) -> impl fmt::Display + 'a {
        ValueDisplay { value: self, ast }
    }
}

struct ValueDisplay<'a> {
    value: &'a OptionValue,
    ast: &'a Ast,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            OptionValue::Embedded(source) => f.write_str(source),
            OptionValue::Enum(id) => f.write_str(&self.ast[*id].name),
            OptionValue::Int(value) => write!(f, "{}", value),
            OptionValue::Uint(value) => write!(f, "{}", value),
            OptionValue::Float(value) => write!(f, "{}", value),
            OptionValue::String(value) => write!(f, "{:?}", value),
            OptionValue::Bool(value) => write!(f, "{}", value),
            OptionValue::Array(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.ast[*value].display(self.ast))?;
                }
                f.write_str("]")
            }
            OptionValue::Map(entries) => {
                if entries.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (index, (name, value)) in entries.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, self.ast[*value].display(self.ast))?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// An option of an `rpc` method.
///
/// Method annotations are usually shallow key/value structs, so aggregate values are also kept
/// as flat name/value pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOption {
    /// The option name with brackets removed.
    pub name: String,
    /// The extension declaring the option. `None` for built-in options.
    pub extension: Option<ExtensionId>,
    /// The entries of an aggregate value, in source order.
    pub values: Vec<MethodOptionValue>,
    /// The typed value, or `None` if it could not be converted to the option's type.
    pub value: Option<ValueId>,
}

/// A `name: value` entry of an aggregate method option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodOptionValue {
    /// The entry name.
    pub name: String,
    /// The entry value as written. String values are unquoted.
    pub value: String,
}
