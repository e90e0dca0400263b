use std::fmt;

use super::{Ast, BranchId, EnumId, FieldId, FileId, MessageId, OneofId, OptionId};

/// A built-in scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Scalar {
    Bool,
    Bytes,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    String,
}

impl Scalar {
    /// Looks up a scalar type by its keyword.
    pub fn from_name(name: &str) -> Option<Scalar> {
        Some(match name {
            "bool" => Scalar::Bool,
            "bytes" => Scalar::Bytes,
            "int32" => Scalar::Int32,
            "int64" => Scalar::Int64,
            "uint32" => Scalar::Uint32,
            "uint64" => Scalar::Uint64,
            "sint32" => Scalar::Sint32,
            "sint64" => Scalar::Sint64,
            "fixed32" => Scalar::Fixed32,
            "fixed64" => Scalar::Fixed64,
            "sfixed32" => Scalar::Sfixed32,
            "sfixed64" => Scalar::Sfixed64,
            "float" => Scalar::Float,
            "double" => Scalar::Double,
            "string" => Scalar::String,
            _ => return None,
        })
    }

    /// The keyword for this type.
    pub fn name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Bytes => "bytes",
            Scalar::Int32 => "int32",
            Scalar::Int64 => "int64",
            Scalar::Uint32 => "uint32",
            Scalar::Uint64 => "uint64",
            Scalar::Sint32 => "sint32",
            Scalar::Sint64 => "sint64",
            Scalar::Fixed32 => "fixed32",
            Scalar::Fixed64 => "fixed64",
            Scalar::Sfixed32 => "sfixed32",
            Scalar::Sfixed64 => "sfixed64",
            Scalar::Float => "float",
            Scalar::Double => "double",
            Scalar::String => "string",
        }
    }

    /// Whether the type may be used as a map key.
    pub fn is_hashable(self) -> bool {
        !matches!(
            self,
            Scalar::Bool | Scalar::Bytes | Scalar::Float | Scalar::Double
        )
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type which may be used as a map key: any integer type, or `string`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hashable(Scalar);

impl Hashable {
    /// Returns `None` if `scalar` cannot be used as a map key.
    pub fn new(scalar: Scalar) -> Option<Self> {
        if scalar.is_hashable() {
            Some(Hashable(scalar))
        } else {
            None
        }
    }

    /// The underlying scalar type.
    pub fn scalar(self) -> Scalar {
        self.0
    }
}

impl fmt::Display for Hashable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user-defined type: a message or an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedType {
    /// A message.
    Message(MessageId),
    /// An enum.
    Enum(EnumId),
}

impl NamedType {
    /// The kind of type, for use in messages.
    pub fn kind(self) -> &'static str {
        match self {
            NamedType::Message(_) => "message",
            NamedType::Enum(_) => "enum",
        }
    }

    /// The local name of the type.
    pub fn name(self, ast: &Ast) -> &str {
        match self {
            NamedType::Message(id) => &ast[id].name,
            NamedType::Enum(id) => &ast[id].name,
        }
    }
}

impl From<NamedType> for Type {
    fn from(ty: NamedType) -> Self {
        match ty {
            NamedType::Message(id) => Type::Message(id),
            NamedType::Enum(id) => Type::Enum(id),
        }
    }
}

/// The type of a field or a method argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A built-in scalar.
    Scalar(Scalar),
    /// `google.protobuf.Any`, declared by the given file.
    Any(FileId),
    /// A message.
    Message(MessageId),
    /// An enum.
    Enum(EnumId),
    /// A `map<K, V>` field.
    Map {
        /// The key type.
        key: Hashable,
        /// The value type.
        value: Box<Type>,
    },
    /// A `repeated` field.
    Repeated(Box<Type>),
    /// An `optional` field.
    Optional(Box<Type>),
    /// The synthetic field standing for a `oneof` in its message's field list.
    OneOf(OneofId),
    /// A streamed method argument.
    Stream(Box<Type>),
}

impl Type {
    /// Strips `optional`, `repeated` and `stream` wrappers.
    pub fn strip_wrappers(&self) -> &Type {
        match self {
            Type::Repeated(inner) | Type::Optional(inner) | Type::Stream(inner) => {
                inner.strip_wrappers()
            }
            ty => ty,
        }
    }

    /// The message this type refers to, looking through `optional`, `repeated` and `stream`.
    pub fn as_message(&self) -> Option<MessageId> {
        match self.strip_wrappers() {
            Type::Message(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns a value which formats this type for display.
    pub fn display<'a>(&'a self, ast: &'a Ast) -> impl fmt::Display + 'a {
        TypeDisplay { ty: self, ast }
    }
}

struct TypeDisplay<'a> {
    ty: &'a Type,
    ast: &'a Ast,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Type::Scalar(scalar) => scalar.fmt(f),
            Type::Any(_) => f.write_str("google.protobuf.Any"),
            Type::Message(id) => f.write_str(&self.ast.full_name(NamedType::Message(*id))),
            Type::Enum(id) => f.write_str(&self.ast.full_name(NamedType::Enum(*id))),
            Type::Map { key, value } => write!(f, "map[{}]{}", key, value.display(self.ast)),
            Type::Repeated(inner) => write!(f, "repeated {}", inner.display(self.ast)),
            Type::Optional(inner) => write!(f, "optional {}", inner.display(self.ast)),
            Type::OneOf(id) => write!(f, "oneof {}", self.ast[*id].name),
            Type::Stream(inner) => write!(f, "stream {}", inner.display(self.ast)),
        }
    }
}

/// A reference to either a plain message field or a oneof branch.
///
/// Both expose a name, a type, options and a field number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// A field declared directly in a message.
    Plain(FieldId),
    /// A field declared inside a oneof.
    Branch(BranchId),
}

impl FieldRef {
    /// The field name.
    pub fn name(self, ast: &Ast) -> &str {
        match self {
            FieldRef::Plain(id) => &ast[id].name,
            FieldRef::Branch(id) => &ast[id].name,
        }
    }

    /// The field type.
    pub fn ty(self, ast: &Ast) -> &Type {
        match self {
            FieldRef::Plain(id) => &ast[id].ty,
            FieldRef::Branch(id) => &ast[id].ty,
        }
    }

    /// The options attached to the field.
    pub fn options(self, ast: &Ast) -> &[OptionId] {
        match self {
            FieldRef::Plain(id) => &ast[id].options,
            FieldRef::Branch(id) => &ast[id].options,
        }
    }

    /// The field number. The synthetic field of a oneof has number `-1`.
    pub fn sequence(self, ast: &Ast) -> i32 {
        match self {
            FieldRef::Plain(id) => ast[id].sequence,
            FieldRef::Branch(id) => ast[id].sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashable_scalars() {
        for name in [
            "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32", "fixed64",
            "sfixed32", "sfixed64", "string",
        ] {
            let scalar = Scalar::from_name(name).unwrap();
            assert_eq!(scalar.name(), name);
            assert_eq!(Hashable::new(scalar).map(Hashable::scalar), Some(scalar));
        }

        for name in ["bool", "bytes", "float", "double"] {
            assert_eq!(Hashable::new(Scalar::from_name(name).unwrap()), None);
        }

        assert_eq!(Scalar::from_name("Foo"), None);
        assert_eq!(Scalar::from_name("google.protobuf.Any"), None);
    }

    #[test]
    fn strip_nested_wrappers() {
        let ty = Type::Repeated(Box::new(Type::Optional(Box::new(Type::Scalar(
            Scalar::String,
        )))));
        assert_eq!(ty.strip_wrappers(), &Type::Scalar(Scalar::String));
        assert_eq!(ty.as_message(), None);
    }

    #[test]
    fn display_map() {
        let ast = Ast::default();
        let ty = Type::Map {
            key: Hashable::new(Scalar::String).unwrap(),
            value: Box::new(Type::Repeated(Box::new(Type::Scalar(Scalar::Int32)))),
        };
        assert_eq!(ty.display(&ast).to_string(), "map[string]repeated int32");
    }
}
