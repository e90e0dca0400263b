//! The resolved syntax tree.
//!
//! Every node lives in an [`Ast`] store and is referred to by a typed index, such as
//! [`MessageId`]. Indexing the store with an id yields the node:
//!
//! ```
//! # use protoast::{Builder, ast::NamedType};
//! # let dir = tempfile::tempdir().unwrap();
//! # std::fs::write(dir.path().join("foo.proto"), "package foo; message Foo { Bar bar = 1; } message Bar {}").unwrap();
//! let mut builder = Builder::new([dir.path()]);
//! let file = builder.build_file("foo.proto").unwrap();
//!
//! let ast = builder.ast();
//! let foo = ast[file].message(ast, "Foo").unwrap();
//! let bar = ast[foo].field(ast, "bar").unwrap();
//! assert_eq!(ast[bar].ty.display(ast).to_string(), "foo.Bar");
//! ```
//!
//! Source positions and comments are kept in side tables keyed by [`NodeId`], optionally
//! narrowed to one attribute of the node with [`Attr`].

mod option;
mod package;
#[cfg(test)]
mod tests;
mod types;

pub use self::option::{MethodOption, MethodOptionValue, OptionCategory, OptionDef, OptionValue};
pub use self::package::{Package, PackageError};
pub use self::types::{FieldRef, Hashable, NamedType, Scalar, Type};
pub use protoast_parse::ast::ImportKind;

use std::{
    collections::HashMap,
    fmt,
    ops::{Index, IndexMut},
    path::{Path, PathBuf},
};

use la_arena::{Arena, Idx};
use thiserror::Error;

/// Identifies a [`File`].
pub type FileId = Idx<File>;
/// Identifies an [`Import`].
pub type ImportId = Idx<Import>;
/// Identifies a [`Message`].
pub type MessageId = Idx<Message>;
/// Identifies a [`MessageField`].
pub type FieldId = Idx<MessageField>;
/// Identifies a [`OneOf`].
pub type OneofId = Idx<OneOf>;
/// Identifies a [`OneofBranch`].
pub type BranchId = Idx<OneofBranch>;
/// Identifies an [`Enum`].
pub type EnumId = Idx<Enum>;
/// Identifies an [`EnumValue`].
pub type EnumValueId = Idx<EnumValue>;
/// Identifies an [`Extension`].
pub type ExtensionId = Idx<Extension>;
/// Identifies an [`ExtensionField`].
pub type ExtensionFieldId = Idx<ExtensionField>;
/// Identifies a [`Service`].
pub type ServiceId = Idx<Service>;
/// Identifies a [`Method`].
pub type MethodId = Idx<Method>;
/// Identifies an [`OptionDef`].
pub type OptionId = Idx<OptionDef>;
/// Identifies an [`OptionValue`].
pub type ValueId = Idx<OptionValue>;
/// Identifies a [`MethodOption`].
pub type MethodOptionId = Idx<MethodOption>;

/// A location in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// The file path, or the import path if the location of the file is unknown.
    pub file: String,
    /// The byte offset from the start of the file.
    pub offset: usize,
    /// The one-based line number.
    pub line: usize,
    /// The one-based column number.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A comment attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The comment lines joined with newlines.
    pub value: String,
    /// The comment text with comment markers removed, one entry per source line.
    pub lines: Vec<String>,
    /// The location of the comment.
    pub position: Position,
}

/// Any node of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NodeId {
    File(FileId),
    Import(ImportId),
    Message(MessageId),
    Field(FieldId),
    Oneof(OneofId),
    Branch(BranchId),
    Enum(EnumId),
    EnumValue(EnumValueId),
    Extension(ExtensionId),
    ExtensionField(ExtensionFieldId),
    Service(ServiceId),
    Method(MethodId),
    Option(OptionId),
    Value(ValueId),
    MethodOption(MethodOptionId),
}

/// An attribute of a node which has its own source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Attr {
    Name,
    Sequence,
    Integer,
    Syntax,
    Package,
    Path,
    Input,
    Output,
    Value,
}

/// A source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// The import path of the file.
    pub name: String,
    /// The filesystem path, if the file was read from disk.
    pub path: Option<PathBuf>,
    /// The declared package, or the empty string.
    pub package: String,
    /// The declared syntax, or the empty string.
    pub syntax: String,
    /// Imported files, in source order.
    pub imports: Vec<ImportId>,
    /// Messages and enums declared at the top level.
    pub types: Vec<NamedType>,
    /// `extend` blocks declared anywhere in the file.
    pub extensions: Vec<ExtensionId>,
    /// Services.
    pub services: Vec<ServiceId>,
    /// File-level options.
    pub options: Vec<OptionId>,
    /// The import path part of the `go_package` option.
    pub go_path: String,
    /// The package name part of the `go_package` option. Defaults to the protobuf package.
    pub go_pkg: String,
}

/// An `import` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// The imported path as written.
    pub path: String,
    /// The `weak` or `public` modifier.
    pub kind: Option<ImportKind>,
    /// The imported file.
    pub file: FileId,
}

/// A message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The local name.
    pub name: String,
    /// The file declaring the message.
    pub file: FileId,
    /// The enclosing message, if nested.
    pub parent: Option<MessageId>,
    /// Fields in source order. Each oneof is represented by a single synthetic field.
    pub fields: Vec<FieldId>,
    /// Nested messages and enums.
    pub types: Vec<NamedType>,
    /// Message options.
    pub options: Vec<OptionId>,
}

/// A field declared directly in a message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageField {
    /// The field name.
    pub name: String,
    /// The field number, or `-1` for the synthetic field of a oneof.
    pub sequence: i32,
    /// The field type.
    pub ty: Type,
    /// Field options.
    pub options: Vec<OptionId>,
    /// The message declaring the field.
    pub message: MessageId,
}

/// A `oneof` group.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOf {
    /// The oneof name.
    pub name: String,
    /// The message declaring the oneof.
    pub parent: MessageId,
    /// The fields of the oneof.
    pub branches: Vec<BranchId>,
    /// Oneof options.
    pub options: Vec<OptionId>,
}

/// A field declared inside a oneof.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofBranch {
    /// The field name.
    pub name: String,
    /// The field number.
    pub sequence: i32,
    /// The field type.
    pub ty: Type,
    /// Field options.
    pub options: Vec<OptionId>,
    /// The oneof declaring the field.
    pub oneof: OneofId,
}

/// An enum.
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// The local name.
    pub name: String,
    /// The file declaring the enum.
    pub file: FileId,
    /// The enclosing message, if nested.
    pub parent: Option<MessageId>,
    /// Values in source order.
    pub values: Vec<EnumValueId>,
    /// Enum options.
    pub options: Vec<OptionId>,
}

/// A value of an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// The value name.
    pub name: String,
    /// The numeric value.
    pub integer: i32,
    /// Value options.
    pub options: Vec<OptionId>,
    /// The enum declaring the value.
    pub enumeration: EnumId,
}

/// An `extend` block, declaring extra fields of an existing message.
///
/// Custom options are declared as extensions of the `google.protobuf.*Options` messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    /// The extended type name as written.
    pub name: String,
    /// The extended message. It is not modified by the extension.
    pub extendee: MessageId,
    /// The file declaring the extension.
    pub file: FileId,
    /// The enclosing message, if nested.
    pub parent: Option<MessageId>,
    /// The declared fields.
    pub fields: Vec<ExtensionFieldId>,
}

/// A field declared by an `extend` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionField {
    /// The field name.
    pub name: String,
    /// The field number.
    pub sequence: i32,
    /// The field type.
    pub ty: Type,
    /// Field options.
    pub options: Vec<OptionId>,
    /// The extension declaring the field.
    pub extension: ExtensionId,
}

/// A service.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// The service name.
    pub name: String,
    /// The file declaring the service.
    pub file: FileId,
    /// Methods in source order.
    pub methods: Vec<MethodId>,
    /// Service options.
    pub options: Vec<OptionId>,
}

/// An `rpc` method.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// The method name.
    pub name: String,
    /// The file declaring the method.
    pub file: FileId,
    /// The service declaring the method.
    pub service: ServiceId,
    /// The request type, wrapped in [`Type::Stream`] for client streaming.
    pub input: Type,
    /// The response type, wrapped in [`Type::Stream`] for server streaming.
    pub output: Type,
    /// Method options.
    pub options: Vec<MethodOptionId>,
}

/// An error looking up a type by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No type has the name.
    #[error("{name}: type not found")]
    NotFound {
        /// The name looked up.
        name: String,
    },
    /// The type has the wrong kind.
    #[error("type {name} is {found}, not {expected}")]
    UnexpectedKind {
        /// The name looked up.
        name: String,
        /// The kind of the type found.
        found: &'static str,
        /// The kind of type requested.
        expected: &'static str,
    },
}

/// The store of all nodes built by a [`Builder`](crate::Builder).
#[derive(Debug, Default)]
pub struct Ast {
    pub(crate) files: Arena<File>,
    pub(crate) imports: Arena<Import>,
    pub(crate) messages: Arena<Message>,
    pub(crate) fields: Arena<MessageField>,
    pub(crate) oneofs: Arena<OneOf>,
    pub(crate) branches: Arena<OneofBranch>,
    pub(crate) enums: Arena<Enum>,
    pub(crate) enum_values: Arena<EnumValue>,
    pub(crate) extensions: Arena<Extension>,
    pub(crate) extension_fields: Arena<ExtensionField>,
    pub(crate) services: Arena<Service>,
    pub(crate) methods: Arena<Method>,
    pub(crate) options: Arena<OptionDef>,
    pub(crate) values: Arena<OptionValue>,
    pub(crate) method_options: Arena<MethodOption>,
    positions: HashMap<(NodeId, Option<Attr>), Position>,
    comments: HashMap<(NodeId, Option<Attr>), Comment>,
}

macro_rules! arena_index {
    ($($field:ident: $ty:ty => $variant:ident,)*) => {
        $(
            impl Index<Idx<$ty>> for Ast {
                type Output = $ty;

                fn index(&self, id: Idx<$ty>) -> &$ty {
                    &self.$field[id]
                }
            }

            impl IndexMut<Idx<$ty>> for Ast {
                fn index_mut(&mut self, id: Idx<$ty>) -> &mut $ty {
                    &mut self.$field[id]
                }
            }

            impl From<Idx<$ty>> for NodeId {
                fn from(id: Idx<$ty>) -> Self {
                    NodeId::$variant(id)
                }
            }
        )*
    };
}

arena_index! {
    files: File => File,
    imports: Import => Import,
    messages: Message => Message,
    fields: MessageField => Field,
    oneofs: OneOf => Oneof,
    branches: OneofBranch => Branch,
    enums: Enum => Enum,
    enum_values: EnumValue => EnumValue,
    extensions: Extension => Extension,
    extension_fields: ExtensionField => ExtensionField,
    services: Service => Service,
    methods: Method => Method,
    options: OptionDef => Option,
    values: OptionValue => Value,
    method_options: MethodOption => MethodOption,
}

impl From<NamedType> for NodeId {
    fn from(ty: NamedType) -> Self {
        match ty {
            NamedType::Message(id) => NodeId::Message(id),
            NamedType::Enum(id) => NodeId::Enum(id),
        }
    }
}

impl From<FieldRef> for NodeId {
    fn from(field: FieldRef) -> Self {
        match field {
            FieldRef::Plain(id) => NodeId::Field(id),
            FieldRef::Branch(id) => NodeId::Branch(id),
        }
    }
}

impl Ast {
    /// Iterates over all files built so far, including files which failed to build.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &File)> + '_ {
        self.files.iter()
    }

    /// The location where a node is declared.
    ///
    /// # Panics
    ///
    /// Panics if the node was not created by the builder owning this store.
    pub fn position(&self, node: impl Into<NodeId>) -> &Position {
        let node = node.into();
        match self.positions.get(&(node, None)) {
            Some(position) => position,
            None => panic!("no position recorded for {:?}", node),
        }
    }

    /// The location of one attribute of a node.
    ///
    /// # Panics
    ///
    /// Panics if no position was recorded for the attribute. Every attribute listed in the
    /// documentation of [`Attr`] for the node kind has one.
    pub fn field_position(&self, node: impl Into<NodeId>, attr: Attr) -> &Position {
        let node = node.into();
        match self.positions.get(&(node, Some(attr))) {
            Some(position) => position,
            None => panic!("no position recorded for {:?} of {:?}", attr, node),
        }
    }

    /// The leading comment of a node, if any.
    pub fn comment(&self, node: impl Into<NodeId>) -> Option<&Comment> {
        self.comments.get(&(node.into(), None))
    }

    /// The comment attached to one attribute of a node, if any.
    pub fn field_comment(&self, node: impl Into<NodeId>, attr: Attr) -> Option<&Comment> {
        self.comments.get(&(node.into(), Some(attr)))
    }

    pub(crate) fn set_position(
        &mut self,
        node: impl Into<NodeId>,
        attr: Option<Attr>,
        position: Position,
    ) {
        self.positions.insert((node.into(), attr), position);
    }

    pub(crate) fn set_comment(
        &mut self,
        node: impl Into<NodeId>,
        attr: Option<Attr>,
        comment: Comment,
    ) {
        self.comments.insert((node.into(), attr), comment);
    }

    /// The fully-qualified name of a type, such as `foo.bar.Outer.Inner`.
    pub fn full_name(&self, ty: NamedType) -> String {
        let (name, file, parent) = match ty {
            NamedType::Message(id) => (&self[id].name, self[id].file, self[id].parent),
            NamedType::Enum(id) => (&self[id].name, self[id].file, self[id].parent),
        };

        let prefix = match parent {
            Some(parent) => self.full_name(NamedType::Message(parent)),
            None => self[file].package.clone(),
        };

        if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        }
    }

    /// Walks `ty` and, depth-first, its nested types.
    ///
    /// The nested types of a message are skipped if `inspector` returns `false` for it.
    pub fn scan_types<F>(&self, ty: NamedType, inspector: &mut F)
    where
        F: FnMut(NamedType) -> bool,
    {
        if !inspector(ty) {
            return;
        }

        if let NamedType::Message(id) = ty {
            for &nested in &self[id].types {
                self.scan_types(nested, inspector);
            }
        }
    }
}

fn find_type(ast: &Ast, types: &[NamedType], name: &str) -> Option<NamedType> {
    types.iter().copied().find(|ty| ty.name(ast) == name)
}

fn expect_message(ty: Option<NamedType>, name: &str) -> Result<MessageId, LookupError> {
    match ty {
        Some(NamedType::Message(id)) => Ok(id),
        Some(ty) => Err(LookupError::UnexpectedKind {
            name: name.to_owned(),
            found: ty.kind(),
            expected: "message",
        }),
        None => Err(LookupError::NotFound {
            name: name.to_owned(),
        }),
    }
}

fn expect_enum(ty: Option<NamedType>, name: &str) -> Result<EnumId, LookupError> {
    match ty {
        Some(NamedType::Enum(id)) => Ok(id),
        Some(ty) => Err(LookupError::UnexpectedKind {
            name: name.to_owned(),
            found: ty.kind(),
            expected: "enum",
        }),
        None => Err(LookupError::NotFound {
            name: name.to_owned(),
        }),
    }
}

impl File {
    /// Finds a top-level message or enum by its local name.
    pub fn ty(&self, ast: &Ast, name: &str) -> Option<NamedType> {
        find_type(ast, &self.types, name)
    }

    /// Finds a top-level message by its local name.
    pub fn message(&self, ast: &Ast, name: &str) -> Result<MessageId, LookupError> {
        expect_message(self.ty(ast, name), name)
    }

    /// Finds a top-level enum by its local name.
    pub fn enumeration(&self, ast: &Ast, name: &str) -> Result<EnumId, LookupError> {
        expect_enum(self.ty(ast, name), name)
    }

    /// Finds a service by name.
    pub fn service(&self, ast: &Ast, name: &str) -> Option<ServiceId> {
        self.services
            .iter()
            .copied()
            .find(|&service| ast[service].name == name)
    }

    /// Walks every type declared in the file, depth-first.
    pub fn scan_types<F>(&self, ast: &Ast, inspector: &mut F)
    where
        F: FnMut(NamedType) -> bool,
    {
        for &ty in &self.types {
            ast.scan_types(ty, inspector);
        }
    }
}

impl Message {
    /// The fields of the message with each oneof replaced by its branches.
    pub fn all_fields(&self, ast: &Ast) -> Vec<FieldRef> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for &field in &self.fields {
            match &ast[field].ty {
                Type::OneOf(oneof) => fields.extend(
                    ast[*oneof]
                        .branches
                        .iter()
                        .map(|&branch| FieldRef::Branch(branch)),
                ),
                _ => fields.push(FieldRef::Plain(field)),
            }
        }
        fields
    }

    /// Finds a field declared directly in the message, including the synthetic fields of oneofs.
    pub fn field(&self, ast: &Ast, name: &str) -> Option<FieldId> {
        self.fields
            .iter()
            .copied()
            .find(|&field| ast[field].name == name)
    }

    /// Finds a field by name, searching oneof branches as well.
    pub fn field_oneof(&self, ast: &Ast, name: &str) -> Option<FieldRef> {
        for &field in &self.fields {
            if ast[field].name == name {
                return Some(FieldRef::Plain(field));
            }

            if let Type::OneOf(oneof) = &ast[field].ty {
                for &branch in &ast[*oneof].branches {
                    if ast[branch].name == name {
                        return Some(FieldRef::Branch(branch));
                    }
                }
            }
        }

        None
    }

    /// Finds a nested message or enum by its local name.
    pub fn ty(&self, ast: &Ast, name: &str) -> Option<NamedType> {
        find_type(ast, &self.types, name)
    }

    /// Finds a nested message by its local name.
    pub fn message(&self, ast: &Ast, name: &str) -> Result<MessageId, LookupError> {
        expect_message(self.ty(ast, name), name)
    }

    /// Finds a nested enum by its local name.
    pub fn enumeration(&self, ast: &Ast, name: &str) -> Result<EnumId, LookupError> {
        expect_enum(self.ty(ast, name), name)
    }
}

impl Enum {
    /// Finds a value by name.
    pub fn value(&self, ast: &Ast, name: &str) -> Option<EnumValueId> {
        self.values
            .iter()
            .copied()
            .find(|&value| ast[value].name == name)
    }
}

impl Service {
    /// Finds a method by name.
    pub fn method(&self, ast: &Ast, name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .copied()
            .find(|&method| ast[method].name == name)
    }
}

impl Method {
    /// The request message, looking through `stream`.
    pub fn input_message(&self) -> Option<MessageId> {
        self.input.as_message()
    }

    /// The response message, looking through `stream`.
    pub fn output_message(&self) -> Option<MessageId> {
        self.output.as_message()
    }

    /// The gRPC-style URI of the method: `/<prefix><package>/<method>`, where the prefix is
    /// built from the directory of the declaring file.
    pub fn uri(&self, ast: &Ast) -> String {
        let file = &ast[self.file];

        let mut uri = String::from("/");
        if let Some(dir) = Path::new(&file.name).parent() {
            for component in dir.iter() {
                uri.push_str(&component.to_string_lossy());
                uri.push('.');
            }
        }
        uri.push_str(&file.package);
        uri.push('/');
        uri.push_str(&self.name);
        uri
    }
}
