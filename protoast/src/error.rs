use std::{fmt, io, path::PathBuf};

use miette::Diagnostic;
use protoast_parse::ParseError;
use thiserror::Error;

use crate::ast::{FileId, OptionCategory, Position};

/// An error which stops a file from being built.
#[derive(Diagnostic, Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error {
    kind: Box<ErrorKind>,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ErrorKind {
    #[error("{}", err)]
    #[diagnostic(forward(err))]
    Parse { err: ParseError },
    #[error("error opening file '{path}'")]
    OpenFile {
        name: String,
        path: PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("file '{name}' is too large")]
    #[diagnostic(help("the maximum file length is 2,147,483,647 bytes"))]
    FileTooLarge { name: String },
    #[error("file '{name}' is not valid utf-8")]
    FileInvalidUtf8 { name: String },
    #[error("file '{name}' not found")]
    FileNotFound { name: String },
    #[error("import cycle detected: {cycle}")]
    CircularImport { name: String, cycle: String },
    #[error("file '{name}' has {count} error(s)")]
    #[diagnostic(help("errors are reported through the builder's error callback"))]
    Build {
        name: String,
        count: usize,
        file: FileId,
    },
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Creates an instance of [`struct@Error`] with an arbitrary payload.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::from_kind(ErrorKind::Custom(error.into()))
    }

    /// Creates an instance of [`struct@Error`] indicating that a file could not be found.
    ///
    /// This error should be returned by [`Files`](crate::file::Files) implementations if a file is not found.
    pub fn file_not_found(name: &str) -> Self {
        Error::from_kind(ErrorKind::FileNotFound {
            name: name.to_owned(),
        })
    }

    /// The file in which this error occurred, if available.
    pub fn file(&self) -> Option<&str> {
        match &*self.kind {
            ErrorKind::Parse { err } => Some(err.file()),
            ErrorKind::OpenFile { name, .. }
            | ErrorKind::FileTooLarge { name }
            | ErrorKind::FileInvalidUtf8 { name }
            | ErrorKind::FileNotFound { name }
            | ErrorKind::CircularImport { name, .. }
            | ErrorKind::Build { name, .. } => Some(name),
            ErrorKind::Custom(_) => None,
        }
    }

    /// The partially built file, if this error was caused by problems reported to the error callback.
    ///
    /// The file is incomplete: declarations which caused errors are missing from it.
    pub fn partial_file(&self) -> Option<FileId> {
        match &*self.kind {
            ErrorKind::Build { file, .. } => Some(*file),
            _ => None,
        }
    }

    /// The number of problems reported to the error callback while building the file, if this error was caused by them.
    pub fn error_count(&self) -> Option<usize> {
        match &*self.kind {
            ErrorKind::Build { count, .. } => Some(*count),
            _ => None,
        }
    }

    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if this is an instance of [`Error::file_not_found()`]
    pub fn is_file_not_found(&self) -> bool {
        matches!(&*self.kind, ErrorKind::FileNotFound { .. })
    }

    /// Returns true if this error is caused by an invalid protobuf source file.
    pub fn is_parse(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::Parse { .. }
                | ErrorKind::FileTooLarge { .. }
                | ErrorKind::FileInvalidUtf8 { .. }
        )
    }

    /// Returns true if this error is caused by an IO error while opening a file.
    pub fn is_io(&self) -> bool {
        match &*self.kind {
            ErrorKind::OpenFile { .. } => true,
            ErrorKind::Custom(err) if err.downcast_ref::<io::Error>().is_some() => true,
            _ => false,
        }
    }

    /// Returns true if this error is caused by a file importing itself, directly or indirectly.
    pub fn is_circular_import(&self) -> bool {
        matches!(&*self.kind, ErrorKind::CircularImport { .. })
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::from_kind(ErrorKind::Parse { err })
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::new(err)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ErrorKind::Parse { err } => err.fmt(f),
            ErrorKind::OpenFile { err, .. } => write!(f, "{}: {}", self, err),
            ErrorKind::FileTooLarge { .. }
            | ErrorKind::FileInvalidUtf8 { .. }
            | ErrorKind::FileNotFound { .. }
            | ErrorKind::CircularImport { .. }
            | ErrorKind::Build { .. } => write!(f, "{}", self),
            ErrorKind::Custom(err) => err.fmt(f),
        }
    }
}

/// A problem found while building a file.
///
/// These errors do not stop the build: they are passed to the callback set with
/// [`Builder::on_error`](crate::Builder::on_error) and the offending declaration is left out of the
/// resulting tree. Once the file is complete, [`Builder::build_file`](crate::Builder::build_file) fails
/// with the number of problems found.
#[derive(Diagnostic, Error)]
pub enum BuildError {
    /// A name is declared twice in the same scope.
    #[error("duplicate definition of '{name}', previously defined at {previous}")]
    DuplicateType {
        /// The duplicated name.
        name: String,
        /// The location of the second definition.
        position: Position,
        /// The location of the first definition.
        previous: Position,
    },
    /// A name is already declared by an imported file of the same package.
    #[error("'{name}' is already defined in an imported file at {previous}")]
    DuplicateImportedType {
        /// The duplicated name.
        name: String,
        /// The location of the local definition.
        position: Position,
        /// The location of the imported definition.
        previous: Position,
    },
    /// A file declares a package name different from one already set for it.
    #[error("package '{package}' conflicts with previously declared package '{previous}'")]
    ConflictingPackage {
        /// The new package name.
        package: String,
        /// The package name set first.
        previous: String,
        /// The location of the package statement.
        position: Position,
    },
    /// Two fields of a message share a name.
    #[error("duplicate field '{name}', previously defined at {previous}")]
    DuplicateFieldName {
        /// The field name.
        name: String,
        /// The location of the second field.
        position: Position,
        /// The location of the first field.
        previous: Position,
    },
    /// Two fields of a message share a number.
    #[error("duplicate field number {number}, previously used at {previous}")]
    DuplicateFieldNumber {
        /// The field number.
        number: i32,
        /// The location of the second field.
        position: Position,
        /// The location of the first field.
        previous: Position,
    },
    /// Two values of an enum share a name.
    #[error("duplicate enum value '{name}', previously defined at {previous}")]
    DuplicateEnumValueName {
        /// The value name.
        name: String,
        /// The location of the second value.
        position: Position,
        /// The location of the first value.
        previous: Position,
    },
    /// Two values of an enum share a number.
    #[error("duplicate enum value number {number}, previously used at {previous}")]
    DuplicateEnumValueNumber {
        /// The value number.
        number: i32,
        /// The location of the second value.
        position: Position,
        /// The location of the first value.
        previous: Position,
    },
    /// Two methods of a service share a name.
    #[error("duplicate method '{name}' in service '{service}', previously defined at {previous}")]
    DuplicateMethod {
        /// The service name.
        service: String,
        /// The method name.
        name: String,
        /// The location of the second method.
        position: Position,
        /// The location of the first method.
        previous: Position,
    },
    /// A type name could not be resolved.
    #[error("unknown type '{name}'")]
    UnknownType {
        /// The type name as written.
        name: String,
        /// The location of the reference.
        position: Position,
    },
    /// The value type of a map field could not be resolved.
    #[error("unknown map value type '{name}'")]
    UnknownMapValueType {
        /// The type name as written.
        name: String,
        /// The location of the field.
        position: Position,
    },
    /// The key type of a map field is not an integer or string scalar.
    #[error("invalid map key type '{name}'")]
    #[diagnostic(help("map keys must be integer or string types"))]
    InvalidMapKeyType {
        /// The type name as written.
        name: String,
        /// The location of the field.
        position: Position,
    },
    /// An `extend` block names a type which is not declared.
    #[error("failed to find type '{name}' to extend")]
    ExtendUndeclared {
        /// The extended type name as written.
        name: String,
        /// The location of the block.
        position: Position,
    },
    /// An `extend` block names an enum.
    #[error("type '{name}' cannot be extended, it is not a message")]
    ExtendNonMessage {
        /// The extended type name as written.
        name: String,
        /// The location of the block.
        position: Position,
    },
    /// No extension declares the option.
    #[error("unknown option '{name}' for {category}")]
    UnknownOption {
        /// The qualified option name.
        name: String,
        /// The kind of declaration the option is attached to.
        category: OptionCategory,
        /// The location of the option.
        position: Position,
    },
    /// The option name is malformed.
    #[error("invalid option name '{name}': {reason}")]
    InvalidOptionName {
        /// The option name as written.
        name: String,
        /// What is wrong with it.
        reason: String,
        /// The location of the option.
        position: Position,
    },
    /// The option value does not match the type of the option.
    #[error("invalid value {value} for option '{name}': {reason}")]
    InvalidOptionValue {
        /// The option name.
        name: String,
        /// The value as written.
        value: String,
        /// What is wrong with it.
        reason: String,
        /// The location of the value.
        position: Position,
    },
    /// An aggregate option value names a field its message does not have.
    #[error("option '{name}' has no field '{field}'")]
    UnknownOptionField {
        /// The option name.
        name: String,
        /// The unknown field.
        field: String,
        /// The location of the entry.
        position: Position,
    },
    /// An enum-typed option value names a value the enum does not have.
    #[error("enum '{enumeration}' has no value '{value}' for option '{name}'")]
    UnknownEnumValue {
        /// The option name.
        name: String,
        /// The enum name.
        enumeration: String,
        /// The value as written.
        value: String,
        /// The location of the value.
        position: Position,
    },
    /// The option has a type which cannot be written as a constant.
    #[error("type {ty} is not supported for option values of '{name}'")]
    UnsupportedOptionType {
        /// The option name.
        name: String,
        /// The option type.
        ty: String,
        /// The location of the value.
        position: Position,
    },
    /// The `go_package` file option is malformed.
    #[error("invalid go_package option value \"{value}\"")]
    #[diagnostic(help("the value must be either \"<path>;<pkg>\" or \"<pkg>\""))]
    InvalidGoPackage {
        /// The option value.
        value: String,
        /// The location of the value.
        position: Position,
    },
    /// An imported file could not be built.
    #[error("reading import '{name}': {reason}")]
    ImportFailed {
        /// The imported file name.
        name: String,
        /// The error building the import.
        reason: String,
        /// The location of the import.
        position: Position,
    },
    /// A file-level statement appears inside a message.
    #[error("{statement} is not allowed in nested scopes")]
    NestedScope {
        /// The kind of statement.
        statement: &'static str,
        /// The location of the statement.
        position: Position,
    },
}

impl BuildError {
    /// The location where the problem was found.
    pub fn position(&self) -> &Position {
        match self {
            BuildError::DuplicateType { position, .. }
            | BuildError::DuplicateImportedType { position, .. }
            | BuildError::ConflictingPackage { position, .. }
            | BuildError::DuplicateFieldName { position, .. }
            | BuildError::DuplicateFieldNumber { position, .. }
            | BuildError::DuplicateEnumValueName { position, .. }
            | BuildError::DuplicateEnumValueNumber { position, .. }
            | BuildError::DuplicateMethod { position, .. }
            | BuildError::UnknownType { position, .. }
            | BuildError::UnknownMapValueType { position, .. }
            | BuildError::InvalidMapKeyType { position, .. }
            | BuildError::ExtendUndeclared { position, .. }
            | BuildError::ExtendNonMessage { position, .. }
            | BuildError::UnknownOption { position, .. }
            | BuildError::InvalidOptionName { position, .. }
            | BuildError::InvalidOptionValue { position, .. }
            | BuildError::UnknownOptionField { position, .. }
            | BuildError::UnknownEnumValue { position, .. }
            | BuildError::UnsupportedOptionType { position, .. }
            | BuildError::InvalidGoPackage { position, .. }
            | BuildError::ImportFailed { position, .. }
            | BuildError::NestedScope { position, .. } => position,
        }
    }

    /// The location of the earlier conflicting definition, for duplicate definitions.
    pub fn previous(&self) -> Option<&Position> {
        match self {
            BuildError::DuplicateType { previous, .. }
            | BuildError::DuplicateImportedType { previous, .. }
            | BuildError::DuplicateFieldName { previous, .. }
            | BuildError::DuplicateFieldNumber { previous, .. }
            | BuildError::DuplicateEnumValueName { previous, .. }
            | BuildError::DuplicateEnumValueNumber { previous, .. }
            | BuildError::DuplicateMethod { previous, .. } => Some(previous),
            _ => None,
        }
    }
}

impl fmt::Debug for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_debug_io() {
        let err = Error::from_kind(ErrorKind::OpenFile {
            name: "file.proto".into(),
            path: "path/to/file.proto".into(),
            err: io::Error::new(io::ErrorKind::Other, "io error"),
        });

        assert!(err.is_io());
        assert_eq!(err.file(), Some("file.proto"));
        assert_eq!(
            format!("{:?}", err),
            "error opening file 'path/to/file.proto': io error"
        );
    }

    #[test]
    fn fmt_debug_parse() {
        let err = Error::from(protoast_parse::parse("file.proto", "message Foo { int32 a = 0; }").unwrap_err());

        assert!(err.is_parse());
        assert!(!err.is_file_not_found());
        assert_eq!(err.file(), Some("file.proto"));
        assert_eq!(
            format!("{:?}", err),
            "file.proto:1:25: message numbers must be between 1 and 536870911"
        );
    }

    #[test]
    fn fmt_debug_circular_import() {
        let err = Error::from_kind(ErrorKind::CircularImport {
            name: "a.proto".into(),
            cycle: "a.proto -> b.proto -> a.proto".into(),
        });

        assert!(err.is_circular_import());
        assert_eq!(err.partial_file(), None);
        assert_eq!(
            format!("{:?}", err),
            "import cycle detected: a.proto -> b.proto -> a.proto"
        );
    }

    #[test]
    fn fmt_debug_build_error() {
        let position = Position {
            file: "foo.proto".to_owned(),
            offset: 20,
            line: 2,
            column: 5,
        };
        let err = BuildError::UnknownType {
            name: "Bar".to_owned(),
            position: position.clone(),
        };

        assert_eq!(err.position(), &position);
        assert_eq!(err.previous(), None);
        assert_eq!(format!("{:?}", err), "foo.proto:2:5: unknown type 'Bar'");
    }
}
