use std::path::Path;

use thiserror::Error;

use super::{Ast, FileId, MessageId, NamedType, ServiceId};

/// The files of one protobuf package, grouped for code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    go_package: String,
    files: Vec<FileId>,
}

/// An error grouping files into a [`Package`] or looking up one of its files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    /// No files were given.
    #[error("a package needs at least one file")]
    Empty,
    /// The files declare different protobuf packages.
    #[error("files have mixed packages '{first}' and '{other}'")]
    MixedPackages {
        /// The package of the first file.
        first: String,
        /// A different package.
        other: String,
    },
    /// The files declare different `go_package` names.
    #[error("files have mixed go packages '{first}' and '{other}'")]
    MixedGoPackages {
        /// The go package of the first file.
        first: String,
        /// A different go package.
        other: String,
    },
    /// An empty file name was looked up.
    #[error("file name is empty")]
    EmptyFileName,
    /// A file name with a directory component was looked up.
    #[error("file name '{name}' must not contain a directory")]
    FileInDirectory {
        /// The name looked up.
        name: String,
    },
    /// A file name without the `.proto` extension was looked up.
    #[error("file name '{name}' must end with '.proto'")]
    MissingProtoSuffix {
        /// The name looked up.
        name: String,
    },
    /// No file of the package has the name.
    #[error("file '{name}' not found in package '{package}'")]
    FileNotFound {
        /// The name looked up.
        name: String,
        /// The package searched.
        package: String,
    },
}

impl Package {
    /// Groups `files`, which must all declare the same package and the same `go_package` name.
    pub fn new(ast: &Ast, files: Vec<FileId>) -> Result<Self, PackageError> {
        let first = match files.first() {
            Some(&first) => &ast[first],
            None => return Err(PackageError::Empty),
        };

        for &file in &files[1..] {
            let file = &ast[file];
            if file.package != first.package {
                return Err(PackageError::MixedPackages {
                    first: first.package.clone(),
                    other: file.package.clone(),
                });
            }
            if file.go_pkg != first.go_pkg {
                return Err(PackageError::MixedGoPackages {
                    first: first.go_pkg.clone(),
                    other: file.go_pkg.clone(),
                });
            }
        }

        Ok(Package {
            name: first.package.clone(),
            go_package: first.go_pkg.clone(),
            files,
        })
    }

    /// The protobuf package name.
    pub fn package(&self) -> &str {
        &self.name
    }

    /// The `go_package` name shared by all files.
    pub fn go_package(&self) -> &str {
        &self.go_package
    }

    /// The member files.
    pub fn files(&self) -> &[FileId] {
        &self.files
    }

    /// Finds a member file by its base name, such as `foo.proto`.
    pub fn file(&self, ast: &Ast, name: &str) -> Result<FileId, PackageError> {
        if name.is_empty() {
            return Err(PackageError::EmptyFileName);
        }
        if name.contains('/') || name.contains('\\') {
            return Err(PackageError::FileInDirectory {
                name: name.to_owned(),
            });
        }
        if !name.ends_with(".proto") {
            return Err(PackageError::MissingProtoSuffix {
                name: name.to_owned(),
            });
        }

        self.files
            .iter()
            .copied()
            .find(|&file| {
                Path::new(&ast[file].name)
                    .file_name()
                    .map_or(false, |file_name| file_name == name)
            })
            .ok_or_else(|| PackageError::FileNotFound {
                name: name.to_owned(),
                package: self.name.clone(),
            })
    }

    /// Every service of every member file.
    pub fn services<'a>(&'a self, ast: &'a Ast) -> impl Iterator<Item = ServiceId> + 'a {
        self.files
            .iter()
            .flat_map(move |&file| ast[file].services.iter().copied())
    }

    /// Every top-level type of every member file.
    pub fn types<'a>(&'a self, ast: &'a Ast) -> impl Iterator<Item = NamedType> + 'a {
        self.files
            .iter()
            .flat_map(move |&file| ast[file].types.iter().copied())
    }

    /// Finds a service by name in any member file.
    pub fn service(&self, ast: &Ast, name: &str) -> Option<ServiceId> {
        self.files
            .iter()
            .find_map(|&file| ast[file].service(ast, name))
    }

    /// Finds a top-level type by name in any member file.
    pub fn ty(&self, ast: &Ast, name: &str) -> Option<NamedType> {
        self.files.iter().find_map(|&file| ast[file].ty(ast, name))
    }

    /// Finds a top-level message by name in any member file.
    pub fn message(&self, ast: &Ast, name: &str) -> Option<MessageId> {
        match self.ty(ast, name) {
            Some(NamedType::Message(id)) => Some(id),
            _ => None,
        }
    }

    /// Walks every type of every member file, depth-first.
    pub fn scan_types<F>(&self, ast: &Ast, inspector: &mut F)
    where
        F: FnMut(NamedType) -> bool,
    {
        for &file in &self.files {
            ast[file].scan_types(ast, inspector);
        }
    }
}
