//! Locating protobuf source files.

mod chain;
mod google;
mod include;
mod map;
#[cfg(test)]
mod tests;

pub use chain::ChainFiles;
pub use google::GoogleFiles;
pub use include::IncludeFiles;
pub(crate) use include::path_to_file_name;
pub use map::MapFiles;

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate::{error::ErrorKind, Error, MAX_FILE_LEN};

/// A strategy for locating protobuf source files.
///
/// The main implementation is [`IncludeFiles`] which uses the file system, but this trait
/// allows sourcing files from other places as well.
pub trait Files {
    /// Opens a file by its import path.
    ///
    /// # Errors
    ///
    /// If the file is not found, the implementation should return [`Error::file_not_found`].
    fn open_file(&self, name: &str) -> Result<File, Error>;

    /// Returns the location of a file, for use in diagnostics.
    ///
    /// # Errors
    ///
    /// If the file is not found, the implementation should return [`Error::file_not_found`].
    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error>;
}

impl<T> Files for Box<T>
where
    T: Files + ?Sized,
{
    fn open_file(&self, name: &str) -> Result<File, Error> {
        (**self).open_file(name)
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        (**self).absolute_path(name)
    }
}

/// An opened protobuf source file, returned by [`Files::open_file`].
#[derive(Debug, Clone)]
pub struct File {
    pub(crate) path: Option<PathBuf>,
    pub(crate) content: String,
}

impl File {
    /// Reads a protobuf source file from the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if there is an IO error opening the file, it is too large or it is not
    /// valid UTF-8. If the file does not exist, [`Error::file_not_found()`] is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::fs;
    /// # use protoast::file::File;
    /// # let tempdir = tempfile::tempdir().unwrap();
    /// # std::env::set_current_dir(&tempdir).unwrap();
    /// fs::write("foo.proto", "message Foo { }").unwrap();
    ///
    /// let file = File::read("foo.proto".as_ref()).unwrap();
    /// assert_eq!(file.path(), Some("foo.proto".as_ref()));
    /// assert_eq!(file.content(), "message Foo { }");
    ///
    /// assert!(File::read("notfound.proto".as_ref()).unwrap_err().is_file_not_found());
    /// ```
    pub fn read(path: &Path) -> Result<Self, Error> {
        let name = path.display().to_string();
        let map_io_err = |err: io::Error| -> Error {
            if err.kind() == io::ErrorKind::NotFound {
                Error::file_not_found(&name)
            } else {
                Error::from_kind(ErrorKind::OpenFile {
                    name: name.clone(),
                    path: path.to_owned(),
                    err,
                })
            }
        };

        let file = fs::File::open(path).map_err(map_io_err)?;
        let metadata = file.metadata().map_err(map_io_err)?;

        if metadata.len() > MAX_FILE_LEN {
            return Err(Error::from_kind(ErrorKind::FileTooLarge { name }));
        }

        let mut buf = Vec::with_capacity(metadata.len() as usize);
        file.take(MAX_FILE_LEN)
            .read_to_end(&mut buf)
            .map_err(map_io_err)?;

        let content = match String::from_utf8(buf) {
            Ok(content) => content,
            Err(_) => return Err(Error::from_kind(ErrorKind::FileInvalidUtf8 { name })),
        };

        Ok(File {
            path: Some(path.to_owned()),
            content,
        })
    }

    /// Wraps in-memory source code.
    ///
    /// The `name` is only used in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is too large.
    pub fn from_source(name: &str, source: &str) -> Result<Self, Error> {
        if source.len() as u64 > MAX_FILE_LEN {
            return Err(Error::from_kind(ErrorKind::FileTooLarge {
                name: name.to_owned(),
            }));
        }

        Ok(File {
            path: None,
            content: source.to_owned(),
        })
    }

    /// Returns the filesystem path, if this source is backed by a physical file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the full content of the source file.
    pub fn content(&self) -> &str {
        &self.content
    }
}
