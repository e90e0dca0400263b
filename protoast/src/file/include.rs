use std::{
    fs, io,
    path::{self, Path, PathBuf},
};

use crate::{error::ErrorKind, Error};

use super::{File, Files};

/// An implementation of [`Files`] which searches an include path on the file system.
#[derive(Debug)]
pub struct IncludeFiles {
    include: PathBuf,
}

impl IncludeFiles {
    /// Constructs an `IncludeFiles` that searches the given include path.
    pub fn new(include: PathBuf) -> Self {
        IncludeFiles { include }
    }
}

impl Files for IncludeFiles {
    /// Opens a file relative to the include path.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::{fs, path::PathBuf};
    /// # use protoast::file::{IncludeFiles, Files};
    /// # let tempdir = tempfile::tempdir().unwrap();
    /// # std::env::set_current_dir(&tempdir).unwrap();
    /// fs::write("./foo.proto", "content").unwrap();
    ///
    /// let files = IncludeFiles::new(PathBuf::from("."));
    /// let file = files.open_file("foo.proto").unwrap();
    /// assert_eq!(file.path(), Some(PathBuf::from("./foo.proto").as_path()));
    /// assert_eq!(file.content(), "content");
    /// assert!(files.open_file("bar.proto").unwrap_err().is_file_not_found());
    /// ```
    fn open_file(&self, name: &str) -> Result<File, Error> {
        let path = self.include.join(name);
        File::read(&path).map_err(|err| {
            if err.is_file_not_found() {
                Error::file_not_found(name)
            } else {
                err
            }
        })
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        if !is_relative_name(name) {
            return Err(Error::file_not_found(name));
        }

        let path = self.include.join(name);
        fs::canonicalize(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Error::file_not_found(name)
            } else {
                Error::from_kind(ErrorKind::OpenFile {
                    name: name.to_owned(),
                    path,
                    err,
                })
            }
        })
    }
}

/// Import paths are relative and never step outside the include directory.
fn is_relative_name(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|component| matches!(component, path::Component::Normal(_)))
}

pub(crate) fn path_to_file_name(path: &Path) -> Option<String> {
    let mut name = String::new();
    for component in path.components() {
        match component {
            path::Component::Normal(component) => {
                if let Some(component) = component.to_str() {
                    if !name.is_empty() {
                        name.push('/');
                    }
                    name.push_str(component);
                } else {
                    return None;
                }
            }
            path::Component::CurDir => continue,
            _ => return None,
        }
    }

    Some(name)
}
