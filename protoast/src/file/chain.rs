use std::{fmt, path::PathBuf};

use super::{File, Files};
use crate::Error;

/// An implementation of [`Files`] which chains together several other resolvers.
///
/// Each resolver is searched in turn until the file is found. Errors other than
/// [`Error::file_not_found`] stop the search.
#[derive(Default)]
pub struct ChainFiles {
    resolvers: Vec<Box<dyn Files>>,
}

impl ChainFiles {
    /// Create a new, empty [`ChainFiles`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a new resolver.
    ///
    /// The new resolver will be searched after all previously-added resolvers.
    pub fn add<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Files + 'static,
    {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl Files for ChainFiles {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        for resolver in &self.resolvers {
            match resolver.open_file(name) {
                Ok(file) => return Ok(file),
                Err(err) if err.is_file_not_found() => continue,
                Err(err) => return Err(err),
            }
        }

        Err(Error::file_not_found(name))
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        for resolver in &self.resolvers {
            match resolver.absolute_path(name) {
                Ok(path) => return Ok(path),
                Err(err) if err.is_file_not_found() => continue,
                Err(err) => return Err(err),
            }
        }

        Err(Error::file_not_found(name))
    }
}

impl fmt::Debug for ChainFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainFiles")
            .field("len", &self.resolvers.len())
            .finish_non_exhaustive()
    }
}
