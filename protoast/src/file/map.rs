use std::{collections::HashMap, path::PathBuf};

use super::{File, Files};
use crate::Error;

/// An implementation of [`Files`] which maps import paths to explicit locations on the file system.
///
/// Import paths without a mapping are reported as not found.
#[derive(Debug, Default)]
pub struct MapFiles {
    mapping: HashMap<String, PathBuf>,
}

impl MapFiles {
    /// Creates a new, empty [`MapFiles`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Maps the import path `name` to the file at `path`.
    ///
    /// A later mapping for the same name replaces the earlier one.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        self.mapping.insert(name.into(), path.into());
        self
    }
}

impl Files for MapFiles {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        match self.mapping.get(name) {
            Some(path) => File::read(path).map_err(|err| {
                if err.is_file_not_found() {
                    Error::file_not_found(name)
                } else {
                    err
                }
            }),
            None => Err(Error::file_not_found(name)),
        }
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        self.mapping
            .get(name)
            .cloned()
            .ok_or_else(|| Error::file_not_found(name))
    }
}

impl<K, V> FromIterator<(K, V)> for MapFiles
where
    K: Into<String>,
    V: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MapFiles {
            mapping: iter
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }
}
