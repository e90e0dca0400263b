use std::path::PathBuf;

use super::{File, Files};
use crate::Error;

/// An implementation of [`Files`] which serves the well-known files `google/protobuf/any.proto`,
/// `google/protobuf/descriptor.proto` and `google/protobuf/empty.proto`.
///
/// The descriptor file is needed to declare custom options, which extend the `*Options` messages it defines.
#[derive(Debug, Default)]
pub struct GoogleFiles {
    _priv: (),
}

impl GoogleFiles {
    /// Creates a new instance of [`GoogleFiles`].
    pub fn new() -> Self {
        Default::default()
    }

    fn source(name: &str) -> Option<&'static str> {
        match name {
            "google/protobuf/any.proto" => Some(ANY),
            "google/protobuf/descriptor.proto" => Some(DESCRIPTOR),
            "google/protobuf/empty.proto" => Some(EMPTY),
            _ => None,
        }
    }
}

macro_rules! include_proto {
    ($name:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/protobuf/google/protobuf/",
            $name
        ))
    };
}

pub(crate) const ANY: &str = include_proto!("any.proto");
pub(crate) const DESCRIPTOR: &str = include_proto!("descriptor.proto");
pub(crate) const EMPTY: &str = include_proto!("empty.proto");

impl Files for GoogleFiles {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        match GoogleFiles::source(name) {
            Some(source) => File::from_source(name, source),
            None => Err(Error::file_not_found(name)),
        }
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        match GoogleFiles::source(name) {
            Some(_) => Ok(PathBuf::from(name)),
            None => Err(Error::file_not_found(name)),
        }
    }
}
