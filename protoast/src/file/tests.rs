use std::{fs, path::PathBuf};

use crate::Error;

use super::{ChainFiles, File, Files, GoogleFiles, IncludeFiles, MapFiles};

struct EmptyFiles;

impl Files for EmptyFiles {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        Err(Error::file_not_found(name))
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        Err(Error::file_not_found(name))
    }
}

struct FailingFiles;

impl Files for FailingFiles {
    fn open_file(&self, _: &str) -> Result<File, Error> {
        Err(Error::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "failed to load file!",
        )))
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        Err(Error::file_not_found(name))
    }
}

struct SingleFile(&'static str, &'static str);

impl Files for SingleFile {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        if name == self.0 {
            File::from_source(name, self.1)
        } else {
            Err(Error::file_not_found(name))
        }
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf, Error> {
        if name == self.0 {
            Ok(PathBuf::from("/virtual").join(name))
        } else {
            Err(Error::file_not_found(name))
        }
    }
}

#[test]
fn chain_files() {
    let mut files = ChainFiles::new();
    files
        .add(EmptyFiles)
        .add(SingleFile("foo.proto", "syntax = 'proto3';"))
        .add(FailingFiles);

    assert_eq!(
        files.open_file("foo.proto").unwrap().content(),
        "syntax = 'proto3';"
    );
    assert_eq!(
        files.absolute_path("foo.proto").unwrap(),
        PathBuf::from("/virtual/foo.proto")
    );

    let err = files.open_file("notfound.proto").unwrap_err();
    assert!(!err.is_file_not_found());
    assert!(err.is_io());

    assert!(files
        .absolute_path("notfound.proto")
        .unwrap_err()
        .is_file_not_found());
}

#[test]
fn chain_files_empty() {
    let files = ChainFiles::new();
    assert!(files.open_file("foo.proto").unwrap_err().is_file_not_found());
}

#[test]
fn include_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/foo.proto"), "message Foo {}").unwrap();

    let files = IncludeFiles::new(dir.path().to_owned());

    let file = files.open_file("sub/foo.proto").unwrap();
    assert_eq!(file.content(), "message Foo {}");
    assert_eq!(file.path(), Some(dir.path().join("sub/foo.proto").as_path()));

    let path = files.absolute_path("sub/foo.proto").unwrap();
    assert!(path.is_absolute());
    assert!(path.ends_with("sub/foo.proto"));

    let err = files.open_file("sub/bar.proto").unwrap_err();
    assert!(err.is_file_not_found());
    assert_eq!(err.file(), Some("sub/bar.proto"));

    assert!(files
        .absolute_path("../foo.proto")
        .unwrap_err()
        .is_file_not_found());
}

#[test]
fn include_files_invalid_utf8() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.proto"), b"message \xff {}").unwrap();

    let files = IncludeFiles::new(dir.path().to_owned());
    let err = files.open_file("bad.proto").unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn map_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actual.proto");
    fs::write(&path, "message Foo {}").unwrap();

    let mut files = MapFiles::new();
    files
        .insert("mapped/foo.proto", &path)
        .insert("missing.proto", dir.path().join("missing.proto"));

    assert_eq!(
        files.open_file("mapped/foo.proto").unwrap().content(),
        "message Foo {}"
    );
    assert_eq!(files.absolute_path("mapped/foo.proto").unwrap(), path);
    assert!(files.open_file("actual.proto").unwrap_err().is_file_not_found());
    assert!(files.open_file("missing.proto").unwrap_err().is_file_not_found());
    assert!(files
        .absolute_path("unmapped.proto")
        .unwrap_err()
        .is_file_not_found());
}

#[test]
fn map_files_from_iter() {
    let files: MapFiles = vec![("a.proto", "/tmp/a.proto")].into_iter().collect();
    assert_eq!(
        files.absolute_path("a.proto").unwrap(),
        PathBuf::from("/tmp/a.proto")
    );
}

#[test]
fn google_files() {
    let files = GoogleFiles::new();

    for name in [
        "google/protobuf/any.proto",
        "google/protobuf/descriptor.proto",
        "google/protobuf/empty.proto",
    ] {
        let file = files.open_file(name).unwrap();
        assert!(file.content().contains("package google.protobuf;"));
        assert_eq!(file.path(), None);
        protoast_parse::parse(name, file.content()).unwrap();
    }

    assert!(files
        .open_file("google/protobuf/notfound.proto")
        .unwrap_err()
        .is_file_not_found());
}
