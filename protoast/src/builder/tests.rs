use std::fs;

use tempfile::TempDir;

use super::*;

fn with_current_dir(path: impl AsRef<Path>, f: impl FnOnce()) {
    use std::{
        env::{current_dir, set_current_dir},
        sync::Mutex,
    };

    use once_cell::sync::Lazy;
    use scopeguard::defer;

    static CURRENT_DIR_LOCK: Lazy<Mutex<()>> = Lazy::new(Default::default);

    let _lock = CURRENT_DIR_LOCK
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let prev_dir = current_dir().unwrap();
    defer!({
        let _ = set_current_dir(prev_dir);
    });

    set_current_dir(path).unwrap();
    f();
}

fn write_files(dir: &TempDir, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

#[test]
fn same_dir_protos_relative_include() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        &dir,
        &[
            ("pkg/a.proto", "package pkg; import 'pkg/b.proto'; message A { B b = 1; }"),
            ("pkg/b.proto", "package pkg; message B {}"),
            ("pkg/notes.txt", "not a proto file"),
            ("other.proto", "package other;"),
        ],
    );

    with_current_dir(dir.path(), || {
        let mut builder = Builder::new(["."]);
        let a = builder.build_file("pkg/a.proto").unwrap();
        let files = builder.same_dir_protos(a).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|&file| builder.ast[file].name.as_str())
            .collect();
        assert_eq!(names, ["pkg/a.proto", "pkg/b.proto"]);
        assert_eq!(files[0], a);
        assert_eq!(
            builder.ast[a].path.as_deref(),
            Some(Path::new("./pkg/a.proto"))
        );
        assert!(builder.states.contains_key("pkg/b.proto"));
        assert!(!builder.states.contains_key("other.proto"));
    });
}

#[test]
fn circular_import_unwinds() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        &dir,
        &[
            ("a.proto", "import 'b.proto';"),
            ("b.proto", "import 'a.proto';"),
        ],
    );

    let mut builder = Builder::new([dir.path()]);
    let err = builder.build_file("a.proto").unwrap_err();
    match err.kind() {
        ErrorKind::CircularImport { name, cycle } => {
            assert_eq!(name, "a.proto");
            assert_eq!(cycle, "a.proto -> b.proto -> a.proto");
        }
        kind => panic!("unexpected error {:?}", kind),
    }

    assert!(builder.stack.is_empty());
    assert!(builder.fatal.is_none());
    assert!(builder.states.is_empty());
    assert!(builder.namespaces.get("a.proto").is_none());
    assert!(builder.namespaces.get("b.proto").is_none());
}

#[test]
fn errors_are_counted_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        &dir,
        &[
            ("dep.proto", "message Dep { Missing m = 1; }"),
            ("root.proto", "import 'dep.proto'; message Root { Dep d = 1; Gone g = 2; }"),
        ],
    );

    let mut builder = Builder::new([dir.path()]);
    builder.on_error(|_| ());
    assert!(builder.build_file("root.proto").is_err());

    assert_eq!(builder.states["dep.proto"].errors, 1);
    // The failed import and the unknown field type.
    assert_eq!(builder.states["root.proto"].errors, 2);
}
