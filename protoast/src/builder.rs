use std::{
    collections::HashMap,
    fmt, fs, iter,
    path::Path,
};

use protoast_parse::ast::Span;
use tracing::{debug, trace, warn};

use crate::{
    ast::{Ast, File, FileId, NamedType, Position, ServiceId},
    construct::Constructor,
    error::{BuildError, ErrorKind},
    file::{path_to_file_name, ChainFiles, Files, GoogleFiles, IncludeFiles},
    lines::LineResolver,
    namespace::{NamespaceId, Namespaces},
    prefetch::Prefetcher,
    Error,
};

/// Builds resolved syntax trees from protobuf source files.
///
/// Files are built on demand with [`build_file`](Builder::build_file), together with everything
/// they import. Each file is processed at most once: later requests for the same import path return
/// the cached result.
///
/// # Examples
///
/// ```
/// # use std::fs;
/// # use protoast::{Builder, ast::Type};
/// # let dir = tempfile::tempdir().unwrap();
/// fs::write(dir.path().join("users.proto"), "
///     package sample;
///     message User { string id = 1; }
/// ").unwrap();
/// fs::write(dir.path().join("sample.proto"), "
///     package sample;
///     import 'users.proto';
///     message Response { User user = 1; }
/// ").unwrap();
///
/// let mut builder = Builder::new([dir.path()]);
/// let sample = builder.build_file("sample.proto").unwrap();
/// let users = builder.build_file("users.proto").unwrap();
///
/// let ast = builder.ast();
/// let response = ast[sample].message(ast, "Response").unwrap();
/// let user = ast[response].field(ast, "user").unwrap();
/// assert_eq!(ast[user].ty, Type::Message(ast[users].message(ast, "User").unwrap()));
/// ```
pub struct Builder {
    files: Box<dyn Files>,
    pub(crate) ast: Ast,
    pub(crate) namespaces: Namespaces,
    states: HashMap<String, FileState>,
    stack: Vec<Frame>,
    sink: Box<dyn FnMut(BuildError)>,
    pub(crate) fatal: Option<Error>,
}

#[derive(Debug, Clone, Copy)]
struct FileState {
    file: FileId,
    errors: usize,
}

#[derive(Debug)]
struct Frame {
    name: String,
    errors: usize,
}

/// The file currently being built.
#[derive(Debug)]
pub(crate) struct FileCtx {
    pub id: FileId,
    pub ns: NamespaceId,
    lines: LineResolver,
}

impl FileCtx {
    pub fn position(&self, span: &Span) -> Position {
        self.lines.position(span)
    }
}

impl Builder {
    /// Creates a new [`Builder`] which searches the given include paths for files.
    ///
    /// In addition to the given include paths, the builder is able to import the well-known files
    /// served by [`GoogleFiles`].
    pub fn new<I, P>(includes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut files = ChainFiles::new();

        for include in includes {
            files.add(IncludeFiles::new(include.as_ref().to_owned()));
        }

        files.add(GoogleFiles::new());

        Builder::with_files(files)
    }

    /// Creates a new [`Builder`] with a custom [`Files`] implementation for locating files.
    pub fn with_files<F>(files: F) -> Self
    where
        F: Files + 'static,
    {
        Builder {
            files: Box::new(files),
            ast: Ast::default(),
            namespaces: Namespaces::default(),
            states: HashMap::new(),
            stack: Vec::new(),
            sink: Box::new(|err| warn!("{:?}", err)),
            fatal: None,
        }
    }

    /// Sets the callback receiving each problem found while building files.
    ///
    /// By default, problems are logged as warnings.
    pub fn on_error<F>(&mut self, sink: F) -> &mut Self
    where
        F: FnMut(BuildError) + 'static,
    {
        self.sink = Box::new(sink);
        self
    }

    /// Sets the function naming nested scopes, given the name of the enclosing scope and the name
    /// of the message. The default joins them with `::`.
    ///
    /// The names are used as keys for [`scope`](Builder::scope).
    pub fn scope_naming(&mut self, naming: fn(&str, &str) -> String) -> &mut Self {
        self.namespaces.set_naming(naming);
        self
    }

    /// The store holding every node built so far.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Builds the file with the given import path, and any files it imports.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or one of its imports cannot be opened or parsed, or if the
    /// imports form a cycle. If problems were reported to the [error callback](Builder::on_error),
    /// the error holds their count and the partially built file.
    pub fn build_file(&mut self, name: &str) -> Result<FileId, Error> {
        if let Some(state) = self.states.get(name) {
            trace!(file = name, "file already built");
            return state.result(name);
        }

        if let Some(index) = self.stack.iter().position(|frame| frame.name == name) {
            let cycle = self.stack[index..]
                .iter()
                .map(|frame| frame.name.as_str())
                .chain(iter::once(name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(Error::from_kind(ErrorKind::CircularImport {
                name: name.to_owned(),
                cycle,
            }));
        }

        let source = self.files.open_file(name)?;
        let parsed = protoast_parse::parse(name, source.content())?;
        let display_name = match self.files.absolute_path(name) {
            Ok(path) => path.display().to_string(),
            Err(_) => name.to_owned(),
        };

        debug!(file = name, "building file");
        let id = self.ast.files.alloc(File {
            name: name.to_owned(),
            path: source.path,
            package: String::new(),
            syntax: String::new(),
            imports: Vec::new(),
            types: Vec::new(),
            extensions: Vec::new(),
            services: Vec::new(),
            options: Vec::new(),
            go_path: String::new(),
            go_pkg: String::new(),
        });
        let ctx = FileCtx {
            id,
            ns: self.namespaces.file(name),
            lines: LineResolver::new(display_name, &source.content),
        };
        self.ast.set_position(id, None, ctx.position(&(0..0)));

        self.stack.push(Frame {
            name: name.to_owned(),
            errors: 0,
        });
        let prefetched = Prefetcher::run(self, &ctx, &parsed);
        if self.fatal.is_none() {
            Constructor::run(self, &ctx, &prefetched, &parsed);
        }
        let errors = self.stack.pop().map_or(0, |frame| frame.errors);

        if let Some(err) = self.fatal.take() {
            debug!(file = name, "abandoning file");
            self.namespaces.reset(ctx.ns);
            return Err(err);
        }

        let file = &mut self.ast[id];
        if file.go_pkg.is_empty() {
            file.go_pkg = file.package.clone();
        }

        self.namespaces.finalize(ctx.ns);
        let state = FileState { file: id, errors };
        self.states.insert(name.to_owned(), state);
        debug!(file = name, errors, "built file");
        state.result(name)
    }

    /// Builds every `.proto` file in the same directory as `file`, which must already be built.
    ///
    /// The files are built in name order. `file` itself is included in the result.
    pub fn same_dir_protos(&mut self, file: FileId) -> Result<Vec<FileId>, Error> {
        let name = self.ast[file].name.clone();
        let dir = Path::new(&name)
            .parent()
            .map(Path::to_owned)
            .unwrap_or_default();
        let path = self.files.absolute_path(&name)?;
        let search = path.parent().map(Path::to_owned).unwrap_or_default();

        let mut names = Vec::new();
        for entry in fs::read_dir(&search)? {
            let entry_path = entry?.path();
            if entry_path.extension().map_or(true, |ext| ext != "proto") {
                continue;
            }
            let entry_name = match entry_path.file_name() {
                Some(entry_name) => entry_name,
                None => continue,
            };
            if let Some(import_name) = path_to_file_name(&dir.join(entry_name)) {
                names.push(import_name);
            }
        }
        names.sort();

        names
            .iter()
            .map(|import_name| self.build_file(import_name))
            .collect()
    }

    /// The namespace of a file which has been built or is being built.
    pub fn namespace(&self, name: &str) -> Option<NamespaceView<'_>> {
        self.view(name)
    }

    /// A nested scope, by the name given by the [scope naming function](Builder::scope_naming),
    /// such as `foo.proto::Outer::Inner`.
    pub fn scope(&self, name: &str) -> Option<NamespaceView<'_>> {
        self.view(name)
    }

    fn view(&self, name: &str) -> Option<NamespaceView<'_>> {
        self.namespaces.get(name).map(|ns| NamespaceView {
            builder: self,
            ns,
        })
    }

    /// Passes a problem to the error callback, counting it against the file being built.
    pub(crate) fn report(&mut self, err: BuildError) {
        if let Some(frame) = self.stack.last_mut() {
            frame.errors += 1;
        }
        (self.sink)(err);
    }
}

impl FileState {
    fn result(&self, name: &str) -> Result<FileId, Error> {
        if self.errors == 0 {
            Ok(self.file)
        } else {
            Err(Error::from_kind(ErrorKind::Build {
                name: name.to_owned(),
                count: self.errors,
                file: self.file,
            }))
        }
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("ast", &self.ast)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

/// A read-only view of a file namespace or nested scope.
#[derive(Clone, Copy)]
pub struct NamespaceView<'a> {
    builder: &'a Builder,
    ns: NamespaceId,
}

impl<'a> NamespaceView<'a> {
    /// The memoization key of the namespace: the import path for files, or the scope name.
    pub fn name(&self) -> &'a str {
        self.builder.namespaces.name(self.ns)
    }

    /// The package of the enclosing file, or the empty string.
    pub fn package(&self) -> &'a str {
        self.builder.namespaces.package(self.ns)
    }

    /// Whether the enclosing file has been completely processed.
    pub fn is_finalized(&self) -> bool {
        self.builder.namespaces.is_finalized(self.ns)
    }

    /// Resolves a type name as if it were written in this namespace.
    pub fn lookup_type(&self, name: &str) -> Option<NamedType> {
        self.builder
            .namespaces
            .lookup_type(&self.builder.ast, self.ns, name)
    }

    /// Resolves a service name as if it were written in this namespace.
    pub fn lookup_service(&self, name: &str) -> Option<ServiceId> {
        self.builder.namespaces.lookup_service(self.ns, name)
    }
}

impl fmt::Debug for NamespaceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceView")
            .field("name", &self.name())
            .field("package", &self.package())
            .finish()
    }
}

#[cfg(test)]
mod tests;
