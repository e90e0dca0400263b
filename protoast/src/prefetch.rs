//! The first pass over a file: binds every message and enum name, and builds imports, so that the
//! second pass can resolve references regardless of declaration order.

use std::collections::HashMap;

use indexmap::IndexMap;
use protoast_parse::{ast, Visitor};
use tracing::trace;

use crate::{
    ast::{Attr, Enum, FileId, Message, MessageId, NamedType},
    builder::{Builder, FileCtx},
    construct::record_comment,
    error::BuildError,
    namespace::{Binding, Conflict, NamespaceId, PackageConflict},
    Error,
};

/// What the first pass hands to the second.
#[derive(Debug, Default)]
pub(crate) struct Prefetched {
    /// Imports which produced a file, by import path, in source order.
    pub imports: IndexMap<String, FileId>,
    /// The skeleton of each message and enum, keyed by the start of its declaration. Duplicate
    /// declarations map to `None`.
    skeletons: HashMap<usize, Option<NamedType>>,
}

impl Prefetched {
    /// The skeleton created for the type declared at `span`.
    ///
    /// # Panics
    ///
    /// Panics if the first pass did not see the declaration.
    pub fn skeleton(&self, span: &ast::Span) -> Option<NamedType> {
        match self.skeletons.get(&span.start) {
            Some(ty) => *ty,
            None => panic!("no skeleton recorded for type at offset {}", span.start),
        }
    }
}

pub(crate) struct Prefetcher<'a> {
    builder: &'a mut Builder,
    file: &'a FileCtx,
    ns: NamespaceId,
    parent: Option<MessageId>,
    out: &'a mut Prefetched,
}

impl<'a> Prefetcher<'a> {
    pub fn run(builder: &mut Builder, file: &FileCtx, parsed: &ast::File) -> Prefetched {
        let mut out = Prefetched::default();
        parsed.visit(&mut Prefetcher {
            builder,
            file,
            ns: file.ns,
            parent: None,
            out: &mut out,
        });
        out
    }

    fn bind(&mut self, name: &ast::Ident, span: &ast::Span, ty: NamedType) -> bool {
        let position = self.file.position(&name.span);
        let result = self.builder.namespaces.set_node(
            self.ns,
            &name.value,
            Binding::Type(ty),
            position.clone(),
        );

        match result {
            Ok(()) => {
                self.out.skeletons.insert(span.start, Some(ty));
                true
            }
            Err(conflict) => {
                self.out.skeletons.insert(span.start, None);
                let name = name.value.clone();
                self.builder.report(match conflict {
                    Conflict::Local(previous) => BuildError::DuplicateType {
                        name,
                        position,
                        previous,
                    },
                    Conflict::Imported(previous) => BuildError::DuplicateImportedType {
                        name,
                        position,
                        previous,
                    },
                });
                false
            }
        }
    }

    fn attach_import(&mut self, import: &ast::Import, file: FileId) {
        let import_ns = self.builder.namespaces.file(&self.builder.ast[file].name);
        if self.builder.namespaces.with_import(self.ns, import_ns) {
            trace!(file = %import.path, "attached import");
            self.out.imports.insert(import.path.clone(), file);
        }
    }

    fn import_failed(&mut self, import: &ast::Import, err: &Error) {
        self.builder.report(BuildError::ImportFailed {
            name: import.path.clone(),
            reason: err.to_string(),
            position: self.file.position(&import.path_span),
        });
    }
}

impl<'a> Visitor for Prefetcher<'a> {
    fn visit_package(&mut self, package: &ast::Package) {
        let name = package.name.to_string();
        let name = name.strip_prefix('.').unwrap_or(&name);
        let position = self.file.position(&package.name.span());

        match self
            .builder
            .namespaces
            .set_package(self.ns, name, position.clone())
        {
            Ok(()) => {
                let id = self.file.id;
                self.builder.ast[id].package = name.to_owned();
                self.builder
                    .ast
                    .set_position(id, Some(Attr::Package), position);
                if let Some(comment) = &package.comment {
                    record_comment(&mut self.builder.ast, self.file, id, Some(Attr::Package), comment);
                }
            }
            Err(PackageConflict::NestedScope) => self.builder.report(BuildError::NestedScope {
                statement: "package",
                position,
            }),
            Err(PackageConflict::Conflicting { previous }) => {
                self.builder.report(BuildError::ConflictingPackage {
                    package: name.to_owned(),
                    previous,
                    position,
                })
            }
        }
    }

    fn visit_import(&mut self, import: &ast::Import) {
        if self.builder.fatal.is_some() {
            return;
        }
        if self.parent.is_some() {
            self.builder.report(BuildError::NestedScope {
                statement: "import",
                position: self.file.position(&import.span),
            });
            return;
        }

        match self.builder.build_file(&import.path) {
            Ok(file) => self.attach_import(import, file),
            Err(err) if err.is_circular_import() => self.builder.fatal = Some(err),
            Err(err) => {
                if let Some(file) = err.partial_file() {
                    self.attach_import(import, file);
                }
                self.import_failed(import, &err);
            }
        }
    }

    fn visit_message(&mut self, message: &ast::Message) {
        // Extended types are resolved by the second pass, once every import is bound.
        if message.is_extend {
            return;
        }

        let id = self.builder.ast.messages.alloc(Message {
            name: message.name.clone(),
            file: self.file.id,
            parent: self.parent,
            fields: Vec::new(),
            types: Vec::new(),
            options: Vec::new(),
        });
        let name = ast::Ident {
            value: message.name.clone(),
            span: message.name_span.clone(),
        };
        if !self.bind(&name, &message.span, NamedType::Message(id)) {
            return;
        }

        let nodes = &mut self.builder.ast;
        if let Some(parent) = self.parent {
            nodes[parent].types.push(NamedType::Message(id));
        }
        nodes.set_position(id, None, self.file.position(&message.span));
        nodes.set_position(id, Some(Attr::Name), self.file.position(&message.name_span));
        if let Some(comment) = &message.comment {
            record_comment(nodes, self.file, id, None, comment);
        }

        let ns = self.builder.namespaces.scope(self.ns, &message.name);
        message.visit(&mut Prefetcher {
            builder: &mut *self.builder,
            file: self.file,
            ns,
            parent: Some(id),
            out: &mut *self.out,
        });
    }

    fn visit_enum(&mut self, enm: &ast::Enum) {
        let id = self.builder.ast.enums.alloc(Enum {
            name: enm.name.value.clone(),
            file: self.file.id,
            parent: self.parent,
            values: Vec::new(),
            options: Vec::new(),
        });
        if !self.bind(&enm.name, &enm.span, NamedType::Enum(id)) {
            return;
        }

        let nodes = &mut self.builder.ast;
        if let Some(parent) = self.parent {
            nodes[parent].types.push(NamedType::Enum(id));
        }
        nodes.set_position(id, None, self.file.position(&enm.span));
        nodes.set_position(id, Some(Attr::Name), self.file.position(&enm.name.span));
        if let Some(comment) = &enm.comment {
            record_comment(nodes, self.file, id, None, comment);
        }
    }

    fn visit_service(&mut self, _: &ast::Service) {}

    fn visit_group(&mut self, _: &ast::Group) {}
}
