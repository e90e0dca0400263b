//! The second pass over a file: fills in the skeletons bound by the first pass with fields,
//! values, options, extensions and services, resolving every type reference.

use std::collections::HashMap;

use protoast_parse::{ast, Visitor};
use tracing::trace;

use crate::{
    ast::{
        Ast, Attr, Comment, EnumId, EnumValue, Extension, ExtensionField, ExtensionId, Hashable,
        Import, MessageField, MessageId, Method, NamedType, NodeId, OneOf, OneofBranch,
        OneofId, OptionCategory, OptionId, Position, Scalar, Service, ServiceId, Type,
    },
    builder::{Builder, FileCtx},
    error::BuildError,
    namespace::{Binding, Conflict, NamespaceId},
    options::{resolve_method_option, resolve_option, OptionScope},
    prefetch::Prefetched,
};

const ANY_FILE: &str = "google/protobuf/any.proto";
const ANY_TYPE: &str = "google.protobuf.Any";

/// Stores the comment attached to a node or one of its attributes.
pub(crate) fn record_comment(
    ast: &mut Ast,
    file: &FileCtx,
    node: impl Into<NodeId>,
    attr: Option<Attr>,
    comment: &ast::Comment,
) {
    ast.set_comment(
        node,
        attr,
        Comment {
            value: comment.text(),
            lines: comment.lines.clone(),
            position: file.position(&comment.span),
        },
    );
}

pub(crate) struct Constructor<'a> {
    builder: &'a mut Builder,
    file: &'a FileCtx,
    prefetched: &'a Prefetched,
    options: &'a OptionScope<'a>,
    ns: NamespaceId,
    context: Context,
}

/// The kind of block being visited.
enum Context {
    File,
    Body(Body),
    Enum(EnumBody),
    Service(ServiceId),
}

/// The body of a message or `extend` block.
struct Body {
    owner: Owner,
    /// Field and oneof names, shared by the fields of nested oneofs.
    names: HashMap<String, Position>,
    numbers: HashMap<i32, Position>,
    oneof: Option<OneofId>,
}

#[derive(Clone, Copy)]
enum Owner {
    Message(MessageId),
    Extension(ExtensionId),
}

struct EnumBody {
    id: EnumId,
    names: HashMap<String, Position>,
    numbers: HashMap<i32, Position>,
    allow_alias: bool,
}

/// Why a type reference did not resolve.
enum Unresolved {
    Unknown,
    Reported,
}

impl Body {
    fn new(owner: Owner) -> Self {
        Body {
            owner,
            names: HashMap::new(),
            numbers: HashMap::new(),
            oneof: None,
        }
    }
}

impl<'a> Constructor<'a> {
    pub fn run(builder: &mut Builder, file: &FileCtx, prefetched: &Prefetched, parsed: &ast::File) {
        let options = OptionScope::new(file, prefetched.imports.values().copied());
        parsed.visit(&mut Constructor {
            builder,
            file,
            prefetched,
            options: &options,
            ns: file.ns,
            context: Context::File,
        });
    }

    fn child(&mut self, ns: NamespaceId, context: Context) -> Constructor<'_> {
        Constructor {
            builder: &mut *self.builder,
            file: self.file,
            prefetched: self.prefetched,
            options: self.options,
            ns,
            context,
        }
    }

    fn position(&self, span: &ast::Span) -> Position {
        self.file.position(span)
    }

    fn record(&mut self, node: impl Into<NodeId> + Copy, span: &ast::Span, comment: Option<&ast::Comment>) {
        let position = self.position(span);
        self.builder.ast.set_position(node, None, position);
        if let Some(comment) = comment {
            record_comment(&mut self.builder.ast, self.file, node, None, comment);
        }
    }

    fn record_attr(&mut self, node: impl Into<NodeId>, attr: Attr, span: &ast::Span) {
        let position = self.position(span);
        self.builder.ast.set_position(node, Some(attr), position);
    }

    fn resolve_options(&mut self, options: &[ast::OptionDef], category: OptionCategory) -> Vec<OptionId> {
        options
            .iter()
            .filter_map(|option| resolve_option(self.builder, self.options, option, category))
            .collect()
    }

    fn lookup_type(&mut self, name: &ast::TypeName) -> Result<Type, Unresolved> {
        let text = name.to_string();
        let bare = text.strip_prefix('.').unwrap_or(&text);

        if name.leading_dot.is_none() {
            if let Some(scalar) = Scalar::from_name(bare) {
                return Ok(Type::Scalar(scalar));
            }
        }

        if bare == ANY_TYPE {
            return match self.builder.build_file(ANY_FILE) {
                Ok(file) => Ok(Type::Any(file)),
                Err(err) => {
                    self.builder.report(BuildError::ImportFailed {
                        name: ANY_FILE.to_owned(),
                        reason: err.to_string(),
                        position: self.position(&name.span()),
                    });
                    Err(Unresolved::Reported)
                }
            };
        }

        match self
            .builder
            .namespaces
            .lookup_type(&self.builder.ast, self.ns, bare)
        {
            Some(ty) => Ok(ty.into()),
            None => {
                trace!(symbol = bare, "unresolved type");
                Err(Unresolved::Unknown)
            }
        }
    }

    /// Resolves the type of a field or method argument, reporting unknown names.
    fn resolve_type(&mut self, name: &ast::TypeName) -> Option<Type> {
        match self.lookup_type(name) {
            Ok(ty) => Some(ty),
            Err(Unresolved::Unknown) => {
                self.builder.report(BuildError::UnknownType {
                    name: name.to_string(),
                    position: self.position(&name.span()),
                });
                None
            }
            Err(Unresolved::Reported) => None,
        }
    }

    /// Claims a field name and number in the current body. Returns false if either is taken.
    ///
    /// Only fields whose type resolved are claimed, so a dropped field reserves nothing.
    fn claim_field(&mut self, name: &ast::Ident, number: i32, number_span: &ast::Span) -> bool {
        let name_position = self.position(&name.span);
        let number_position = self.position(number_span);
        let body = match &mut self.context {
            Context::Body(body) => body,
            _ => return false,
        };

        let mut errors = Vec::new();
        if let Some(previous) = body.names.get(&name.value) {
            errors.push(BuildError::DuplicateFieldName {
                name: name.value.clone(),
                position: name_position.clone(),
                previous: previous.clone(),
            });
        }
        if let Some(previous) = body.numbers.get(&number) {
            errors.push(BuildError::DuplicateFieldNumber {
                number,
                position: number_position.clone(),
                previous: previous.clone(),
            });
        }

        if errors.is_empty() {
            body.names.insert(name.value.clone(), name_position);
            body.numbers.insert(number, number_position);
            return true;
        }
        for err in errors {
            self.builder.report(err);
        }
        false
    }

    /// Adds a field to the message, oneof or extension being visited.
    #[allow(clippy::too_many_arguments)]
    fn add_field(
        &mut self,
        name: &ast::Ident,
        number: i32,
        number_span: &ast::Span,
        ty: Type,
        options: Vec<OptionId>,
        span: &ast::Span,
        comment: Option<&ast::Comment>,
    ) {
        let (owner, oneof) = match &self.context {
            Context::Body(body) => (body.owner, body.oneof),
            _ => return,
        };

        let nodes = &mut self.builder.ast;
        let name_value = name.value.clone();
        let node: NodeId = match (owner, oneof) {
            (Owner::Message(_), Some(oneof)) => {
                let id = nodes.branches.alloc(OneofBranch {
                    name: name_value,
                    sequence: number,
                    ty,
                    options,
                    oneof,
                });
                nodes[oneof].branches.push(id);
                id.into()
            }
            (Owner::Message(message), None) => {
                let id = nodes.fields.alloc(MessageField {
                    name: name_value,
                    sequence: number,
                    ty,
                    options,
                    message,
                });
                nodes[message].fields.push(id);
                id.into()
            }
            (Owner::Extension(extension), _) => {
                let id = nodes.extension_fields.alloc(ExtensionField {
                    name: name_value,
                    sequence: number,
                    ty,
                    options,
                    extension,
                });
                nodes[extension].fields.push(id);
                id.into()
            }
        };

        self.record(node, span, comment);
        self.record_attr(node, Attr::Name, &name.span);
        self.record_attr(node, Attr::Sequence, number_span);
    }

    fn enclosing_message(&self) -> Option<MessageId> {
        match &self.context {
            Context::Body(Body {
                owner: Owner::Message(id),
                ..
            }) => Some(*id),
            _ => None,
        }
    }

    fn visit_extend(&mut self, message: &ast::Message) {
        let name = message.name.strip_prefix('.').unwrap_or(&message.name);
        let position = self.position(&message.name_span);
        let extendee = match self
            .builder
            .namespaces
            .lookup_type(&self.builder.ast, self.ns, name)
        {
            Some(NamedType::Message(id)) => id,
            Some(NamedType::Enum(_)) => {
                self.builder.report(BuildError::ExtendNonMessage {
                    name: message.name.clone(),
                    position,
                });
                return;
            }
            None => {
                self.builder.report(BuildError::ExtendUndeclared {
                    name: message.name.clone(),
                    position,
                });
                return;
            }
        };

        let id = self.builder.ast.extensions.alloc(Extension {
            name: message.name.clone(),
            extendee,
            file: self.file.id,
            parent: self.enclosing_message(),
            fields: Vec::new(),
        });
        let file = self.file.id;
        self.builder.ast[file].extensions.push(id);
        self.record(id, &message.span, message.comment.as_ref());
        self.record_attr(id, Attr::Name, &message.name_span);

        let ns = self.ns;
        message.visit(&mut self.child(ns, Context::Body(Body::new(Owner::Extension(id)))));
    }

    fn go_package(&mut self, option: &ast::OptionDef) {
        let value = match &option.value.kind {
            ast::LiteralKind::String(value) => value.clone(),
            _ => option.value.to_string(),
        };

        let parsed = match value.split(';').collect::<Vec<_>>().as_slice() {
            [pkg] if !pkg.is_empty() => Some((None, pkg.to_string())),
            [path, pkg] if !path.is_empty() && !pkg.is_empty() => {
                Some((Some(path.to_string()), pkg.to_string()))
            }
            _ => None,
        };

        match parsed {
            Some((path, pkg)) => {
                let file = &mut self.builder.ast[self.file.id];
                if let Some(path) = path {
                    file.go_path = path;
                }
                file.go_pkg = pkg;
            }
            None => {
                let position = self.position(&option.value.span);
                self.builder
                    .report(BuildError::InvalidGoPackage { value, position });
            }
        }
    }
}

impl<'a> Visitor for Constructor<'a> {
    fn visit_syntax(&mut self, syntax: &ast::Syntax) {
        let id = self.file.id;
        self.builder.ast[id].syntax = syntax.value.clone();
        self.record_attr(id, Attr::Syntax, &syntax.value_span);
        if let Some(comment) = &syntax.comment {
            record_comment(&mut self.builder.ast, self.file, id, Some(Attr::Syntax), comment);
        }
    }

    fn visit_import(&mut self, import: &ast::Import) {
        let file = match self.prefetched.imports.get(&import.path) {
            Some(&file) => file,
            None => return,
        };

        let id = self.builder.ast.imports.alloc(Import {
            path: import.path.clone(),
            kind: import.kind,
            file,
        });
        let current = self.file.id;
        self.builder.ast[current].imports.push(id);
        self.record(id, &import.span, import.comment.as_ref());
        self.record_attr(id, Attr::Path, &import.path_span);
    }

    fn visit_option(&mut self, option: &ast::OptionDef) {
        let category = match &self.context {
            Context::File => OptionCategory::File,
            Context::Enum(_) => OptionCategory::Enum,
            Context::Service(_) => OptionCategory::Service,
            Context::Body(body) if body.oneof.is_some() => OptionCategory::Oneof,
            Context::Body(_) => OptionCategory::Message,
        };

        if let Context::File = self.context {
            if option.name == "go_package" {
                self.go_package(option);
            }
        }
        if let Context::Enum(body) = &mut self.context {
            if option.name == "allow_alias" {
                body.allow_alias =
                    matches!(&option.value.kind, ast::LiteralKind::Ident(value) if value == "true");
            }
        }

        let id = match resolve_option(self.builder, self.options, option, category) {
            Some(id) => id,
            None => return,
        };
        let nodes = &mut self.builder.ast;
        match &self.context {
            Context::File => nodes[self.file.id].options.push(id),
            Context::Enum(body) => nodes[body.id].options.push(id),
            Context::Service(service) => nodes[*service].options.push(id),
            Context::Body(Body {
                oneof: Some(oneof), ..
            }) => nodes[*oneof].options.push(id),
            Context::Body(Body {
                owner: Owner::Message(message),
                ..
            }) => nodes[*message].options.push(id),
            Context::Body(Body {
                owner: Owner::Extension(_),
                ..
            }) => trace!(option = %option.name, "dropped option of extend block"),
        }
    }

    fn visit_message(&mut self, message: &ast::Message) {
        if message.is_extend {
            return self.visit_extend(message);
        }

        let id = match self.prefetched.skeleton(&message.span) {
            Some(NamedType::Message(id)) => id,
            Some(NamedType::Enum(_)) => panic!("message '{}' has an enum skeleton", message.name),
            None => return,
        };
        if let Context::File = self.context {
            let file = self.file.id;
            self.builder.ast[file].types.push(NamedType::Message(id));
        }

        let ns = self.builder.namespaces.scope(self.ns, &message.name);
        message.visit(&mut self.child(ns, Context::Body(Body::new(Owner::Message(id)))));
    }

    fn visit_enum(&mut self, enm: &ast::Enum) {
        let id = match self.prefetched.skeleton(&enm.span) {
            Some(NamedType::Enum(id)) => id,
            Some(NamedType::Message(_)) => panic!("enum '{}' has a message skeleton", enm.name.value),
            None => return,
        };
        if let Context::File = self.context {
            let file = self.file.id;
            self.builder.ast[file].types.push(NamedType::Enum(id));
        }

        let ns = self.ns;
        enm.visit(&mut self.child(
            ns,
            Context::Enum(EnumBody {
                id,
                names: HashMap::new(),
                numbers: HashMap::new(),
                allow_alias: false,
            }),
        ));
    }

    fn visit_enum_field(&mut self, field: &ast::EnumField) {
        let name_position = self.position(&field.name.span);
        let number_position = self.position(&field.value_span);
        let body = match &mut self.context {
            Context::Enum(body) => body,
            _ => return,
        };

        let mut errors = Vec::new();
        if let Some(previous) = body.names.get(&field.name.value) {
            errors.push(BuildError::DuplicateEnumValueName {
                name: field.name.value.clone(),
                position: name_position.clone(),
                previous: previous.clone(),
            });
        }
        if !body.allow_alias {
            if let Some(previous) = body.numbers.get(&field.value) {
                errors.push(BuildError::DuplicateEnumValueNumber {
                    number: field.value,
                    position: number_position.clone(),
                    previous: previous.clone(),
                });
            }
        }
        if !errors.is_empty() {
            for err in errors {
                self.builder.report(err);
            }
            return;
        }

        body.names.insert(field.name.value.clone(), name_position);
        body.numbers.entry(field.value).or_insert(number_position);
        let enumeration = body.id;

        let options = self.resolve_options(&field.options, OptionCategory::EnumValue);
        let id = self.builder.ast.enum_values.alloc(EnumValue {
            name: field.name.value.clone(),
            integer: field.value,
            options,
            enumeration,
        });
        self.builder.ast[enumeration].values.push(id);
        self.record(id, &field.span, field.comment.as_ref());
        self.record_attr(id, Attr::Name, &field.name.span);
        self.record_attr(id, Attr::Integer, &field.value_span);
    }

    fn visit_normal_field(&mut self, field: &ast::NormalField) {
        let ty = match self.resolve_type(&field.ty) {
            Some(ty) => ty,
            None => return,
        };
        if !self.claim_field(&field.name, field.number, &field.number_span) {
            return;
        }
        let ty = if field.is_optional() {
            Type::Optional(Box::new(ty))
        } else {
            ty
        };
        let ty = if field.is_repeated() {
            Type::Repeated(Box::new(ty))
        } else {
            ty
        };

        let options = self.resolve_options(&field.options, OptionCategory::Field);
        self.add_field(
            &field.name,
            field.number,
            &field.number_span,
            ty,
            options,
            &field.span,
            field.comment.as_ref(),
        );
    }

    fn visit_map_field(&mut self, field: &ast::MapField) {
        let key_name = field.key_ty.to_string();
        let key = match Scalar::from_name(&key_name).and_then(Hashable::new) {
            Some(key) => key,
            None => {
                self.builder.report(BuildError::InvalidMapKeyType {
                    name: key_name,
                    position: self.position(&field.key_ty.span()),
                });
                return;
            }
        };
        let value = match self.lookup_type(&field.value_ty) {
            Ok(value) => value,
            Err(Unresolved::Unknown) => {
                self.builder.report(BuildError::UnknownMapValueType {
                    name: field.value_ty.to_string(),
                    position: self.position(&field.value_ty.span()),
                });
                return;
            }
            Err(Unresolved::Reported) => return,
        };
        if !self.claim_field(&field.name, field.number, &field.number_span) {
            return;
        }

        let options = self.resolve_options(&field.options, OptionCategory::Field);
        self.add_field(
            &field.name,
            field.number,
            &field.number_span,
            Type::Map {
                key,
                value: Box::new(value),
            },
            options,
            &field.span,
            field.comment.as_ref(),
        );
    }

    fn visit_oneof(&mut self, oneof: &ast::Oneof) {
        let message = match self.enclosing_message() {
            Some(message) => message,
            None => return,
        };

        let position = self.position(&oneof.name.span);
        if let Context::Body(body) = &mut self.context {
            if let Some(previous) = body.names.get(&oneof.name.value) {
                let previous = previous.clone();
                self.builder.report(BuildError::DuplicateFieldName {
                    name: oneof.name.value.clone(),
                    position,
                    previous,
                });
                return;
            }
            body.names.insert(oneof.name.value.clone(), position);
        }

        let nodes = &mut self.builder.ast;
        let id = nodes.oneofs.alloc(OneOf {
            name: oneof.name.value.clone(),
            parent: message,
            branches: Vec::new(),
            options: Vec::new(),
        });
        let field = nodes.fields.alloc(MessageField {
            name: oneof.name.value.clone(),
            sequence: -1,
            ty: Type::OneOf(id),
            options: Vec::new(),
            message,
        });
        nodes[message].fields.push(field);
        self.record(id, &oneof.span, oneof.comment.as_ref());
        self.record_attr(id, Attr::Name, &oneof.name.span);
        self.record(field, &oneof.span, None);
        self.record_attr(field, Attr::Name, &oneof.name.span);

        if let Context::Body(body) = &mut self.context {
            body.oneof = Some(id);
        }
        oneof.visit(self);
        if let Context::Body(body) = &mut self.context {
            body.oneof = None;
        }
    }

    fn visit_oneof_field(&mut self, field: &ast::OneofField) {
        let ty = match self.resolve_type(&field.ty) {
            Some(ty) => ty,
            None => return,
        };
        if !self.claim_field(&field.name, field.number, &field.number_span) {
            return;
        }

        let options = self.resolve_options(&field.options, OptionCategory::Field);
        self.add_field(
            &field.name,
            field.number,
            &field.number_span,
            ty,
            options,
            &field.span,
            field.comment.as_ref(),
        );
    }

    fn visit_service(&mut self, service: &ast::Service) {
        let file = self.file.id;
        let id = self.builder.ast.services.alloc(Service {
            name: service.name.value.clone(),
            file,
            methods: Vec::new(),
            options: Vec::new(),
        });

        let position = self.position(&service.name.span);
        let result = self.builder.namespaces.set_node(
            self.ns,
            &service.name.value,
            Binding::Service(id),
            position.clone(),
        );
        if let Err(conflict) = result {
            let name = service.name.value.clone();
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
            return;
        }

        self.builder.ast[file].services.push(id);
        self.record(id, &service.span, service.comment.as_ref());
        self.record_attr(id, Attr::Name, &service.name.span);

        let ns = self.ns;
        service.visit(&mut self.child(ns, Context::Service(id)));
    }

    fn visit_rpc(&mut self, rpc: &ast::Rpc) {
        let service = match self.context {
            Context::Service(service) => service,
            _ => return,
        };

        let input = self.resolve_type(&rpc.input_ty);
        let output = self.resolve_type(&rpc.output_ty);
        let (input, output) = match (input, output) {
            (Some(input), Some(output)) => (input, output),
            _ => return,
        };
        let input = if rpc.client_streaming {
            Type::Stream(Box::new(input))
        } else {
            input
        };
        let output = if rpc.server_streaming {
            Type::Stream(Box::new(output))
        } else {
            output
        };

        let file = self.file.id;
        let id = self.builder.ast.methods.alloc(Method {
            name: rpc.name.value.clone(),
            file,
            service,
            input,
            output,
            options: Vec::new(),
        });

        let service_name = self.builder.ast[service].name.clone();
        let key = format!("{}::{}", service_name, rpc.name.value);
        let position = self.position(&rpc.name.span);
        if let Err(Conflict::Local(previous) | Conflict::Imported(previous)) =
            self.builder
                .namespaces
                .set_node(self.ns, &key, Binding::Method(id), position.clone())
        {
            self.builder.report(BuildError::DuplicateMethod {
                service: service_name,
                name: rpc.name.value.clone(),
                position,
                previous,
            });
            return;
        }

        let options = rpc
            .options
            .iter()
            .filter_map(|option| resolve_method_option(self.builder, self.options, option))
            .collect();
        let nodes = &mut self.builder.ast;
        nodes[id].options = options;
        nodes[service].methods.push(id);

        self.record(id, &rpc.span, rpc.comment.as_ref());
        self.record_attr(id, Attr::Name, &rpc.name.span);
        self.record_attr(id, Attr::Input, &rpc.input_ty.span());
        self.record_attr(id, Attr::Output, &rpc.output_ty.span());
    }

    fn visit_group(&mut self, _: &ast::Group) {}
}
