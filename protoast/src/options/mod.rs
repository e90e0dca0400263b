//! Resolution of option statements against the extensions declaring them.
//!
//! An option is looked up among the `extend google.protobuf.*Options` blocks of the current
//! file and its imports. Once the declaring field is found, its type governs how the option
//! literal is converted into an [`OptionValue`].

mod name;
#[cfg(test)]
mod tests;

use std::{iter, path::Path};

use indexmap::IndexMap;
use protoast_parse::ast;
use tracing::trace;

use crate::{
    ast::{
        Attr, EnumId, ExtensionId, FileId, MessageId, MethodOption, MethodOptionId,
        MethodOptionValue, NamedType, NodeId, OptionCategory, OptionDef, OptionId, OptionValue,
        Scalar, Type, ValueId,
    },
    builder::{Builder, FileCtx},
    construct::record_comment,
    error::BuildError,
};

use self::name::normalize;

/// Built-in options which are accepted without a declaring extension.
fn is_ignored(category: OptionCategory, name: &str) -> bool {
    if name == "deprecated" {
        return true;
    }

    match category {
        OptionCategory::File => matches!(
            name,
            "optimize_for"
                | "go_package"
                | "java_package"
                | "java_outer_classname"
                | "csharp_namespace"
                | "objc_class_prefix"
                | "cc_enable_arenas"
                | "java_multiple_files"
                | "java_generic_services"
                | "cc_generic_services"
                | "py_generic_services"
                | "java_string_check_utf8"
                | "php_namespace"
                | "php_class_prefix"
                | "php_metadata_namespace"
                | "ruby_package"
                | "swift_prefix"
        ),
        OptionCategory::Field => matches!(
            name,
            "default"
                | "packed"
                | "type_name"
                | "type_extendee"
                | "default_value"
                | "oneof_index"
                | "json_name"
                | "retention"
                | "targets"
                | "edition_defaults"
                | "feature_support"
                | "lazy"
                | "unverified_lazy"
                | "ctype"
                | "jstype"
                | "weak"
                | "debug_redact"
        ),
        OptionCategory::Message => matches!(
            name,
            "map_entry" | "message_set_wire_format" | "no_standard_descriptor_accessor"
        ),
        OptionCategory::Enum => name == "allow_alias",
        OptionCategory::Method => name == "idempotency_level",
        OptionCategory::Oneof | OptionCategory::EnumValue | OptionCategory::Service => false,
    }
}

/// Where an option is declared.
pub(crate) struct OptionScope<'a> {
    pub file: &'a FileCtx,
    /// The files whose extensions may declare the option: the current file and its imports.
    pub candidates: Vec<FileId>,
}

impl<'a> OptionScope<'a> {
    pub fn new(file: &'a FileCtx, imports: impl IntoIterator<Item = FileId>) -> Self {
        OptionScope {
            file,
            candidates: iter::once(file.id).chain(imports).collect(),
        }
    }
}

/// The outcome of looking up an option name.
enum Lookup {
    Ignored,
    Found { extension: ExtensionId, ty: Type },
}

/// Resolves an option attached to a declaration of the given category.
///
/// Returns `None` if the option is dropped because no extension declares it.
pub(crate) fn resolve_option(
    builder: &mut Builder,
    scope: &OptionScope<'_>,
    option: &ast::OptionDef,
    category: OptionCategory,
) -> Option<OptionId> {
    let (name, lookup) = lookup(builder, scope, option, category)?;

    let (extension, value) = match lookup {
        Lookup::Ignored => (None, convert_untyped(builder, scope.file, &option.value)),
        Lookup::Found { extension, ty } => {
            let value = Converter {
                builder: &mut *builder,
                file: scope.file,
                name: &name,
            }
            .convert(&ty, &option.value);
            (Some(extension), value)
        }
    };

    let id = builder.ast.options.alloc(OptionDef {
        name,
        category,
        extension,
        value,
    });
    record_option(builder, scope.file, id, option);
    Some(id)
}

/// Resolves an option of an `rpc` method, keeping the entries of an aggregate value as flat
/// name/value pairs.
pub(crate) fn resolve_method_option(
    builder: &mut Builder,
    scope: &OptionScope<'_>,
    option: &ast::OptionDef,
) -> Option<MethodOptionId> {
    let (name, lookup) = lookup(builder, scope, option, OptionCategory::Method)?;

    let values = match &option.value.kind {
        ast::LiteralKind::Map(entries) => entries
            .iter()
            .map(|entry| MethodOptionValue {
                name: entry.name.value.clone(),
                value: literal_text(&entry.value),
            })
            .collect(),
        _ => vec![MethodOptionValue {
            name: name.clone(),
            value: literal_text(&option.value),
        }],
    };

    let (extension, value) = match lookup {
        Lookup::Ignored => (None, convert_untyped(builder, scope.file, &option.value)),
        Lookup::Found { extension, ty } => {
            let value = Converter {
                builder: &mut *builder,
                file: scope.file,
                name: &name,
            }
            .convert(&ty, &option.value);
            (Some(extension), value)
        }
    };

    let id = builder.ast.method_options.alloc(MethodOption {
        name,
        extension,
        values,
        value,
    });
    record_option(builder, scope.file, id, option);
    Some(id)
}

fn record_option(
    builder: &mut Builder,
    file: &FileCtx,
    id: impl Into<NodeId> + Copy,
    option: &ast::OptionDef,
) {
    builder
        .ast
        .set_position(id, None, file.position(&option.span));
    builder
        .ast
        .set_position(id, Some(Attr::Name), file.position(&option.name_span));
    builder
        .ast
        .set_position(id, Some(Attr::Value), file.position(&option.value.span));
    if let Some(comment) = &option.comment {
        record_comment(&mut builder.ast, file, id, None, comment);
    }
}

fn literal_text(literal: &ast::Literal) -> String {
    match &literal.kind {
        ast::LiteralKind::String(value) => value.clone(),
        _ => literal.to_string(),
    }
}

/// Normalizes the option name and finds the extension field declaring it, reporting problems.
fn lookup(
    builder: &mut Builder,
    scope: &OptionScope<'_>,
    option: &ast::OptionDef,
    category: OptionCategory,
) -> Option<(String, Lookup)> {
    let position = scope.file.position(&option.name_span);
    let name = match normalize(&option.name) {
        Ok(name) => name,
        Err(reason) => {
            builder.report(BuildError::InvalidOptionName {
                name: option.name.clone(),
                reason,
                position,
            });
            return None;
        }
    };

    if !name.extension && is_ignored(category, &name.name) {
        trace!(option = %name.name, "built-in option");
        return Some((name.name, Lookup::Ignored));
    }

    match find_extension_field(builder, scope, &name.name, category) {
        Some((extension, ty)) => Some((name.name, Lookup::Found { extension, ty })),
        None => {
            builder.report(BuildError::UnknownOption {
                name: name.name,
                category,
                position,
            });
            None
        }
    }
}

/// Finds the extension field declaring an option and the type of the (possibly nested) field
/// the name refers to.
pub(crate) fn find_extension_field(
    builder: &Builder,
    scope: &OptionScope<'_>,
    name: &str,
    category: OptionCategory,
) -> Option<(ExtensionId, Type)> {
    let ast = &builder.ast;
    let current = &ast[scope.file.id];
    let current_dir = Path::new(&current.name).parent();

    let local = !name.contains('.');
    let qualified = if local && !current.package.is_empty() {
        format!("{}.{}", current.package, name)
    } else {
        name.to_owned()
    };

    for &candidate in &scope.candidates {
        let file = &ast[candidate];
        if local {
            if Path::new(&file.name).parent() != current_dir || file.package != current.package {
                continue;
            }
        } else if !file.package.is_empty()
            && !qualified.starts_with(&format!("{}.", file.package))
        {
            continue;
        }

        let option_name = if file.package.is_empty() {
            qualified.as_str()
        } else {
            qualified
                .strip_prefix(&file.package)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(&qualified)
        };

        for &extension in &file.extensions {
            let extension_node = &ast[extension];
            if ast.full_name(NamedType::Message(extension_node.extendee)) != category.extendee() {
                continue;
            }

            for &field in &extension_node.fields {
                let field = &ast[field];
                if field.name == option_name {
                    return Some((extension, field.ty.clone()));
                }

                let rest = option_name
                    .strip_prefix(field.name.as_str())
                    .and_then(|rest| rest.strip_prefix('.'));
                if let Some(ty) = rest.and_then(|rest| dig(builder, &field.ty, rest)) {
                    return Some((extension, ty));
                }
            }
        }
    }

    None
}

/// Follows a dotted path of field names into a message type.
fn dig(builder: &Builder, ty: &Type, path: &str) -> Option<Type> {
    let ast = &builder.ast;
    let message = match ty {
        Type::Message(id) => *id,
        Type::Optional(inner) => return dig(builder, inner, path),
        _ => return None,
    };

    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let field = ast[message]
        .all_fields(ast)
        .into_iter()
        .find(|field| field.name(ast) == head)?;

    match rest {
        None => Some(field.ty(ast).clone()),
        Some(rest) => dig(builder, field.ty(ast), rest),
    }
}

/// Converts a literal with no governing type.
fn convert_untyped(builder: &mut Builder, file: &FileCtx, literal: &ast::Literal) -> Option<ValueId> {
    let value = match &literal.kind {
        ast::LiteralKind::String(value) => OptionValue::String(value.clone()),
        ast::LiteralKind::Array(items) => OptionValue::Array(
            items
                .iter()
                .filter_map(|item| convert_untyped(builder, file, item))
                .collect(),
        ),
        ast::LiteralKind::Map(entries) => {
            let mut map = IndexMap::with_capacity(entries.len());
            for entry in entries {
                if let Some(value) = convert_untyped(builder, file, &entry.value) {
                    map.insert(entry.name.value.clone(), value);
                }
            }
            OptionValue::Map(map)
        }
        _ => OptionValue::Embedded(literal.to_string()),
    };
    Some(alloc_value(builder, file, value, &literal.span))
}

fn alloc_value(
    builder: &mut Builder,
    file: &FileCtx,
    value: OptionValue,
    span: &ast::Span,
) -> ValueId {
    let id = builder.ast.values.alloc(value);
    builder.ast.set_position(id, None, file.position(span));
    id
}

/// Converts literals according to the type of the option field.
struct Converter<'a> {
    builder: &'a mut Builder,
    file: &'a FileCtx,
    name: &'a str,
}

impl<'a> Converter<'a> {
    fn convert(&mut self, ty: &Type, literal: &ast::Literal) -> Option<ValueId> {
        let value = match (&literal.kind, ty) {
            (_, Type::Optional(inner)) => return self.convert(inner, literal),
            (ast::LiteralKind::Array(items), _) => {
                let element = match ty {
                    Type::Repeated(inner) => &**inner,
                    ty => ty,
                };
                OptionValue::Array(
                    items
                        .iter()
                        .filter_map(|item| self.convert(element, item))
                        .collect(),
                )
            }
            (_, Type::Repeated(inner)) => return self.convert(inner, literal),
            (_, Type::Scalar(scalar)) => match convert_scalar(*scalar, literal) {
                Ok(value) => value,
                Err(reason) => {
                    self.invalid(literal, reason);
                    return None;
                }
            },
            (_, Type::Enum(id)) => self.convert_enum(*id, literal)?,
            (_, Type::Message(id)) => self.convert_message(*id, literal)?,
            (_, Type::Map { .. } | Type::Stream(_) | Type::Any(_) | Type::OneOf(_)) => {
                let ty = ty.display(&self.builder.ast).to_string();
                self.builder.report(BuildError::UnsupportedOptionType {
                    name: self.name.to_owned(),
                    ty,
                    position: self.file.position(&literal.span),
                });
                return None;
            }
        };

        Some(alloc_value(self.builder, self.file, value, &literal.span))
    }

    fn convert_enum(&mut self, id: EnumId, literal: &ast::Literal) -> Option<OptionValue> {
        let ident = match &literal.kind {
            ast::LiteralKind::Ident(ident) => ident,
            _ => {
                self.invalid(literal, "expected an enum value name".to_owned());
                return None;
            }
        };

        let ast = &self.builder.ast;
        match ast[id].value(ast, ident) {
            Some(value) => Some(OptionValue::Enum(value)),
            None => {
                let enumeration = ast.full_name(NamedType::Enum(id));
                self.builder.report(BuildError::UnknownEnumValue {
                    name: self.name.to_owned(),
                    enumeration,
                    value: ident.clone(),
                    position: self.file.position(&literal.span),
                });
                None
            }
        }
    }

    fn convert_message(
        &mut self,
        id: MessageId,
        literal: &ast::Literal,
    ) -> Option<OptionValue> {
        let entries = match &literal.kind {
            ast::LiteralKind::Map(entries) => entries,
            _ => {
                self.invalid(literal, "expected an aggregate value".to_owned());
                return None;
            }
        };

        let mut map = IndexMap::with_capacity(entries.len());
        for entry in entries {
            let ast = &self.builder.ast;
            let field_ty = ast[id]
                .all_fields(ast)
                .into_iter()
                .find(|field| field.name(ast) == entry.name.value)
                .map(|field| field.ty(ast).clone());

            match field_ty {
                Some(ty) => {
                    if let Some(value) = self.convert(&ty, &entry.value) {
                        map.insert(entry.name.value.clone(), value);
                    }
                }
                None => self.builder.report(BuildError::UnknownOptionField {
                    name: self.name.to_owned(),
                    field: entry.name.value.clone(),
                    position: self.file.position(&entry.name.span),
                }),
            }
        }

        Some(OptionValue::Map(map))
    }

    fn invalid(&mut self, literal: &ast::Literal, reason: String) {
        self.builder.report(BuildError::InvalidOptionValue {
            name: self.name.to_owned(),
            value: literal.to_string(),
            reason,
            position: self.file.position(&literal.span),
        });
    }
}

/// Converts a literal to a value of a scalar type, or describes why it cannot be.
pub(crate) fn convert_scalar(scalar: Scalar, literal: &ast::Literal) -> Result<OptionValue, String> {
    match scalar {
        Scalar::Int32 | Scalar::Sint32 | Scalar::Sfixed32 => {
            signed(literal, i32::MIN.into(), i32::MAX.into()).map(OptionValue::Int)
        }
        Scalar::Int64 | Scalar::Sint64 | Scalar::Sfixed64 => {
            signed(literal, i64::MIN.into(), i64::MAX.into()).map(OptionValue::Int)
        }
        Scalar::Uint32 | Scalar::Fixed32 => unsigned(literal, u32::MAX.into()).map(OptionValue::Uint),
        Scalar::Uint64 | Scalar::Fixed64 => unsigned(literal, u64::MAX).map(OptionValue::Uint),
        Scalar::Float | Scalar::Double => match &literal.kind {
            ast::LiteralKind::Int { negative, value } => {
                let value = *value as f64;
                Ok(OptionValue::Float(if *negative { -value } else { value }))
            }
            ast::LiteralKind::Float(value) => Ok(OptionValue::Float(*value)),
            ast::LiteralKind::Ident(ident) if ident == "inf" => Ok(OptionValue::Float(f64::INFINITY)),
            ast::LiteralKind::Ident(ident) if ident == "nan" => Ok(OptionValue::Float(f64::NAN)),
            _ => Err("expected a number".to_owned()),
        },
        Scalar::Bool => match &literal.kind {
            ast::LiteralKind::Ident(ident) if ident == "true" => Ok(OptionValue::Bool(true)),
            ast::LiteralKind::Ident(ident) if ident == "false" => Ok(OptionValue::Bool(false)),
            _ => Err("expected 'true' or 'false'".to_owned()),
        },
        Scalar::String | Scalar::Bytes => match &literal.kind {
            ast::LiteralKind::String(value) => Ok(OptionValue::String(value.clone())),
            _ => Err("expected a string".to_owned()),
        },
    }
}

fn signed(literal: &ast::Literal, min: i128, max: i128) -> Result<i64, String> {
    match &literal.kind {
        ast::LiteralKind::Int { negative, value } => {
            let value = if *negative {
                -i128::from(*value)
            } else {
                i128::from(*value)
            };
            if value < min || value > max {
                return Err(format!("value must be between {} and {}", min, max));
            }
            i64::try_from(value).map_err(|err| err.to_string())
        }
        _ => Err("expected an integer".to_owned()),
    }
}

fn unsigned(literal: &ast::Literal, max: u64) -> Result<u64, String> {
    match &literal.kind {
        ast::LiteralKind::Int {
            negative: false,
            value,
        } => {
            if *value > max {
                return Err(format!("value must be at most {}", max));
            }
            Ok(*value)
        }
        ast::LiteralKind::Int { negative: true, .. } => {
            Err("expected a non-negative integer".to_owned())
        }
        _ => Err("expected an integer".to_owned()),
    }
}
