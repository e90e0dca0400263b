use super::*;

fn file(ast: &mut Ast, name: &str, package: &str) -> FileId {
    ast.files.alloc(File {
        name: name.to_owned(),
        path: None,
        package: package.to_owned(),
        syntax: "proto3".to_owned(),
        imports: vec![],
        types: vec![],
        extensions: vec![],
        services: vec![],
        options: vec![],
        go_path: String::new(),
        go_pkg: package.to_owned(),
    })
}

fn message(ast: &mut Ast, file: FileId, parent: Option<MessageId>, name: &str) -> MessageId {
    let id = ast.messages.alloc(Message {
        name: name.to_owned(),
        file,
        parent,
        fields: vec![],
        types: vec![],
        options: vec![],
    });
    match parent {
        Some(parent) => ast[parent].types.push(NamedType::Message(id)),
        None => ast[file].types.push(NamedType::Message(id)),
    }
    id
}

fn field(ast: &mut Ast, message: MessageId, name: &str, sequence: i32, ty: Type) -> FieldId {
    let id = ast.fields.alloc(MessageField {
        name: name.to_owned(),
        sequence,
        ty,
        options: vec![],
        message,
    });
    ast[message].fields.push(id);
    id
}

/// message Outer {
///   int32 a = 1;
///   oneof choice { string b = 2; Inner c = 3; }
///   message Inner {}
///   enum Kind { UNKNOWN = 0; }
/// }
fn outer() -> (Ast, FileId, MessageId, MessageId, EnumId) {
    let mut ast = Ast::default();
    let file = file(&mut ast, "dir/sub/foo.proto", "foo.bar");
    let outer = message(&mut ast, file, None, "Outer");
    let inner = message(&mut ast, file, Some(outer), "Inner");
    let kind = ast.enums.alloc(Enum {
        name: "Kind".to_owned(),
        file,
        parent: Some(outer),
        values: vec![],
        options: vec![],
    });
    let unknown = ast.enum_values.alloc(EnumValue {
        name: "UNKNOWN".to_owned(),
        integer: 0,
        options: vec![],
        enumeration: kind,
    });
    ast[kind].values.push(unknown);
    ast[outer].types.push(NamedType::Enum(kind));

    field(&mut ast, outer, "a", 1, Type::Scalar(Scalar::Int32));
    let oneof = ast.oneofs.alloc(OneOf {
        name: "choice".to_owned(),
        parent: outer,
        branches: vec![],
        options: vec![],
    });
    field(&mut ast, outer, "choice", -1, Type::OneOf(oneof));
    for (name, sequence, ty) in [
        ("b", 2, Type::Scalar(Scalar::String)),
        ("c", 3, Type::Message(inner)),
    ] {
        let branch = ast.branches.alloc(OneofBranch {
            name: name.to_owned(),
            sequence,
            ty,
            options: vec![],
            oneof,
        });
        ast[oneof].branches.push(branch);
    }

    (ast, file, outer, inner, kind)
}

#[test]
fn full_names() {
    let (mut ast, file, outer, inner, kind) = outer();
    assert_eq!(ast.full_name(NamedType::Message(outer)), "foo.bar.Outer");
    assert_eq!(ast.full_name(NamedType::Message(inner)), "foo.bar.Outer.Inner");
    assert_eq!(ast.full_name(NamedType::Enum(kind)), "foo.bar.Outer.Kind");

    ast[file].package = String::new();
    assert_eq!(ast.full_name(NamedType::Message(inner)), "Outer.Inner");
}

#[test]
fn all_fields_flattens_oneofs() {
    let (ast, _, outer, inner, _) = outer();
    let message = &ast[outer];

    let fields: Vec<_> = message
        .all_fields(&ast)
        .into_iter()
        .map(|field| (field.name(&ast).to_owned(), field.sequence(&ast)))
        .collect();
    assert_eq!(
        fields,
        [("a".to_owned(), 1), ("b".to_owned(), 2), ("c".to_owned(), 3)]
    );

    assert_eq!(message.fields.len(), 2);
    assert!(message.field(&ast, "choice").is_some());
    assert!(message.field(&ast, "c").is_none());

    let c = message.field_oneof(&ast, "c").unwrap();
    assert!(matches!(c, FieldRef::Branch(_)));
    assert_eq!(c.ty(&ast), &Type::Message(inner));
    assert!(message.field_oneof(&ast, "d").is_none());
}

#[test]
fn nested_type_lookup() {
    let (ast, file, outer, inner, kind) = outer();

    assert_eq!(ast[file].message(&ast, "Outer"), Ok(outer));
    assert_eq!(ast[outer].message(&ast, "Inner"), Ok(inner));
    assert_eq!(ast[outer].enumeration(&ast, "Kind"), Ok(kind));
    assert_eq!(
        ast[kind].value(&ast, "UNKNOWN").map(|value| ast[value].integer),
        Some(0)
    );

    let err = ast[outer].message(&ast, "Kind").unwrap_err();
    assert_eq!(err.to_string(), "type Kind is enum, not message");

    let err = ast[file].enumeration(&ast, "Missing").unwrap_err();
    assert_eq!(err.to_string(), "Missing: type not found");
}

#[test]
fn scan_types_depth_first() {
    let (ast, file, _, _, _) = outer();

    let mut names = Vec::new();
    ast[file].scan_types(&ast, &mut |ty| {
        names.push(ast.full_name(ty));
        true
    });
    assert_eq!(
        names,
        ["foo.bar.Outer", "foo.bar.Outer.Inner", "foo.bar.Outer.Kind"]
    );

    let mut count = 0;
    ast[file].scan_types(&ast, &mut |_| {
        count += 1;
        false
    });
    assert_eq!(count, 1);
}

#[test]
fn method_uri() {
    let (mut ast, file, outer, _, _) = outer();
    let service = ast.services.alloc(Service {
        name: "Api".to_owned(),
        file,
        methods: vec![],
        options: vec![],
    });
    let method = ast.methods.alloc(Method {
        name: "Get".to_owned(),
        file,
        service,
        input: Type::Stream(Box::new(Type::Message(outer))),
        output: Type::Scalar(Scalar::String),
        options: vec![],
    });
    ast[service].methods.push(method);
    ast[file].services.push(service);

    let method = &ast[method];
    assert_eq!(method.uri(&ast), "/dir.sub.foo.bar/Get");
    assert_eq!(method.input_message(), Some(outer));
    assert_eq!(method.output_message(), None);
    assert_eq!(ast[file].service(&ast, "Api"), Some(service));
    assert!(ast[service].method(&ast, "Get").is_some());
}

#[test]
fn package_groups_files() {
    let (mut ast, first, outer, _, _) = outer();
    let second = file(&mut ast, "dir/sub/bar.proto", "foo.bar");
    let other = file(&mut ast, "other.proto", "other");

    let package = Package::new(&ast, vec![first, second]).unwrap();
    assert_eq!(package.package(), "foo.bar");
    assert_eq!(package.go_package(), "foo.bar");
    assert_eq!(package.file(&ast, "bar.proto"), Ok(second));
    assert_eq!(package.message(&ast, "Outer"), Some(outer));
    assert_eq!(package.types(&ast).count(), 1);

    assert_eq!(Package::new(&ast, vec![]), Err(PackageError::Empty));
    assert_eq!(
        Package::new(&ast, vec![first, other]),
        Err(PackageError::MixedPackages {
            first: "foo.bar".to_owned(),
            other: "other".to_owned(),
        })
    );

    ast[second].go_pkg = "bar".to_owned();
    assert!(matches!(
        Package::new(&ast, vec![first, second]),
        Err(PackageError::MixedGoPackages { .. })
    ));

    assert_eq!(package.file(&ast, ""), Err(PackageError::EmptyFileName));
    assert!(matches!(
        package.file(&ast, "sub/bar.proto"),
        Err(PackageError::FileInDirectory { .. })
    ));
    assert!(matches!(
        package.file(&ast, "bar.txt"),
        Err(PackageError::MissingProtoSuffix { .. })
    ));
    assert!(matches!(
        package.file(&ast, "baz.proto"),
        Err(PackageError::FileNotFound { .. })
    ));
}

#[test]
#[should_panic(expected = "no position recorded")]
fn missing_position_panics() {
    let (ast, _, outer, _, _) = outer();
    ast.position(outer);
}

#[test]
fn side_tables() {
    let (mut ast, _, outer, _, _) = outer();
    let position = Position {
        file: "foo.proto".to_owned(),
        offset: 8,
        line: 1,
        column: 9,
    };
    ast.set_position(outer, Some(Attr::Name), position.clone());
    ast.set_comment(
        outer,
        None,
        Comment {
            value: " Outer.".to_owned(),
            lines: vec![" Outer.".to_owned()],
            position: position.clone(),
        },
    );

    assert_eq!(ast.field_position(outer, Attr::Name), &position);
    assert_eq!(ast.comment(outer).unwrap().value, " Outer.");
    assert!(ast.field_comment(outer, Attr::Name).is_none());
}
