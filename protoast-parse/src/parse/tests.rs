use super::*;
use crate::ast::*;

fn parse_ok(source: &str) -> File {
    let mut parser = Parser::new(source);
    let file = parser.parse_file();
    let errors = parser.into_errors();
    assert_eq!(errors, vec![], "unexpected errors parsing {:?}", source);
    file
}

fn parse_err(source: &str) -> Vec<ParseErrorKind> {
    let mut parser = Parser::new(source);
    parser.parse_file();
    parser.into_errors()
}

fn single_message(file: &File) -> &Message {
    match file.elements.as_slice() {
        [Element::Message(message)] => message,
        elements => panic!("expected a single message, found {:?}", elements),
    }
}

#[test]
fn parse_syntax_package_import() {
    let file = parse_ok(
        r#"syntax = "proto3";
        package foo.bar;
        import public "a.proto";
        import "b" ".proto";"#,
    );

    assert_eq!(file.elements.len(), 4);
    match &file.elements[0] {
        Element::Syntax(syntax) => {
            assert_eq!(syntax.value, "proto3");
            assert_eq!(syntax.value_span, 9..17);
        }
        other => panic!("unexpected {:?}", other),
    }
    match &file.elements[1] {
        Element::Package(package) => assert_eq!(package.name.to_string(), "foo.bar"),
        other => panic!("unexpected {:?}", other),
    }
    match &file.elements[2] {
        Element::Import(import) => {
            assert_eq!(import.kind, Some(ImportKind::Public));
            assert_eq!(import.path, "a.proto");
        }
        other => panic!("unexpected {:?}", other),
    }
    match &file.elements[3] {
        Element::Import(import) => {
            assert_eq!(import.kind, None);
            assert_eq!(import.path, "b.proto");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_unknown_syntax() {
    assert_eq!(
        parse_err(r#"syntax = "proto4";"#),
        vec![ParseErrorKind::UnknownSyntax {
            syntax: "proto4".to_owned(),
            span: 9..17,
        }]
    );
}

#[test]
fn parse_message_fields() {
    let file = parse_ok(
        "message Foo {
            optional int32 a = 1;
            repeated .pkg.Bar b = 2 [deprecated = true, (my.opt).x = -5];
            map<string, Baz> c = 3;
            Nested.Type d = 4;
        }",
    );

    let message = single_message(&file);
    assert_eq!(message.name, "Foo");
    assert!(!message.is_extend);
    assert_eq!(message.elements.len(), 4);

    match &message.elements[0] {
        Element::NormalField(field) => {
            assert_eq!(field.labels, [FieldLabel::Optional]);
            assert_eq!(field.ty.to_string(), "int32");
            assert_eq!(field.name.value, "a");
            assert_eq!(field.number, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    match &message.elements[1] {
        Element::NormalField(field) => {
            assert_eq!(field.labels, [FieldLabel::Repeated]);
            assert_eq!(field.ty.to_string(), ".pkg.Bar");
            assert!(field.ty.leading_dot.is_some());
            assert_eq!(field.options.len(), 2);
            assert_eq!(field.options[0].name, "deprecated");
            assert_eq!(
                field.options[0].value.kind,
                LiteralKind::Ident("true".to_owned())
            );
            assert_eq!(field.options[1].name, "(my.opt).x");
            assert_eq!(
                field.options[1].value.kind,
                LiteralKind::Int {
                    negative: true,
                    value: 5
                }
            );
        }
        other => panic!("unexpected {:?}", other),
    }
    match &message.elements[2] {
        Element::MapField(field) => {
            assert_eq!(field.key_ty.to_string(), "string");
            assert_eq!(field.value_ty.to_string(), "Baz");
            assert_eq!(field.name.value, "c");
            assert_eq!(field.number, 3);
        }
        other => panic!("unexpected {:?}", other),
    }
    match &message.elements[3] {
        Element::NormalField(field) => {
            assert!(field.labels.is_empty());
            assert_eq!(field.ty.to_string(), "Nested.Type");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_oneof_and_group() {
    let file = parse_ok(
        "message Foo {
            oneof choice {
                option (x) = 1;
                string a = 4;
                int32 b = 5;
            }
            optional group Result = 6 {
                required string url = 7;
            }
        }",
    );

    let message = single_message(&file);
    match &message.elements[0] {
        Element::Oneof(oneof) => {
            assert_eq!(oneof.name.value, "choice");
            assert_eq!(oneof.elements.len(), 3);
            assert!(matches!(&oneof.elements[0], Element::Option(option) if option.name == "(x)"));
            assert!(matches!(&oneof.elements[1], Element::OneofField(field) if field.number == 4));
            assert!(matches!(&oneof.elements[2], Element::OneofField(field) if field.number == 5));
        }
        other => panic!("unexpected {:?}", other),
    }
    match &message.elements[1] {
        Element::Group(group) => {
            assert_eq!(group.name.value, "Result");
            assert_eq!(group.labels, [FieldLabel::Optional]);
            assert_eq!(group.number, 6);
            assert_eq!(group.elements.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_stacked_labels() {
    let file = parse_ok("message Foo { repeated optional string s = 1; }");

    match &single_message(&file).elements[0] {
        Element::NormalField(field) => {
            assert_eq!(field.labels, [FieldLabel::Repeated, FieldLabel::Optional]);
            assert!(field.is_optional());
            assert!(field.is_repeated());
            assert_eq!(field.ty.to_string(), "string");
            assert_eq!(field.span, 14..45);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_oneof_field_with_label() {
    let errors = parse_err("message Foo { oneof o { optional int32 a = 1; } }");
    assert_eq!(
        errors,
        vec![ParseErrorKind::OneofFieldWithLabel { span: 24..32 }]
    );
}

#[test]
fn parse_map_field_with_label() {
    let errors = parse_err("message Foo { repeated map<int32, int32> a = 1; }");
    assert_eq!(
        errors,
        vec![ParseErrorKind::MapFieldWithLabel { span: 14..26 }]
    );
}

#[test]
fn parse_invalid_group_name() {
    let errors = parse_err("message Foo { optional group result = 1 {} }");
    assert_eq!(
        errors,
        vec![ParseErrorKind::InvalidGroupName { span: 29..35 }]
    );
}

#[test]
fn parse_extend() {
    let file = parse_ok(
        "extend google.protobuf.MethodOptions {
            optional int32 status = 50000;
        }",
    );

    let message = single_message(&file);
    assert!(message.is_extend);
    assert_eq!(message.name, "google.protobuf.MethodOptions");
    assert_eq!(message.name_span, 7..36);
    assert_eq!(message.elements.len(), 1);
}

#[test]
fn parse_extend_rejects_declarations() {
    let errors = parse_err("extend Foo { message Bar {} }");
    assert_eq!(
        errors[0],
        ParseErrorKind::UnexpectedToken {
            expected: "a message field, 'option' or '}'".to_owned(),
            found: "message".to_owned(),
            span: 13..20,
        }
    );

    let errors = parse_err("message Foo { extend Foo { enum E { A = 0; } } }");
    assert!(matches!(
        &errors[0],
        ParseErrorKind::UnexpectedToken { found, .. } if found == "enum"
    ));
}

#[test]
fn parse_enum() {
    let file = parse_ok(
        "enum Error {
            option allow_alias = true;
            RESERVED = 0;
            OK = 200 [deprecated = true];
            NEGATIVE = -2147483648;
            reserved 2, 15, 9 to 11, 40 to max;
            reserved \"FOO\", \"BAR\";
        }",
    );

    let enm = match file.elements.as_slice() {
        [Element::Enum(enm)] => enm,
        elements => panic!("unexpected {:?}", elements),
    };
    assert_eq!(enm.name.value, "Error");
    assert_eq!(enm.elements.len(), 6);
    match &enm.elements[2] {
        Element::EnumField(field) => {
            assert_eq!(field.name.value, "OK");
            assert_eq!(field.value, 200);
            assert_eq!(field.options.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    match &enm.elements[3] {
        Element::EnumField(field) => assert_eq!(field.value, i32::MIN),
        other => panic!("unexpected {:?}", other),
    }
    match &enm.elements[4] {
        Element::Reserved(reserved) => match &reserved.kind {
            ReservedKind::Ranges(ranges) => {
                let ends: Vec<_> = ranges.iter().map(|range| (range.start, range.end)).collect();
                assert_eq!(
                    ends,
                    vec![
                        (2, ReservedRangeEnd::None),
                        (15, ReservedRangeEnd::None),
                        (9, ReservedRangeEnd::Int(11)),
                        (40, ReservedRangeEnd::Max),
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
    match &enm.elements[5] {
        Element::Reserved(reserved) => match &reserved.kind {
            ReservedKind::Names(names) => {
                let names: Vec<_> = names.iter().map(|name| name.value.as_str()).collect();
                assert_eq!(names, vec!["FOO", "BAR"]);
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_enum_number_out_of_range() {
    let errors = parse_err("enum Foo { BAR = 2147483648; }");
    assert_eq!(
        errors,
        vec![ParseErrorKind::InvalidEnumNumber { span: 17..27 }]
    );
}

#[test]
fn parse_service() {
    let file = parse_ok(
        "service Greeter {
            option deprecated = false;
            rpc Hello(Request) returns (Response);
            rpc Chat(stream .pkg.Message) returns (stream Message) {
                option (common.status) = 200;
            }
        }",
    );

    let service = match file.elements.as_slice() {
        [Element::Service(service)] => service,
        elements => panic!("unexpected {:?}", elements),
    };
    assert_eq!(service.name.value, "Greeter");
    assert_eq!(service.elements.len(), 3);
    match &service.elements[1] {
        Element::Rpc(rpc) => {
            assert_eq!(rpc.name.value, "Hello");
            assert!(!rpc.client_streaming);
            assert!(!rpc.server_streaming);
            assert!(rpc.options.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
    match &service.elements[2] {
        Element::Rpc(rpc) => {
            assert_eq!(rpc.input_ty.to_string(), ".pkg.Message");
            assert!(rpc.client_streaming);
            assert!(rpc.server_streaming);
            assert_eq!(rpc.options.len(), 1);
            assert_eq!(rpc.options[0].name, "(common.status)");
            assert_eq!(
                rpc.options[0].value.kind,
                LiteralKind::Int {
                    negative: false,
                    value: 200
                }
            );
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_aggregate_option() {
    let file = parse_ok(
        r#"option (http) = {
            get: "/v1/users"
            additional_bindings { post: "/v1/users" body: "*" }
            tags: [1, 2.5, -inf]
            [ext.field]: FOO;
        };"#,
    );

    let option = match file.elements.as_slice() {
        [Element::Option(option)] => option,
        elements => panic!("unexpected {:?}", elements),
    };
    assert_eq!(option.name, "(http)");
    assert_eq!(option.name_span, 7..13);

    let entries = match &option.value.kind {
        LiteralKind::Map(entries) => entries,
        other => panic!("unexpected {:?}", other),
    };
    let names: Vec<_> = entries.iter().map(|entry| entry.name.value.as_str()).collect();
    assert_eq!(
        names,
        vec!["get", "additional_bindings", "tags", "[ext.field]"]
    );
    assert_eq!(
        entries[0].value.kind,
        LiteralKind::String("/v1/users".to_owned())
    );
    match &entries[1].value.kind {
        LiteralKind::Map(nested) => assert_eq!(nested.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        entries[2].value.kind,
        LiteralKind::Array(vec![
            Literal {
                kind: LiteralKind::Int {
                    negative: false,
                    value: 1
                },
                span: entries[2].value.span.start + 1..entries[2].value.span.start + 2,
            },
            Literal {
                kind: LiteralKind::Float(2.5),
                span: entries[2].value.span.start + 4..entries[2].value.span.start + 7,
            },
            Literal {
                kind: LiteralKind::Float(f64::NEG_INFINITY),
                span: entries[2].value.span.start + 9..entries[2].value.span.start + 13,
            },
        ])
    );
    assert_eq!(entries[3].value.kind, LiteralKind::Ident("FOO".to_owned()));
}

#[test]
fn literal_display() {
    let file = parse_ok(r#"option a = { x: "q\"", y: [1, -2], z { } };"#);
    match file.elements.as_slice() {
        [Element::Option(option)] => assert_eq!(
            option.value.to_string(),
            r#"{ x: "q\"", y: [1, -2], z: {} }"#
        ),
        elements => panic!("unexpected {:?}", elements),
    }
}

#[test]
fn parse_field_number_out_of_range() {
    let errors = parse_err("message Foo { int32 a = 536870912; int32 b = 0; }");
    assert_eq!(
        errors,
        vec![
            ParseErrorKind::InvalidMessageNumber { span: 24..33 },
            ParseErrorKind::InvalidMessageNumber { span: 45..46 },
        ]
    );
}

#[test]
fn leading_comments() {
    let file = parse_ok(
        "// detached

// leading
// second line
message Foo { // trailing
  /* block */
  int32 a = 1; // trailing
  // inner detached

}
",
    );

    assert_eq!(file.elements.len(), 2);
    match &file.elements[0] {
        Element::Comment(comment) => assert_eq!(comment.lines, vec![" detached"]),
        other => panic!("unexpected {:?}", other),
    }

    let message = match &file.elements[1] {
        Element::Message(message) => message,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(
        message.comment.as_ref().map(Comment::text).as_deref(),
        Some(" leading\n second line")
    );
    assert_eq!(message.elements.len(), 2);
    match &message.elements[0] {
        Element::NormalField(field) => {
            assert_eq!(
                field.comment.as_ref().map(Comment::text).as_deref(),
                Some(" block ")
            );
        }
        other => panic!("unexpected {:?}", other),
    }
    match &message.elements[1] {
        Element::Comment(comment) => assert_eq!(comment.lines, vec![" inner detached"]),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn comment_before_closing_brace() {
    let file = parse_ok("message Foo {\n  int32 a = 1;\n  // last\n}");
    let message = single_message(&file);
    assert_eq!(message.elements.len(), 2);
    assert!(matches!(&message.elements[1], Element::Comment(comment) if comment.text() == " last"));
}

#[test]
fn recover_multiple_errors() {
    let errors = parse_err(
        "message Foo {
            int32 a = ;
            int32 b = 2;
            string = 3;
        }
        enum Bar { X = 1 }",
    );

    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors.iter().all(|err| matches!(err, ParseErrorKind::UnexpectedToken { .. })));
}

#[test]
fn recover_keeps_later_definitions() {
    let mut parser = Parser::new("message { } message Bar {}");
    let file = parser.parse_file();
    let errors = parser.into_errors();

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        file.elements.as_slice(),
        [Element::Message(message)] if message.name == "Bar"
    ));
}

#[test]
fn unexpected_eof() {
    assert_eq!(
        parse_err("message Foo {"),
        vec![ParseErrorKind::UnexpectedEof {
            expected: "'}'".to_owned()
        }]
    );
}

#[test]
fn invalid_utf8_string() {
    assert_eq!(
        parse_err(r#"option foo = "\xff";"#),
        vec![ParseErrorKind::InvalidUtf8String { span: 13..19 }]
    );
}
