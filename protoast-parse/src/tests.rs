use insta::assert_snapshot;

use crate::{ast, parse, Visitor};

#[derive(Default)]
struct Collect {
    events: Vec<String>,
}

impl Visitor for Collect {
    fn visit_package(&mut self, package: &ast::Package) {
        self.events.push(format!("package {}", package.name));
    }

    fn visit_message(&mut self, message: &ast::Message) {
        self.events.push(format!("message {}", message.name));
        message.visit(self);
        self.events.push(format!("end {}", message.name));
    }

    fn visit_normal_field(&mut self, field: &ast::NormalField) {
        self.events.push(format!("field {}", field.name.value));
    }

    fn visit_oneof_field(&mut self, field: &ast::OneofField) {
        self.events.push(format!("oneof field {}", field.name.value));
    }

    fn visit_enum_field(&mut self, field: &ast::EnumField) {
        self.events.push(format!("value {}", field.name.value));
    }

    fn visit_rpc(&mut self, rpc: &ast::Rpc) {
        self.events.push(format!("rpc {}", rpc.name.value));
    }

    fn visit_comment(&mut self, comment: &ast::Comment) {
        self.events.push(format!("comment{}", comment.text()));
    }
}

#[test]
fn visitor_walks_nested_elements() {
    let file = parse(
        "test.proto",
        "package sample;
        message Outer {
            message Inner { string id = 1; }
            oneof oo { string a = 2; }
            enum Kind { A = 0; }
        }

        // standalone

        service Svc { rpc Get(Outer) returns (Outer); }",
    )
    .unwrap();

    let mut visitor = Collect::default();
    file.visit(&mut visitor);

    assert_eq!(
        visitor.events,
        vec![
            "package sample",
            "message Outer",
            "message Inner",
            "field id",
            "end Inner",
            "oneof field a",
            "value A",
            "end Outer",
            "comment standalone",
            "rpc Get",
        ]
    );
}

#[test]
fn error_count_and_related() {
    let err = parse(
        "bad.proto",
        "message Foo {
  int32 a = 0;
  int32 b = 1
}",
    )
    .unwrap_err();

    assert_eq!(err.file(), "bad.proto");
    assert_eq!(err.count(), 2);
    assert_eq!(err.span(), Some(26..27));
    assert_snapshot!(format!("{:?}", err), @"bad.proto:2:13: message numbers must be between 1 and 536870911");
}

#[test]
fn error_inner_kinds() {
    let err = parse("x.proto", "syntax = 'proto2'; message 1 {}").unwrap_err();
    let kinds = err.into_inner();
    assert_eq!(kinds.len(), 1);
    assert_eq!(kinds[0].to_string(), "expected an identifier, but found '1'");
}

#[test]
fn empty_file() {
    let file = parse("empty.proto", "").unwrap();
    assert!(file.elements.is_empty());
}
