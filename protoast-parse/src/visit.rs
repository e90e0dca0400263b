use crate::ast;

/// A callback interface for walking a parsed file.
///
/// Every method has a default implementation. The defaults for container nodes (messages,
/// enums, oneofs, services and groups) visit the node's children, while the rest do nothing.
/// Implementations which override a container method and still want to see the children
/// should call the node's `visit` method.
pub trait Visitor {
    /// Called for `syntax` statements.
    fn visit_syntax(&mut self, _syntax: &ast::Syntax) {}

    /// Called for `package` statements.
    fn visit_package(&mut self, _package: &ast::Package) {}

    /// Called for `import` statements.
    fn visit_import(&mut self, _import: &ast::Import) {}

    /// Called for `option` statements.
    fn visit_option(&mut self, _option: &ast::OptionDef) {}

    /// Called for `message` and `extend` blocks.
    fn visit_message(&mut self, message: &ast::Message) {
        message.visit(self)
    }

    /// Called for `enum` definitions.
    fn visit_enum(&mut self, enm: &ast::Enum) {
        enm.visit(self)
    }

    /// Called for values inside an enum.
    fn visit_enum_field(&mut self, _field: &ast::EnumField) {}

    /// Called for plain message fields.
    fn visit_normal_field(&mut self, _field: &ast::NormalField) {}

    /// Called for `map<K, V>` fields.
    fn visit_map_field(&mut self, _field: &ast::MapField) {}

    /// Called for `oneof` blocks.
    fn visit_oneof(&mut self, oneof: &ast::Oneof) {
        oneof.visit(self)
    }

    /// Called for fields inside a oneof.
    fn visit_oneof_field(&mut self, _field: &ast::OneofField) {}

    /// Called for `service` definitions.
    fn visit_service(&mut self, service: &ast::Service) {
        service.visit(self)
    }

    /// Called for `rpc` definitions.
    fn visit_rpc(&mut self, _rpc: &ast::Rpc) {}

    /// Called for `reserved` statements.
    fn visit_reserved(&mut self, _reserved: &ast::Reserved) {}

    /// Called for `extensions` statements.
    fn visit_extensions(&mut self, _extensions: &ast::Extensions) {}

    /// Called for proto2 groups.
    fn visit_group(&mut self, group: &ast::Group) {
        group.visit(self)
    }

    /// Called for standalone comments.
    fn visit_comment(&mut self, _comment: &ast::Comment) {}
}

fn visit_elements<V: Visitor + ?Sized>(elements: &[ast::Element], visitor: &mut V) {
    for element in elements {
        element.accept(visitor);
    }
}

impl ast::Element {
    /// Dispatches this element to the matching [`Visitor`] method.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            ast::Element::Syntax(syntax) => visitor.visit_syntax(syntax),
            ast::Element::Package(package) => visitor.visit_package(package),
            ast::Element::Import(import) => visitor.visit_import(import),
            ast::Element::Option(option) => visitor.visit_option(option),
            ast::Element::Message(message) => visitor.visit_message(message),
            ast::Element::Enum(enm) => visitor.visit_enum(enm),
            ast::Element::EnumField(field) => visitor.visit_enum_field(field),
            ast::Element::NormalField(field) => visitor.visit_normal_field(field),
            ast::Element::MapField(field) => visitor.visit_map_field(field),
            ast::Element::Oneof(oneof) => visitor.visit_oneof(oneof),
            ast::Element::OneofField(field) => visitor.visit_oneof_field(field),
            ast::Element::Service(service) => visitor.visit_service(service),
            ast::Element::Rpc(rpc) => visitor.visit_rpc(rpc),
            ast::Element::Reserved(reserved) => visitor.visit_reserved(reserved),
            ast::Element::Extensions(extensions) => visitor.visit_extensions(extensions),
            ast::Element::Group(group) => visitor.visit_group(group),
            ast::Element::Comment(comment) => visitor.visit_comment(comment),
        }
    }
}

impl ast::File {
    /// Visits every top-level element in order.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visit_elements(&self.elements, visitor)
    }
}

impl ast::Message {
    /// Visits the elements of the message body.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visit_elements(&self.elements, visitor)
    }
}

impl ast::Enum {
    /// Visits the elements of the enum body.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visit_elements(&self.elements, visitor)
    }
}

impl ast::Oneof {
    /// Visits the elements of the oneof body.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visit_elements(&self.elements, visitor)
    }
}

impl ast::Service {
    /// Visits the elements of the service body.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visit_elements(&self.elements, visitor)
    }
}

impl ast::Group {
    /// Visits the elements of the group body.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visit_elements(&self.elements, visitor)
    }
}
