use logos::{Lexer, Logos, Span};

mod comments;
#[cfg(test)]
mod tests;

use self::comments::Comments;
use crate::{
    ast::{self, FieldLabel},
    error::ParseErrorKind,
    lex::Token,
    MAX_MESSAGE_FIELD_NUMBER,
};

type ElementParser<'a> = fn(&mut Parser<'a>) -> Result<Option<ast::Element>, ()>;

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a, Token<'a>>,
    peek: Option<(Token<'a>, Span)>,
    comments: Comments,
    leading: Option<ast::Comment>,
    last_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Token::lexer(source),
            peek: None,
            comments: Comments::new(),
            leading: None,
            last_end: 0,
        }
    }

    pub fn into_errors(self) -> Vec<ParseErrorKind> {
        self.lexer.extras.errors
    }

    pub fn parse_file(&mut self) -> ast::File {
        let mut elements = Vec::new();
        loop {
            let peeked = self.peek();
            self.flush_detached(&mut elements);
            let start = match peeked {
                Some((_, span)) => span.start,
                None => break,
            };

            match self.parse_statement() {
                Ok(Some(element)) => elements.push(element),
                Ok(None) => {}
                Err(()) => self.recover(start, false),
            }
        }

        ast::File { elements }
    }

    fn parse_statement(&mut self) -> Result<Option<ast::Element>, ()> {
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
                Ok(None)
            }
            Some((Token::Ident("syntax"), _)) => Ok(Some(ast::Element::Syntax(self.parse_syntax()?))),
            Some((Token::Ident("package"), _)) => {
                Ok(Some(ast::Element::Package(self.parse_package()?)))
            }
            Some((Token::Ident("import"), _)) => Ok(Some(ast::Element::Import(self.parse_import()?))),
            Some((Token::Ident("option"), _)) => Ok(Some(ast::Element::Option(self.parse_option()?))),
            Some((Token::Ident("message"), _)) => {
                Ok(Some(ast::Element::Message(self.parse_message()?)))
            }
            Some((Token::Ident("extend"), _)) => {
                Ok(Some(ast::Element::Message(self.parse_extend()?)))
            }
            Some((Token::Ident("enum"), _)) => Ok(Some(ast::Element::Enum(self.parse_enum()?))),
            Some((Token::Ident("service"), _)) => {
                Ok(Some(ast::Element::Service(self.parse_service()?)))
            }
            _ => self.unexpected_token(
                "'enum', 'extend', 'import', 'message', 'option', 'package', 'service', 'syntax' or ';'",
            ),
        }
    }

    fn parse_syntax(&mut self) -> Result<ast::Syntax, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::SYNTAX)?.start;
        self.expect_eq(Token::Equals)?;

        let (value, value_span) = self.parse_string()?;
        if value != "proto2" && value != "proto3" {
            self.add_error(ParseErrorKind::UnknownSyntax {
                syntax: value.clone(),
                span: value_span.clone(),
            });
        }

        self.expect_eq(Token::Semicolon)?;

        Ok(ast::Syntax {
            value,
            value_span,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_package(&mut self) -> Result<ast::Package, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::PACKAGE)?.start;

        let name = self.parse_type_name()?;

        self.expect_eq(Token::Semicolon)?;

        Ok(ast::Package {
            name,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_import(&mut self) -> Result<ast::Import, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::IMPORT)?.start;

        let kind = match self.peek() {
            Some((Token::Ident("weak"), _)) => {
                self.bump();
                Some(ast::ImportKind::Weak)
            }
            Some((Token::Ident("public"), _)) => {
                self.bump();
                Some(ast::ImportKind::Public)
            }
            Some((Token::StringLiteral(_), _)) => None,
            _ => self.unexpected_token("a string literal, 'public' or 'weak'")?,
        };

        let (path, path_span) = self.parse_string()?;

        self.expect_eq(Token::Semicolon)?;

        Ok(ast::Import {
            kind,
            path,
            path_span,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_option(&mut self) -> Result<ast::OptionDef, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::OPTION)?.start;

        let mut option = self.parse_option_body(comment)?;

        self.expect_eq(Token::Semicolon)?;

        option.span = start..self.last_end;
        Ok(option)
    }

    fn parse_option_body(&mut self, comment: Option<ast::Comment>) -> Result<ast::OptionDef, ()> {
        let mut name = String::new();
        let mut name_span: Option<Span> = None;
        let eq_span = loop {
            match self.peek() {
                Some((
                    tok @ (Token::Ident(_) | Token::Dot | Token::LeftParen | Token::RightParen),
                    span,
                )) => {
                    self.bump();
                    name.push_str(&tok.to_string());
                    name_span = Some(match name_span {
                        Some(prev) => prev.start..span.end,
                        None => span,
                    });
                }
                Some((Token::Equals, span)) => {
                    self.bump();
                    break span;
                }
                _ => self.unexpected_token("an identifier, '.', '(', ')' or '='")?,
            }
        };

        let name_span = name_span.unwrap_or_else(|| eq_span.clone());
        let value = self.parse_literal()?;

        Ok(ast::OptionDef {
            name,
            span: name_span.start..self.last_end,
            name_span,
            value,
            comment,
        })
    }

    fn parse_field_options(&mut self) -> Result<Vec<ast::OptionDef>, ()> {
        let mut options = Vec::new();
        if let Some((Token::LeftBracket, _)) = self.peek() {
            self.bump();
            loop {
                let comment = self.take_leading();
                options.push(self.parse_option_body(comment)?);
                match self.peek() {
                    Some((Token::Comma, _)) => {
                        self.bump();
                    }
                    Some((Token::RightBracket, _)) => {
                        self.bump();
                        break;
                    }
                    _ => self.unexpected_token("',' or ']'")?,
                }
            }
        }
        Ok(options)
    }

    fn parse_literal(&mut self) -> Result<ast::Literal, ()> {
        match self.peek() {
            Some((Token::Minus, span)) => {
                self.bump();
                self.parse_number(true, span.start)
            }
            Some((Token::Plus, span)) => {
                self.bump();
                self.parse_number(false, span.start)
            }
            Some((Token::IntLiteral(_) | Token::FloatLiteral(_), span)) => {
                self.parse_number(false, span.start)
            }
            Some((Token::StringLiteral(_), _)) => {
                let (value, span) = self.parse_string()?;
                Ok(ast::Literal {
                    kind: ast::LiteralKind::String(value),
                    span,
                })
            }
            Some((Token::Ident(_) | Token::Dot, _)) => {
                let name = self.parse_type_name()?;
                Ok(ast::Literal {
                    span: name.span(),
                    kind: ast::LiteralKind::Ident(name.to_string()),
                })
            }
            Some((Token::LeftBrace, _)) => self.parse_map_literal(Token::RightBrace),
            Some((Token::LeftAngleBracket, _)) => self.parse_map_literal(Token::RightAngleBracket),
            Some((Token::LeftBracket, _)) => self.parse_array_literal(),
            _ => self.unexpected_token("a constant"),
        }
    }

    fn parse_number(&mut self, negative: bool, start: usize) -> Result<ast::Literal, ()> {
        let kind = match self.peek() {
            Some((Token::IntLiteral(value), _)) => {
                self.bump();
                ast::LiteralKind::Int { negative, value }
            }
            Some((Token::FloatLiteral(value), _)) => {
                self.bump();
                ast::LiteralKind::Float(if negative { -value.0 } else { value.0 })
            }
            Some((Token::Ident("inf"), _)) => {
                self.bump();
                ast::LiteralKind::Float(if negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                })
            }
            Some((Token::Ident("nan"), _)) => {
                self.bump();
                ast::LiteralKind::Float(f64::NAN)
            }
            _ => self.unexpected_token("a number")?,
        };

        Ok(ast::Literal {
            kind,
            span: start..self.last_end,
        })
    }

    fn parse_map_literal(&mut self, close: Token<'a>) -> Result<ast::Literal, ()> {
        let (_, open) = self.bump();

        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some((tok, span)) if tok == close => {
                    self.bump();
                    return Ok(ast::Literal {
                        kind: ast::LiteralKind::Map(entries),
                        span: open.start..span.end,
                    });
                }
                Some((Token::Ident(_) | Token::LeftBracket, _)) => {
                    let name = self.parse_map_key()?;
                    let value = match self.peek() {
                        Some((Token::Colon, _)) => {
                            self.bump();
                            self.parse_literal()?
                        }
                        Some((Token::LeftBrace | Token::LeftAngleBracket, _)) => {
                            self.parse_literal()?
                        }
                        _ => self.unexpected_token("':', '{' or '<'")?,
                    };

                    let span = name.span.start..value.span.end;
                    entries.push(ast::MapEntry { name, value, span });

                    if let Some((Token::Comma | Token::Semicolon, _)) = self.peek() {
                        self.bump();
                    }
                }
                _ => self.unexpected_token(format!("an identifier or '{}'", close))?,
            }
        }
    }

    fn parse_map_key(&mut self) -> Result<ast::Ident, ()> {
        match self.peek() {
            Some((Token::LeftBracket, start)) => {
                self.bump();
                let name = self.parse_type_name()?;
                let end = self.expect_eq(Token::RightBracket)?;
                Ok(ast::Ident::new(format!("[{}]", name), start.start..end.end))
            }
            _ => self.parse_ident(),
        }
    }

    fn parse_array_literal(&mut self) -> Result<ast::Literal, ()> {
        let start = self.expect_eq(Token::LeftBracket)?.start;

        let mut values = Vec::new();
        if let Some((Token::RightBracket, _)) = self.peek() {
            self.bump();
        } else {
            loop {
                values.push(self.parse_literal()?);
                match self.peek() {
                    Some((Token::Comma, _)) => {
                        self.bump();
                    }
                    Some((Token::RightBracket, _)) => {
                        self.bump();
                        break;
                    }
                    _ => self.unexpected_token("',' or ']'")?,
                }
            }
        }

        Ok(ast::Literal {
            kind: ast::LiteralKind::Array(values),
            span: start..self.last_end,
        })
    }

    fn parse_message(&mut self) -> Result<ast::Message, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::MESSAGE)?.start;

        let name = self.parse_ident()?;
        let elements = self.parse_body(Self::parse_message_element)?;

        Ok(ast::Message {
            name: name.value,
            name_span: name.span,
            is_extend: false,
            elements,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_extend(&mut self) -> Result<ast::Message, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::EXTEND)?.start;

        let extendee = self.parse_type_name()?;
        let elements = self.parse_body(Self::parse_extend_element)?;

        Ok(ast::Message {
            name: extendee.to_string(),
            name_span: extendee.span(),
            is_extend: true,
            elements,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_extend_element(&mut self) -> Result<Option<ast::Element>, ()> {
        const EXPECTED: &str = "a message field, 'option' or '}'";

        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
                Ok(None)
            }
            Some((Token::Ident("option"), _)) => Ok(Some(ast::Element::Option(self.parse_option()?))),
            Some((
                Token::Ident("message" | "enum" | "extend" | "oneof" | "reserved" | "extensions"),
                _,
            )) => self.unexpected_token(EXPECTED),
            Some((Token::Ident(_) | Token::Dot, _)) => self.parse_field().map(Some),
            _ => self.unexpected_token(EXPECTED),
        }
    }

    fn parse_message_element(&mut self) -> Result<Option<ast::Element>, ()> {
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
                Ok(None)
            }
            Some((Token::Ident("message"), _)) => {
                Ok(Some(ast::Element::Message(self.parse_message()?)))
            }
            Some((Token::Ident("enum"), _)) => Ok(Some(ast::Element::Enum(self.parse_enum()?))),
            Some((Token::Ident("extend"), _)) => {
                Ok(Some(ast::Element::Message(self.parse_extend()?)))
            }
            Some((Token::Ident("option"), _)) => Ok(Some(ast::Element::Option(self.parse_option()?))),
            Some((Token::Ident("oneof"), _)) => Ok(Some(ast::Element::Oneof(self.parse_oneof()?))),
            Some((Token::Ident("reserved"), _)) => {
                Ok(Some(ast::Element::Reserved(self.parse_reserved()?)))
            }
            Some((Token::Ident("extensions"), _)) => {
                Ok(Some(ast::Element::Extensions(self.parse_extensions()?)))
            }
            Some((Token::Ident(_) | Token::Dot, _)) => self.parse_field().map(Some),
            _ => self.unexpected_token(
                "a message field, 'enum', 'extend', 'extensions', 'message', 'oneof', 'option', 'reserved' or '}'",
            ),
        }
    }

    fn parse_field(&mut self) -> Result<ast::Element, ()> {
        let comment = self.take_leading();
        let start = self.peek_start();

        let mut labels = Vec::new();
        loop {
            let label = match self.peek() {
                Some((Token::Ident("optional"), _)) => FieldLabel::Optional,
                Some((Token::Ident("required"), _)) => FieldLabel::Required,
                Some((Token::Ident("repeated"), _)) => FieldLabel::Repeated,
                _ => break,
            };
            self.bump();
            labels.push(label);
        }

        match self.peek() {
            Some((Token::Ident("map"), _)) => {
                let map_span = self.expect_eq(Token::MAP)?;
                if let Some((Token::LeftAngleBracket, _)) = self.peek() {
                    if !labels.is_empty() {
                        self.add_error(ParseErrorKind::MapFieldWithLabel {
                            span: start..map_span.end,
                        });
                    }
                    return self.parse_map_field(start, comment).map(ast::Element::MapField);
                }

                let ty = self.parse_type_name_rest(None, ast::Ident::new("map", map_span))?;
                self.parse_normal_field(start, labels, ty, comment)
                    .map(ast::Element::NormalField)
            }
            Some((Token::Ident("group"), _)) => self
                .parse_group(start, labels, comment)
                .map(ast::Element::Group),
            _ => {
                let ty = self.parse_type_name()?;
                self.parse_normal_field(start, labels, ty, comment)
                    .map(ast::Element::NormalField)
            }
        }
    }

    fn parse_normal_field(
        &mut self,
        start: usize,
        labels: Vec<FieldLabel>,
        ty: ast::TypeName,
        comment: Option<ast::Comment>,
    ) -> Result<ast::NormalField, ()> {
        let name = self.parse_ident()?;
        self.expect_eq(Token::Equals)?;
        let (number, number_span) = self.parse_field_number()?;
        let options = self.parse_field_options()?;
        self.expect_eq(Token::Semicolon)?;

        Ok(ast::NormalField {
            labels,
            ty,
            name,
            number,
            number_span,
            options,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_map_field(
        &mut self,
        start: usize,
        comment: Option<ast::Comment>,
    ) -> Result<ast::MapField, ()> {
        self.expect_eq(Token::LeftAngleBracket)?;
        let key_ty = self.parse_type_name()?;
        self.expect_eq(Token::Comma)?;
        let value_ty = self.parse_type_name()?;
        self.expect_eq(Token::RightAngleBracket)?;

        let name = self.parse_ident()?;
        self.expect_eq(Token::Equals)?;
        let (number, number_span) = self.parse_field_number()?;
        let options = self.parse_field_options()?;
        self.expect_eq(Token::Semicolon)?;

        Ok(ast::MapField {
            key_ty,
            value_ty,
            name,
            number,
            number_span,
            options,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_group(
        &mut self,
        start: usize,
        labels: Vec<FieldLabel>,
        comment: Option<ast::Comment>,
    ) -> Result<ast::Group, ()> {
        self.expect_eq(Token::GROUP)?;

        let name = self.parse_ident()?;
        if !is_valid_group_name(&name.value) {
            self.add_error(ParseErrorKind::InvalidGroupName {
                span: name.span.clone(),
            });
        }

        self.expect_eq(Token::Equals)?;
        let (number, number_span) = self.parse_field_number()?;
        // Group options have no counterpart in the tree.
        self.parse_field_options()?;
        let elements = self.parse_body(Self::parse_message_element)?;

        Ok(ast::Group {
            labels,
            name,
            number,
            number_span,
            elements,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_oneof(&mut self) -> Result<ast::Oneof, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::ONEOF)?.start;

        let name = self.parse_ident()?;
        let elements = self.parse_body(Self::parse_oneof_element)?;

        Ok(ast::Oneof {
            name,
            elements,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_oneof_element(&mut self) -> Result<Option<ast::Element>, ()> {
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
                Ok(None)
            }
            Some((Token::Ident("option"), _)) => Ok(Some(ast::Element::Option(self.parse_option()?))),
            Some((Token::Ident("group"), span)) => {
                let comment = self.take_leading();
                Ok(Some(ast::Element::Group(self.parse_group(
                    span.start,
                    Vec::new(),
                    comment,
                )?)))
            }
            Some((Token::Ident(_) | Token::Dot, _)) => {
                Ok(Some(ast::Element::OneofField(self.parse_oneof_field()?)))
            }
            _ => self.unexpected_token("a oneof field, 'option' or '}'"),
        }
    }

    fn parse_oneof_field(&mut self) -> Result<ast::OneofField, ()> {
        let comment = self.take_leading();
        let start = self.peek_start();

        if let Some((Token::Ident("optional" | "required" | "repeated"), span)) = self.peek() {
            self.add_error(ParseErrorKind::OneofFieldWithLabel { span });
            self.bump();
        }

        let ty = self.parse_type_name()?;
        let name = self.parse_ident()?;
        self.expect_eq(Token::Equals)?;
        let (number, number_span) = self.parse_field_number()?;
        let options = self.parse_field_options()?;
        self.expect_eq(Token::Semicolon)?;

        Ok(ast::OneofField {
            ty,
            name,
            number,
            number_span,
            options,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_enum(&mut self) -> Result<ast::Enum, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::ENUM)?.start;

        let name = self.parse_ident()?;
        let elements = self.parse_body(Self::parse_enum_element)?;

        Ok(ast::Enum {
            name,
            elements,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_enum_element(&mut self) -> Result<Option<ast::Element>, ()> {
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
                Ok(None)
            }
            Some((Token::Ident("option"), _)) => Ok(Some(ast::Element::Option(self.parse_option()?))),
            Some((Token::Ident("reserved"), _)) => {
                Ok(Some(ast::Element::Reserved(self.parse_reserved()?)))
            }
            Some((Token::Ident(_), _)) => {
                Ok(Some(ast::Element::EnumField(self.parse_enum_field()?)))
            }
            _ => self.unexpected_token("an enum value, 'option', 'reserved' or '}'"),
        }
    }

    fn parse_enum_field(&mut self) -> Result<ast::EnumField, ()> {
        let comment = self.take_leading();
        let name = self.parse_ident()?;
        self.expect_eq(Token::Equals)?;

        let value_start = self.peek_start();
        let negative = matches!(self.peek(), Some((Token::Minus, _)));
        if negative {
            self.bump();
        }
        let magnitude = match self.peek() {
            Some((Token::IntLiteral(value), _)) => {
                self.bump();
                value
            }
            _ => self.unexpected_token("an integer")?,
        };
        let value_span = value_start..self.last_end;

        let value = match signed_value(negative, magnitude) {
            Some(value) => value,
            None => {
                self.add_error(ParseErrorKind::InvalidEnumNumber {
                    span: value_span.clone(),
                });
                0
            }
        };

        let options = self.parse_field_options()?;
        self.expect_eq(Token::Semicolon)?;

        Ok(ast::EnumField {
            span: name.span.start..self.last_end,
            name,
            value,
            value_span,
            options,
            comment,
        })
    }

    fn parse_service(&mut self) -> Result<ast::Service, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::SERVICE)?.start;

        let name = self.parse_ident()?;
        let elements = self.parse_body(Self::parse_service_element)?;

        Ok(ast::Service {
            name,
            elements,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_service_element(&mut self) -> Result<Option<ast::Element>, ()> {
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
                Ok(None)
            }
            Some((Token::Ident("option"), _)) => Ok(Some(ast::Element::Option(self.parse_option()?))),
            Some((Token::Ident("rpc"), _)) => Ok(Some(ast::Element::Rpc(self.parse_rpc()?))),
            _ => self.unexpected_token("'option', 'rpc' or '}'"),
        }
    }

    fn parse_rpc(&mut self) -> Result<ast::Rpc, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::RPC)?.start;

        let name = self.parse_ident()?;

        self.expect_eq(Token::LeftParen)?;
        let client_streaming = self.bump_if_stream();
        let input_ty = self.parse_type_name()?;
        self.expect_eq(Token::RightParen)?;

        self.expect_eq(Token::RETURNS)?;

        self.expect_eq(Token::LeftParen)?;
        let server_streaming = self.bump_if_stream();
        let output_ty = self.parse_type_name()?;
        self.expect_eq(Token::RightParen)?;

        let mut options = Vec::new();
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
            }
            Some((Token::LeftBrace, _)) => {
                self.bump();
                loop {
                    match self.peek() {
                        Some((Token::Ident("option"), _)) => options.push(self.parse_option()?),
                        Some((Token::Semicolon, _)) => {
                            self.bump();
                        }
                        Some((Token::RightBrace, _)) => {
                            self.bump();
                            break;
                        }
                        _ => self.unexpected_token("'option', ';' or '}'")?,
                    }
                }
            }
            _ => self.unexpected_token("';' or '{'")?,
        }

        Ok(ast::Rpc {
            name,
            input_ty,
            client_streaming,
            output_ty,
            server_streaming,
            options,
            span: start..self.last_end,
            comment,
        })
    }

    fn bump_if_stream(&mut self) -> bool {
        if let Some((Token::Ident("stream"), _)) = self.peek() {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_reserved(&mut self) -> Result<ast::Reserved, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::RESERVED)?.start;

        let kind = match self.peek() {
            Some((Token::StringLiteral(_) | Token::Ident(_), _)) => {
                ast::ReservedKind::Names(self.parse_reserved_names()?)
            }
            Some((Token::IntLiteral(_) | Token::Minus, _)) => {
                ast::ReservedKind::Ranges(self.parse_ranges()?)
            }
            _ => self.unexpected_token("a positive integer or string")?,
        };

        self.expect_eq(Token::Semicolon)?;

        Ok(ast::Reserved {
            kind,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_reserved_names(&mut self) -> Result<Vec<ast::Ident>, ()> {
        let mut names = Vec::new();
        loop {
            let name = match self.peek() {
                Some((Token::StringLiteral(_), _)) => {
                    let (value, span) = self.parse_string()?;
                    ast::Ident::new(value, span)
                }
                _ => self.parse_ident()?,
            };
            names.push(name);

            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                }
                _ => return Ok(names),
            }
        }
    }

    fn parse_extensions(&mut self) -> Result<ast::Extensions, ()> {
        let comment = self.take_leading();
        let start = self.expect_eq(Token::EXTENSIONS)?.start;

        let ranges = self.parse_ranges()?;
        let options = self.parse_field_options()?;

        self.expect_eq(Token::Semicolon)?;

        Ok(ast::Extensions {
            ranges,
            options,
            span: start..self.last_end,
            comment,
        })
    }

    fn parse_ranges(&mut self) -> Result<Vec<ast::ReservedRange>, ()> {
        let mut ranges = Vec::new();
        loop {
            ranges.push(self.parse_range()?);

            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                }
                _ => return Ok(ranges),
            }
        }
    }

    fn parse_range(&mut self) -> Result<ast::ReservedRange, ()> {
        let span_start = self.peek_start();
        let start = self.parse_range_bound()?;

        let end = match self.peek() {
            Some((Token::Ident("to"), _)) => {
                self.bump();
                match self.peek() {
                    Some((Token::Ident("max"), _)) => {
                        self.bump();
                        ast::ReservedRangeEnd::Max
                    }
                    _ => ast::ReservedRangeEnd::Int(self.parse_range_bound()?),
                }
            }
            _ => ast::ReservedRangeEnd::None,
        };

        Ok(ast::ReservedRange {
            start,
            end,
            span: span_start..self.last_end,
        })
    }

    fn parse_range_bound(&mut self) -> Result<i32, ()> {
        let start = self.peek_start();
        let negative = matches!(self.peek(), Some((Token::Minus, _)));
        if negative {
            self.bump();
        }

        let magnitude = match self.peek() {
            Some((Token::IntLiteral(value), _)) => {
                self.bump();
                value
            }
            _ => self.unexpected_token("an integer")?,
        };

        match signed_value(negative, magnitude) {
            Some(value) => Ok(value),
            None => {
                self.add_error(ParseErrorKind::IntegerOutOfRange {
                    span: start..self.last_end,
                });
                Ok(0)
            }
        }
    }

    fn parse_field_number(&mut self) -> Result<(i32, Span), ()> {
        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                match i32::try_from(value) {
                    Ok(number) if (1..=MAX_MESSAGE_FIELD_NUMBER).contains(&number) => {
                        Ok((number, span))
                    }
                    _ => {
                        self.add_error(ParseErrorKind::InvalidMessageNumber {
                            span: span.clone(),
                        });
                        Ok((0, span))
                    }
                }
            }
            _ => self.unexpected_token("a positive integer"),
        }
    }

    fn parse_body(&mut self, parse_element: ElementParser<'a>) -> Result<Vec<ast::Element>, ()> {
        self.expect_eq(Token::LeftBrace)?;

        let mut elements = Vec::new();
        loop {
            let peeked = self.peek();
            self.flush_detached(&mut elements);
            match peeked {
                Some((Token::RightBrace, _)) => {
                    if let Some(comment) = self.take_leading() {
                        elements.push(ast::Element::Comment(comment));
                    }
                    self.bump();
                    return Ok(elements);
                }
                Some((_, span)) => match parse_element(self) {
                    Ok(Some(element)) => elements.push(element),
                    Ok(None) => {}
                    Err(()) => self.recover(span.start, true),
                },
                None => return self.unexpected_token("'}'"),
            }
        }
    }

    fn parse_type_name(&mut self) -> Result<ast::TypeName, ()> {
        let leading_dot = match self.peek() {
            Some((Token::Dot, span)) => {
                self.bump();
                Some(span)
            }
            _ => None,
        };

        let first = self.parse_ident()?;
        self.parse_type_name_rest(leading_dot, first)
    }

    fn parse_type_name_rest(
        &mut self,
        leading_dot: Option<Span>,
        first: ast::Ident,
    ) -> Result<ast::TypeName, ()> {
        let mut parts = vec![first];
        while let Some((Token::Dot, _)) = self.peek() {
            self.bump();
            parts.push(self.parse_ident()?);
        }

        Ok(ast::TypeName { leading_dot, parts })
    }

    fn parse_ident(&mut self) -> Result<ast::Ident, ()> {
        match self.peek() {
            Some((Token::Ident(value), span)) => {
                self.bump();
                Ok(ast::Ident::new(value, span))
            }
            _ => self.unexpected_token("an identifier"),
        }
    }

    fn parse_string(&mut self) -> Result<(String, Span), ()> {
        let (mut bytes, mut span) = match self.peek() {
            Some((Token::StringLiteral(value), span)) => {
                self.bump();
                (value.into_owned(), span)
            }
            _ => return self.unexpected_token("a string literal"),
        };

        // Adjacent string literals are concatenated.
        while let Some((Token::StringLiteral(value), next)) = self.peek() {
            self.bump();
            bytes.extend_from_slice(&value);
            span.end = next.end;
        }

        match String::from_utf8(bytes) {
            Ok(value) => Ok((value, span)),
            Err(err) => {
                self.add_error(ParseErrorKind::InvalidUtf8String { span: span.clone() });
                Ok((String::from_utf8_lossy(err.as_bytes()).into_owned(), span))
            }
        }
    }

    fn expect_eq(&mut self, t: Token<'a>) -> Result<Span, ()> {
        match self.peek() {
            Some((tok, span)) if tok == t => {
                self.bump();
                Ok(span)
            }
            _ => self.unexpected_token(format!("'{}'", t)),
        }
    }

    fn recover(&mut self, start: usize, in_body: bool) {
        if matches!(self.peek(), Some((_, span)) if span.start == start) {
            self.bump();
        }

        loop {
            match self.peek() {
                None => return,
                Some((Token::Semicolon, _)) => {
                    self.bump();
                    return;
                }
                Some((Token::RightBrace, _)) if in_body => return,
                Some((tok, _)) if is_statement_start(&tok) => return,
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn take_leading(&mut self) -> Option<ast::Comment> {
        self.leading.take()
    }

    fn flush_detached(&mut self, elements: &mut Vec<ast::Element>) {
        elements.extend(
            self.comments
                .take_detached()
                .into_iter()
                .map(ast::Element::Comment),
        );
    }

    fn peek_start(&mut self) -> usize {
        match self.peek() {
            Some((_, span)) => span.start,
            None => self.last_end,
        }
    }

    fn bump(&mut self) -> (Token<'a>, Span) {
        let (tok, span) = self
            .peek
            .take()
            .expect("called bump without peek returning Some()");
        self.last_end = span.end;
        (tok, span)
    }

    fn peek(&mut self) -> Option<(Token<'a>, Span)> {
        if self.peek.is_none() {
            self.peek = self.next();
        }
        self.peek.clone()
    }

    fn next(&mut self) -> Option<(Token<'a>, Span)> {
        loop {
            let tok = self.lexer.next();
            let span = self.lexer.span();
            match tok {
                Some(Ok(Token::Newline)) => self.comments.newline(),
                Some(Ok(Token::LineComment(text))) => self.comments.line_comment(&text, span),
                Some(Ok(Token::BlockComment(text))) => self.comments.block_comment(&text, span),
                Some(Ok(tok)) => {
                    self.leading = self.comments.token();
                    return Some((tok, span));
                }
                Some(Err(())) => self.add_error(ParseErrorKind::InvalidToken { span }),
                None => {
                    self.comments.finish();
                    return None;
                }
            }
        }
    }

    fn unexpected_token<T>(&mut self, expected: impl ToString) -> Result<T, ()> {
        match self.peek() {
            Some((found, span)) => self.add_error(ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
                span,
            }),
            None => {
                let reported = matches!(
                    self.lexer.extras.errors.last(),
                    Some(ParseErrorKind::UnexpectedEof { .. })
                );
                if !reported {
                    self.add_error(ParseErrorKind::UnexpectedEof {
                        expected: expected.to_string(),
                    });
                }
            }
        }
        Err(())
    }

    fn add_error(&mut self, err: ParseErrorKind) {
        self.lexer.extras.errors.push(err);
    }
}

fn signed_value(negative: bool, magnitude: u64) -> Option<i32> {
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    i32::try_from(value).ok()
}

fn is_statement_start(tok: &Token) -> bool {
    matches!(
        tok,
        Token::Ident(
            "syntax"
                | "package"
                | "import"
                | "option"
                | "message"
                | "enum"
                | "service"
                | "extend"
                | "rpc"
                | "oneof"
                | "map"
                | "reserved"
                | "extensions"
                | "optional"
                | "required"
                | "repeated"
        )
    )
}

fn is_valid_group_name(s: &str) -> bool {
    !s.is_empty()
        && s.as_bytes()[0].is_ascii_uppercase()
        && s.as_bytes()[1..]
            .iter()
            .all(|&ch| ch.is_ascii_alphanumeric() || ch == b'_')
}
