use proptest::prelude::*;

use super::*;

#[test]
fn simple_tokens() {
    let source = r#"hell0 052 42 0x2A 5. 0.5 0.42e+2 2e-4 .2e+3 52e3 true
        false "hello \a\b\f\n\r\t\v\?\\\'\" \052 \x2a" 'hello 😀' _foo"#;
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("hell0"))));
    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(42))));
    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(42))));
    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(42))));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral(EqFloat(5.)))));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral(EqFloat(0.5)))));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::FloatLiteral(EqFloat(0.42e+2))))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral(EqFloat(2e-4)))));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral(EqFloat(0.2e+3)))));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral(EqFloat(52e3)))));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("true"))));
    assert_eq!(lexer.next(), Some(Ok(Token::Newline)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("false"))));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(
            b"hello \x07\x08\x0c\n\r\t\x0b?\\'\" * *".as_ref().into()
        )))
    );
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(
            "hello 😀".as_bytes().into()
        )))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("_foo"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn punctuation() {
    let source = "map<string, int32> foo = 1 [(a.b).c = -2];";
    let tokens: Vec<_> = Token::lexer(source).collect();

    assert_eq!(
        tokens,
        vec![
            Ok(Token::MAP),
            Ok(Token::LeftAngleBracket),
            Ok(Token::Ident("string")),
            Ok(Token::Comma),
            Ok(Token::Ident("int32")),
            Ok(Token::RightAngleBracket),
            Ok(Token::Ident("foo")),
            Ok(Token::Equals),
            Ok(Token::IntLiteral(1)),
            Ok(Token::LeftBracket),
            Ok(Token::LeftParen),
            Ok(Token::Ident("a")),
            Ok(Token::Dot),
            Ok(Token::Ident("b")),
            Ok(Token::RightParen),
            Ok(Token::Dot),
            Ok(Token::Ident("c")),
            Ok(Token::Equals),
            Ok(Token::Minus),
            Ok(Token::IntLiteral(2)),
            Ok(Token::RightBracket),
            Ok(Token::Semicolon),
        ]
    );
}

#[test]
fn integer_overflow() {
    let source = "99999999999999999999999999999999999999 4";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(0))));
    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(4))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::IntegerOutOfRange {
            span: 0..(source.len() - 2),
        }]
    );
}

#[test]
fn int_followed_by_ident() {
    let mut lexer = Token::lexer("10to 20");

    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(10))));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("to"))));
    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(20))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::NoSpaceBetweenIntAndIdent { span: 0..4 }]
    );
}

#[test]
fn line_comments() {
    let source = "foo // bar\r\n// baz\nquz";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::LineComment(" bar".into())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Newline)));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::LineComment(" baz".into())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Newline)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("quz"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn block_comments() {
    let source = "/* one */ foo /*\n * two\n * three\n */";
    let mut lexer = Token::lexer(source);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::BlockComment(" one ".into())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::BlockComment("\n two\n three\n".into())))
    );
    assert_eq!(lexer.next(), None);

    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn nested_block_comment() {
    let source = "/* /* */ foo";
    let mut lexer = Token::lexer(source);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::BlockComment(" /* ".into())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::NestedBlockComment { span: 3..5 }]
    );
}

#[test]
fn unterminated_block_comment() {
    let mut lexer = Token::lexer("foo /* bar");

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(
        lexer.next(),
        Some(Ok(Token::BlockComment(" bar".into())))
    );
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::UnexpectedEof {
            expected: "comment terminator".to_owned()
        }]
    );
}

#[test]
fn string_unterminated() {
    let mut lexer = Token::lexer("\"hello \n foo");

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(b"hello ".as_ref().into())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Newline)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::UnterminatedString { span: 7..8 }]
    );
}

#[test]
fn string_invalid_escape() {
    let mut lexer = Token::lexer(r#""\m" foo"#);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(b"m".as_ref().into())))
    );
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::InvalidStringEscape { span: 1..2 }]
    );
}

#[test]
fn string_mismatched_quote() {
    let mut lexer = Token::lexer(r#"'it"s'"#);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(b"it\"s".as_ref().into())))
    );
    assert_eq!(lexer.next(), None);
    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn invalid_token() {
    let mut lexer = Token::lexer("foo @ bar");

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), Some(Err(())));
    assert_eq!(lexer.span(), 4..5);
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("bar"))));
    assert_eq!(lexer.next(), None);
}

proptest! {
    #[test]
    fn prop_lex_terminates(s in ".{0,256}") {
        let count = Token::lexer(&s).take(1024).count();
        prop_assert!(count <= s.len());
    }

    #[test]
    fn prop_lex_int(value: u64) {
        let source = value.to_string();
        let mut lexer = Token::lexer(&source);
        prop_assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(value))));
        prop_assert_eq!(lexer.next(), None);
    }
}
