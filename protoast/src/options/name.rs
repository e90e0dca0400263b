/// An option name with brackets removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionName {
    pub name: String,
    /// Whether any part of the name was bracketed, i.e. refers to an extension.
    pub extension: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Dot,
    Open,
    Close,
}

fn tokenize(raw: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let mut chars = raw.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            '.' => tokens.push(Token::Dot),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            ch if ch.is_ascii_alphanumeric() || ch == '_' => {
                let mut end = start + ch.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        end = index + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(&raw[start..end]));
            }
            ch => return Err(format!("unexpected character '{}'", ch)),
        }
    }
    Ok(tokens)
}

/// Validates an option name such as `(foo.bar).baz` and joins its parts with dots.
pub(crate) fn normalize(raw: &str) -> Result<OptionName, String> {
    let tokens = tokenize(raw)?;
    if tokens.is_empty() {
        return Err("name is empty".to_owned());
    }
    if tokens.last() == Some(&Token::Dot) {
        return Err("name ends with a dot".to_owned());
    }

    let mut parts = Vec::new();
    let mut open = false;
    let mut extension = false;
    let mut prev = None;
    for (index, &token) in tokens.iter().enumerate() {
        let next = tokens.get(index + 1).copied();
        match token {
            Token::Ident(ident) => {
                if prev == Some(Token::Close) {
                    return Err(format!("unexpected identifier '{}'", ident));
                }
                parts.push(ident);
            }
            Token::Dot => {
                let leading = prev == Some(Token::Open) && matches!(next, Some(Token::Ident(_)));
                let between = matches!(prev, Some(Token::Ident(_)) | Some(Token::Close))
                    && matches!(next, Some(Token::Ident(_)) | Some(Token::Open));
                if !leading && !between {
                    return Err("unexpected dot".to_owned());
                }
            }
            Token::Open => {
                if open {
                    return Err("nested brackets".to_owned());
                }
                if !matches!(prev, None | Some(Token::Dot)) {
                    return Err("unexpected '('".to_owned());
                }
                if next == Some(Token::Close) {
                    return Err("empty brackets".to_owned());
                }
                open = true;
                extension = true;
            }
            Token::Close => {
                if !open {
                    return Err("unbalanced brackets".to_owned());
                }
                open = false;
            }
        }
        prev = Some(token);
    }

    if open {
        return Err("unbalanced brackets".to_owned());
    }

    Ok(OptionName {
        name: parts.join("."),
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(raw: &str) -> (String, bool) {
        let name = normalize(raw).unwrap();
        (name.name, name.extension)
    }

    #[test]
    fn valid_names() {
        assert_eq!(ok("deprecated"), ("deprecated".to_owned(), false));
        assert_eq!(ok("(status)"), ("status".to_owned(), true));
        assert_eq!(ok("(common.status)"), ("common.status".to_owned(), true));
        assert_eq!(
            ok("(common.v1.log).level"),
            ("common.v1.log.level".to_owned(), true)
        );
        assert_eq!(ok("(.foo.bar)"), ("foo.bar".to_owned(), true));
        assert_eq!(ok("a.(b).c"), ("a.b.c".to_owned(), true));
    }

    #[test]
    fn invalid_names() {
        assert_eq!(normalize("").unwrap_err(), "name is empty");
        assert_eq!(normalize("foo.").unwrap_err(), "name ends with a dot");
        assert_eq!(normalize("(foo").unwrap_err(), "unbalanced brackets");
        assert_eq!(normalize("foo)").unwrap_err(), "unbalanced brackets");
        assert_eq!(normalize("((foo))").unwrap_err(), "nested brackets");
        assert_eq!(normalize("()").unwrap_err(), "empty brackets");
        assert_eq!(normalize("foo..bar").unwrap_err(), "unexpected dot");
        assert_eq!(normalize(".foo").unwrap_err(), "unexpected dot");
        assert_eq!(normalize("(foo)bar").unwrap_err(), "unexpected identifier 'bar'");
        assert_eq!(normalize("foo(bar)").unwrap_err(), "unexpected '('");
        assert_eq!(normalize("foo bar").unwrap_err(), "unexpected character ' '");
    }
}
