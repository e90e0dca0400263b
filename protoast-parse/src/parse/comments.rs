use std::mem::{replace, take};

use logos::Span;

use crate::ast;

/// Tracks comments between tokens and decides which become leading comments.
#[derive(Debug)]
pub(super) struct Comments {
    state: State,
    detached: Vec<ast::Comment>,
}

#[derive(Debug)]
enum State {
    /// A token was seen on the current line.
    AfterToken,
    /// No pending comment; `newlines` line breaks since the last token.
    Idle { newlines: usize },
    /// A comment waiting to be attached to the next token.
    Pending {
        comment: ast::Comment,
        is_line: bool,
        newlines: usize,
    },
}

impl Comments {
    pub fn new() -> Self {
        Comments {
            state: State::Idle { newlines: 0 },
            detached: Vec::new(),
        }
    }

    pub fn line_comment(&mut self, text: &str, span: Span) {
        self.comment(vec![text.to_owned()], span, true);
    }

    pub fn block_comment(&mut self, text: &str, span: Span) {
        let lines = text.split('\n').map(str::to_owned).collect();
        self.comment(lines, span, false);
    }

    fn comment(&mut self, lines: Vec<String>, span: Span, is_line: bool) {
        self.state = match replace(&mut self.state, State::AfterToken) {
            // Trailing comments are discarded.
            State::AfterToken => State::AfterToken,
            State::Idle { .. } => State::Pending {
                comment: ast::Comment { lines, span },
                is_line,
                newlines: 0,
            },
            State::Pending {
                mut comment,
                is_line: prev_is_line,
                newlines,
            } => {
                if prev_is_line && is_line && newlines <= 1 {
                    comment.lines.extend(lines);
                    comment.span.end = span.end;
                    State::Pending {
                        comment,
                        is_line,
                        newlines: 0,
                    }
                } else {
                    self.detached.push(comment);
                    State::Pending {
                        comment: ast::Comment { lines, span },
                        is_line,
                        newlines: 0,
                    }
                }
            }
        };
    }

    pub fn newline(&mut self) {
        match &mut self.state {
            State::AfterToken => self.state = State::Idle { newlines: 1 },
            State::Idle { newlines } | State::Pending { newlines, .. } => *newlines += 1,
        }
    }

    /// Called for every significant token. Returns the comment directly preceding it, if any.
    pub fn token(&mut self) -> Option<ast::Comment> {
        match replace(&mut self.state, State::AfterToken) {
            State::Pending {
                comment, newlines, ..
            } if newlines <= 1 => Some(comment),
            State::Pending { comment, .. } => {
                self.detached.push(comment);
                None
            }
            State::AfterToken | State::Idle { .. } => None,
        }
    }

    pub fn finish(&mut self) {
        if let State::Pending { comment, .. } =
            replace(&mut self.state, State::Idle { newlines: 0 })
        {
            self.detached.push(comment);
        }
    }

    pub fn take_detached(&mut self) -> Vec<ast::Comment> {
        take(&mut self.detached)
    }
}
