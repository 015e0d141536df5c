//! Lexer
//!
//! Two stages: logos splits the text into raw tokens, then a layout pass
//! turns physical lines into `Newline`/`Indent`/`Dedent` tokens the way the
//! block grammar expects them. Newlines inside brackets are dropped, as are
//! blank and comment-only lines.

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{SourceFile, SyntaxError};
use logos::Logos;

/// Tab stops are every eight columns
const TAB_WIDTH: usize = 8;

/// Lex source text under the default source name
pub fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    lex_file(&SourceFile::new("<input>", source))
}

/// Lex a source file into a layout-resolved token stream ending in `Eof`
pub fn lex_file(file: &SourceFile) -> Result<Vec<Token>, SyntaxError> {
    let source: &str = &file.content;
    let mut raw = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        let text = lexer.slice();
        match result {
            Ok(kind) => raw.push(Token {
                kind,
                span,
                text: text.to_string(),
            }),
            Err(()) => {
                let quoted = text
                    .trim_start_matches(['r', 'R'])
                    .starts_with(['\'', '"']);
                return Err(if quoted {
                    SyntaxError::UnterminatedString {
                        span: span.into(),
                        src: file.to_named_source(),
                    }
                } else {
                    SyntaxError::InvalidToken {
                        text: text.to_string(),
                        span: span.into(),
                        src: file.to_named_source(),
                    }
                });
            }
        }
    }

    Layout::new(file).run(raw)
}

/// Indentation tracking state
struct Layout<'a> {
    file: &'a SourceFile,
    indents: Vec<usize>,
    depth: usize,
    at_line_start: bool,
    out: Vec<Token>,
}

impl<'a> Layout<'a> {
    fn new(file: &'a SourceFile) -> Self {
        Self {
            file,
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            out: Vec::new(),
        }
    }

    fn run(mut self, raw: Vec<Token>) -> Result<Vec<Token>, SyntaxError> {
        for token in raw {
            if token.kind == TokenKind::Newline {
                if self.depth == 0 && !self.at_line_start {
                    self.out.push(token);
                    self.at_line_start = true;
                }
                continue;
            }

            if self.at_line_start {
                self.indent_to(token.span.start)?;
                self.at_line_start = false;
            }

            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => self.depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    self.depth = self.depth.saturating_sub(1)
                }
                _ => {}
            }
            self.out.push(token);
        }

        let end = self.file.content.len();
        if !self.at_line_start {
            self.out.push(synthetic(TokenKind::Newline, end));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.out.push(synthetic(TokenKind::Dedent, end));
        }
        self.out.push(synthetic(TokenKind::Eof, end));
        Ok(self.out)
    }

    /// Emit indentation changes for a logical line starting at `pos`
    fn indent_to(&mut self, pos: usize) -> Result<(), SyntaxError> {
        let column = self.column_of(pos);
        let top = self.indents.last().copied().unwrap_or(0);

        if column > top {
            self.indents.push(column);
            self.out.push(synthetic(TokenKind::Indent, pos));
            return Ok(());
        }

        while column < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.out.push(synthetic(TokenKind::Dedent, pos));
        }
        if column != self.indents.last().copied().unwrap_or(0) {
            return Err(SyntaxError::InconsistentDedent {
                span: Span::point(pos).into(),
                src: self.file.to_named_source(),
            });
        }
        Ok(())
    }

    fn column_of(&self, pos: usize) -> usize {
        let before = &self.file.content[..pos];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        before[line_start..].chars().fold(0, |col, c| match c {
            '\t' => (col / TAB_WIDTH + 1) * TAB_WIDTH,
            '\x0c' => 0,
            _ => col + 1,
        })
    }
}

fn synthetic(kind: TokenKind, pos: usize) -> Token {
    Token {
        kind,
        span: Span::point(pos),
        text: String::new(),
    }
}

/// Decode the text of a string literal token into its value
///
/// Handles the raw prefix and both single and triple quoting. Escapes the
/// language does not know are kept verbatim, backslash included.
pub fn unquote(text: &str) -> String {
    let (raw, body) = match text.strip_prefix(['r', 'R']) {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let quote_len = if body.starts_with("'''") || body.starts_with("\"\"\"") {
        3
    } else {
        1
    };
    let inner = &body[quote_len..body.len() - quote_len];
    let inner = inner.replace("\r\n", "\n");
    if raw {
        inner
    } else {
        decode_escapes(&inner)
    }
}

fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code & 0xff).unwrap_or('\0'));
            }
            'x' if chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) => {
                let mut code = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                    code = (code * 16 + d) & 0xff;
                    chars.next();
                }
                out.push(char::from_u32(code & 0xff).unwrap_or('\0'));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}
