//! Token definitions for the lexer

use crate::common::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};

/// A token with its kind, span, and text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Token kinds recognized by the lexer
///
/// `Newline`, `Indent` and `Dedent` are produced by the layout pass in
/// [`super::lex`]; logos only ever yields the physical `Newline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Serialize, Deserialize)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"\\\r?\n")]
pub enum TokenKind {
    // Keywords
    #[token("and")]
    And,
    #[token("assert")]
    Assert,
    #[token("break")]
    Break,
    #[token("class")]
    Class,
    #[token("continue")]
    Continue,
    #[token("def")]
    Def,
    #[token("del")]
    Del,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("except")]
    Except,
    #[token("finally")]
    Finally,
    #[token("for")]
    For,
    #[token("from")]
    From,
    #[token("global")]
    Global,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("in")]
    In,
    #[token("is")]
    Is,
    #[token("lambda")]
    Lambda,
    #[token("not")]
    Not,
    #[token("or")]
    Or,
    #[token("pass")]
    Pass,
    #[token("print")]
    Print,
    #[token("raise")]
    Raise,
    #[token("return")]
    Return,
    #[token("try")]
    Try,
    #[token("while")]
    While,

    // Literals
    #[regex(r"0[xX][0-9a-fA-F]+[lL]?")]
    HexLit,
    #[regex(r"[0-9]+[lL]?")]
    IntLit,
    #[regex(r#"[rR]?'([^'\\\n]|\\(.|\n))*'"#)]
    #[regex(r#"[rR]?"([^"\\\n]|\\(.|\n))*""#)]
    StringLit,
    #[regex(r"[rR]?'''", triple_quoted)]
    #[regex(r#"[rR]?""""#, triple_quoted)]
    TripleStringLit,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 1)]
    Ident,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<>")]
    LtGt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Punctuation
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("`")]
    Backtick,

    // Layout
    #[token("\n")]
    Newline,
    Indent,
    Dedent,

    // Special
    Eof,
}

/// Consume the body of a triple-quoted string up to and including the
/// closing delimiter. Returns false when the input ends first.
fn triple_quoted(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let quote = if lex.slice().ends_with('"') {
        "\"\"\""
    } else {
        "'''"
    }
    .as_bytes();
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(quote) {
            lex.bump(i + 3);
            return true;
        }
        i += 1;
    }
    false
}

impl TokenKind {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Assert
                | TokenKind::Break
                | TokenKind::Class
                | TokenKind::Continue
                | TokenKind::Def
                | TokenKind::Del
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::Except
                | TokenKind::Finally
                | TokenKind::For
                | TokenKind::From
                | TokenKind::Global
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Lambda
                | TokenKind::Not
                | TokenKind::Or
                | TokenKind::Pass
                | TokenKind::Print
                | TokenKind::Raise
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::While
        )
    }

    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::HexLit
                | TokenKind::StringLit
                | TokenKind::TripleStringLit
        )
    }

    /// Tokens that may begin an expression
    pub fn starts_expr(&self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Ident
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
                    | TokenKind::Backtick
                    | TokenKind::Minus
                    | TokenKind::Plus
                    | TokenKind::Tilde
                    | TokenKind::Not
                    | TokenKind::Lambda
            )
    }

    /// Get the string representation of the token
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::And => "and",
            TokenKind::Assert => "assert",
            TokenKind::Break => "break",
            TokenKind::Class => "class",
            TokenKind::Continue => "continue",
            TokenKind::Def => "def",
            TokenKind::Del => "del",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::Except => "except",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::From => "from",
            TokenKind::Global => "global",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Is => "is",
            TokenKind::Lambda => "lambda",
            TokenKind::Not => "not",
            TokenKind::Or => "or",
            TokenKind::Pass => "pass",
            TokenKind::Print => "print",
            TokenKind::Raise => "raise",
            TokenKind::Return => "return",
            TokenKind::Try => "try",
            TokenKind::While => "while",
            TokenKind::HexLit | TokenKind::IntLit => "integer literal",
            TokenKind::StringLit | TokenKind::TripleStringLit => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Tilde => "~",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Eq => "=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::LtGt => "<>",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Backtick => "`",
            TokenKind::Newline => "<newline>",
            TokenKind::Indent => "<indent>",
            TokenKind::Dedent => "<dedent>",
            TokenKind::Eof => "<eof>",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
