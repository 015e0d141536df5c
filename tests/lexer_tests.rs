//! Lexer tests

use serpent::diagnostics::SyntaxError;
use serpent::lexer::{TokenKind, lex, unquote};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_lex_empty() {
    let tokens = lex("").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_lex_blank_lines_and_comments() {
    let tokens = lex("   \n\n  # just a comment\n").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_lex_simple_assignment() {
    let tokens = lex("x = 42").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Ident);
    assert_eq!(tokens[0].text, "x");
    assert_eq!(tokens[1].kind, TokenKind::Eq);
    assert_eq!(tokens[2].kind, TokenKind::IntLit);
    assert_eq!(tokens[2].text, "42");
    assert_eq!(tokens[3].kind, TokenKind::Newline);
    assert_eq!(tokens[4].kind, TokenKind::Eof);
}

#[test]
fn test_lex_keywords() {
    let source = "def class if elif else while for in not and or is lambda";
    assert_eq!(
        kinds(source)[..13],
        [
            TokenKind::Def,
            TokenKind::Class,
            TokenKind::If,
            TokenKind::Elif,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::For,
            TokenKind::In,
            TokenKind::Not,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Is,
            TokenKind::Lambda,
        ]
    );
}

#[test]
fn test_lex_keyword_prefix_is_identifier() {
    let tokens = lex("define printer iffy").unwrap();
    assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Ident));
}

// ==================== Literals ====================

#[test]
fn test_lex_integer_literals() {
    let tokens = lex("0 42L 011 0xAB 0XffL").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::IntLit);
    assert_eq!(tokens[1].kind, TokenKind::IntLit);
    assert_eq!(tokens[1].text, "42L");
    assert_eq!(tokens[2].kind, TokenKind::IntLit);
    assert_eq!(tokens[3].kind, TokenKind::HexLit);
    assert_eq!(tokens[4].kind, TokenKind::HexLit);
    assert_eq!(tokens[4].text, "0XffL");
}

#[test]
fn test_lex_string_literals() {
    let tokens = lex(r#"'a' "b" r'\n' '''x''' """y""""#).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::StringLit);
    assert_eq!(tokens[1].kind, TokenKind::StringLit);
    assert_eq!(tokens[2].kind, TokenKind::StringLit);
    assert_eq!(tokens[2].text, r"r'\n'");
    assert_eq!(tokens[3].kind, TokenKind::TripleStringLit);
    assert_eq!(tokens[4].kind, TokenKind::TripleStringLit);
}

#[test]
fn test_lex_triple_quoted_spans_lines() {
    let tokens = lex("s = '''one\ntwo'''\nt").unwrap();
    assert_eq!(tokens[2].kind, TokenKind::TripleStringLit);
    assert_eq!(tokens[2].text, "'''one\ntwo'''");
    assert_eq!(tokens[3].kind, TokenKind::Newline);
    assert_eq!(tokens[4].text, "t");
}

#[test]
fn test_unquote_escapes() {
    assert_eq!(unquote(r"'a\tb'"), "a\tb");
    assert_eq!(unquote(r#"'it\'s'"#), "it's");
    assert_eq!(unquote(r"'\101\x42'"), "AB");
    assert_eq!(unquote(r"'\q'"), "\\q");
    assert_eq!(unquote(r"r'\n'"), "\\n");
    assert_eq!(unquote("'''a\r\nb'''"), "a\nb");
    assert_eq!(unquote("\"\""), "");
}

#[test]
fn test_lex_unterminated_string() {
    let err = lex("x = 'abc\n").unwrap_err();
    assert!(matches!(err, SyntaxError::UnterminatedString { .. }), "got {:?}", err);
}

#[test]
fn test_lex_invalid_token() {
    let err = lex("a = $").unwrap_err();
    assert!(matches!(err, SyntaxError::InvalidToken { .. }), "got {:?}", err);
    assert_eq!(err.offset(), 4);
}

// ==================== Operators ====================

#[test]
fn test_lex_operators() {
    let source = "+ - * ** / % << >> & | ^ ~ < > <= >= == != <>";
    assert_eq!(
        kinds(source)[..19],
        [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::StarStar,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Shl,
            TokenKind::Shr,
            TokenKind::Amp,
            TokenKind::Pipe,
            TokenKind::Caret,
            TokenKind::Tilde,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Le,
            TokenKind::Ge,
            TokenKind::EqEq,
            TokenKind::Ne,
            TokenKind::LtGt,
        ]
    );
}

#[test]
fn test_lex_backquote() {
    assert_eq!(
        kinds("`1`")[..3],
        [TokenKind::Backtick, TokenKind::IntLit, TokenKind::Backtick]
    );
}

// ==================== Layout ====================

#[test]
fn test_lex_indent_and_dedent() {
    let source = "if x:\n    y\nz\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_dedents_closed_at_end() {
    let source = "if a:\n  if b:\n    c";
    let kinds = kinds(source);
    let tail = &kinds[kinds.len() - 4..];
    assert_eq!(
        tail,
        [
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_lex_newlines_inside_brackets_ignored() {
    let source = "x = (1,\n     2)\n";
    assert!(!kinds(source)[..7].contains(&TokenKind::Newline));
    assert_eq!(kinds(source).iter().filter(|k| **k == TokenKind::Indent).count(), 0);
}

#[test]
fn test_lex_backslash_continuation() {
    let source = "x = 1 + \\\n    2\n";
    let kinds = kinds(source);
    assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    assert!(!kinds.contains(&TokenKind::Indent));
}

#[test]
fn test_lex_tab_is_eight_columns() {
    // A tab and eight spaces open the same block
    let source = "if x:\n\ty\n        z\n";
    assert!(lex(source).is_ok());
}

#[test]
fn test_lex_inconsistent_dedent() {
    let source = "if x:\n    y\n  z\n";
    let err = lex(source).unwrap_err();
    assert!(matches!(err, SyntaxError::InconsistentDedent { .. }), "got {:?}", err);
}
