//! Parser
//!
//! A recursive descent parser that produces an AST from the layout-resolved
//! token stream. Binary arithmetic and bitwise operators are parsed by
//! precedence climbing; the boolean and comparison layers above them and
//! the unary/power layers below them have their own functions because their
//! operands bind differently.

use crate::ast::*;
use crate::common::{Span, ensure_stack};
use crate::diagnostics::{SourceFile, SyntaxError};
use crate::lexer::{self, Token, TokenKind};
use num_bigint::BigInt;
use std::rc::Rc;

type Result<T> = std::result::Result<T, SyntaxError>;

/// Deepest nesting of bracketed expressions, unary chains and blocks
pub const MAX_NESTING: usize = 500;

/// Parse a token stream into a module
pub fn parse(tokens: &[Token], file: &SourceFile) -> Result<Module> {
    let mut parser = Parser::new(tokens, file);
    parser.parse_module()
}

/// Lex and parse source text under the default source name
pub fn parse_source(source: &str) -> Result<Module> {
    let file = SourceFile::new("<input>", source);
    let tokens = lexer::lex_file(&file)?;
    parse(&tokens, &file)
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a SourceFile,
    eof: Token,
    /// Enclosing loops in the current function or class body
    loop_depth: usize,
    /// Enclosing function bodies
    fn_depth: usize,
    /// Current expression and block nesting
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file: &'a SourceFile) -> Self {
        let end = file.content.len();
        Self {
            tokens,
            pos: 0,
            file,
            eof: Token {
                kind: TokenKind::Eof,
                span: Span::point(end),
                text: String::new(),
            },
            loop_depth: 0,
            fn_depth: 0,
            nesting: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_n(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek())
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("`{}`", kind)))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::Ident)?.text)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    /// Span from `start` up to the end of the last consumed token
    fn span_from(&self, start: Span) -> Span {
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(start.end);
        Span::new(start.start, end.max(start.start))
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let tok = self.current();
        let found = match tok.kind {
            TokenKind::Ident | TokenKind::IntLit | TokenKind::HexLit => format!("`{}`", tok.text),
            kind if kind.is_keyword() => format!("keyword `{}`", kind),
            kind => format!("`{}`", kind),
        };
        SyntaxError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            span: tok.span.into(),
            src: self.file.to_named_source(),
        }
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= MAX_NESTING {
            return Err(SyntaxError::TooDeeplyNested {
                limit: MAX_NESTING,
                span: self.span().into(),
                src: self.file.to_named_source(),
            });
        }
        self.nesting += 1;
        let result = ensure_stack(|| f(self));
        self.nesting -= 1;
        result
    }

    fn at_line_end(&self) -> bool {
        self.at_any(&[TokenKind::Newline, TokenKind::Semi, TokenKind::Eof])
    }

    // ==================== MODULE ====================

    fn parse_module(&mut self) -> Result<Module> {
        let mut body = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Newline) {
                continue;
            }
            body.extend(self.parse_statement()?);
        }
        Ok(Module { body })
    }

    // ==================== STATEMENTS ====================

    /// One logical line or compound statement
    fn parse_statement(&mut self) -> Result<Vec<Stmt>> {
        let stmt = match self.peek() {
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Def => self.parse_def()?,
            TokenKind::Class => self.parse_class()?,
            _ => return self.parse_simple_line(),
        };
        Ok(vec![stmt])
    }

    /// `small_stmt (';' small_stmt)* [';'] NEWLINE`
    fn parse_simple_line(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = vec![self.parse_small_stmt()?];
        while self.eat(TokenKind::Semi) {
            if self.at_any(&[TokenKind::Newline, TokenKind::Eof]) {
                break;
            }
            stmts.push(self.parse_small_stmt()?);
        }
        if !self.eat(TokenKind::Newline) && !self.at(TokenKind::Eof) {
            return Err(self.unexpected("end of line"));
        }
        Ok(stmts)
    }

    /// Body after a `:`, either on the same line or as an indented block
    fn parse_suite(&mut self) -> Result<Suite> {
        self.expect(TokenKind::Colon)?;
        if !self.eat(TokenKind::Newline) {
            return self.parse_simple_line();
        }
        self.expect(TokenKind::Indent)?;
        let mut body = Vec::new();
        while !self.at_any(&[TokenKind::Dedent, TokenKind::Eof]) {
            body.extend(self.nested(Self::parse_statement)?);
        }
        self.expect(TokenKind::Dedent)?;
        Ok(body)
    }

    fn parse_loop_body(&mut self) -> Result<Suite> {
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        body
    }

    fn parse_else(&mut self) -> Result<Option<Suite>> {
        if self.eat(TokenKind::Else) {
            Ok(Some(self.parse_suite()?))
        } else {
            Ok(None)
        }
    }

    fn parse_small_stmt(&mut self) -> Result<Stmt> {
        let start = self.span();
        let kind = match self.peek() {
            TokenKind::Pass => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Break | TokenKind::Continue => {
                let tok = self.advance();
                if self.loop_depth == 0 {
                    return Err(SyntaxError::OutsideContext {
                        keyword: tok.kind.as_str().to_string(),
                        context: "loop".to_string(),
                        span: tok.span.into(),
                        src: self.file.to_named_source(),
                    });
                }
                if tok.kind == TokenKind::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            TokenKind::Return => {
                let tok = self.advance();
                if self.fn_depth == 0 {
                    return Err(SyntaxError::OutsideContext {
                        keyword: "return".to_string(),
                        context: "function".to_string(),
                        span: tok.span.into(),
                        src: self.file.to_named_source(),
                    });
                }
                if self.at_line_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_testlist()?))
                }
            }
            TokenKind::Raise => {
                self.advance();
                let kind = self.parse_test()?;
                let payload = if self.eat(TokenKind::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                StmtKind::Raise { kind, payload }
            }
            TokenKind::Global => {
                self.advance();
                let mut names = vec![self.expect_ident()?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                StmtKind::Global(names)
            }
            TokenKind::Del => {
                self.advance();
                let targets = match self.parse_exprlist()? {
                    Expr {
                        kind: ExprKind::Tuple(items),
                        ..
                    } if !items.is_empty() => items
                        .into_iter()
                        .map(|e| self.to_target(e))
                        .collect::<Result<Vec<_>>>()?,
                    expr => vec![self.to_target(expr)?],
                };
                StmtKind::Del(targets)
            }
            TokenKind::Print => self.parse_print()?,
            TokenKind::Import => {
                self.advance();
                let mut paths = vec![self.parse_dotted_name()?];
                while self.eat(TokenKind::Comma) {
                    paths.push(self.parse_dotted_name()?);
                }
                StmtKind::Import(paths)
            }
            TokenKind::From => {
                self.advance();
                let module = self.parse_dotted_name()?;
                self.expect(TokenKind::Import)?;
                let names = if self.eat(TokenKind::Star) {
                    ImportNames::All
                } else {
                    let mut names = vec![self.expect_ident()?];
                    while self.eat(TokenKind::Comma) {
                        names.push(self.expect_ident()?);
                    }
                    ImportNames::Names(names)
                };
                StmtKind::FromImport { module, names }
            }
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_test()?;
                let message = if self.eat(TokenKind::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                StmtKind::Assert { test, message }
            }
            _ => self.parse_expr_stmt()?,
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// `testlist ('=' testlist)*`
    fn parse_expr_stmt(&mut self) -> Result<StmtKind> {
        let first = self.parse_testlist()?;
        if !self.at(TokenKind::Eq) {
            return Ok(StmtKind::Expr(first));
        }
        let mut exprs = vec![first];
        while self.eat(TokenKind::Eq) {
            exprs.push(self.parse_testlist()?);
        }
        let value = exprs.pop().ok_or_else(|| self.unexpected("expression"))?;
        let targets = exprs
            .into_iter()
            .map(|e| self.to_target(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(StmtKind::Assign { targets, value })
    }

    fn parse_print(&mut self) -> Result<StmtKind> {
        self.expect(TokenKind::Print)?;
        let mut values = Vec::new();
        let mut trailing_comma = false;
        while !self.at_line_end() {
            values.push(self.parse_test()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
            trailing_comma = self.at_line_end();
        }
        Ok(StmtKind::Print {
            values,
            trailing_comma,
        })
    }

    fn parse_dotted_name(&mut self) -> Result<Vec<String>> {
        let mut path = vec![self.expect_ident()?];
        while self.eat(TokenKind::Dot) {
            path.push(self.expect_ident()?);
        }
        Ok(path)
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.span();
        self.expect(TokenKind::If)?;
        let test = self.parse_test()?;
        let mut branches = vec![(test, self.parse_suite()?)];
        while self.eat(TokenKind::Elif) {
            let test = self.parse_test()?;
            branches.push((test, self.parse_suite()?));
        }
        let orelse = self.parse_else()?;
        Ok(Stmt {
            kind: StmtKind::If { branches, orelse },
            span: self.span_from(start),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.span();
        self.expect(TokenKind::While)?;
        let test = self.parse_test()?;
        let body = self.parse_loop_body()?;
        let orelse = self.parse_else()?;
        Ok(Stmt {
            kind: StmtKind::While { test, body, orelse },
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let start = self.span();
        self.expect(TokenKind::For)?;
        let target = self.parse_exprlist()?;
        let target = self.to_target(target)?;
        self.expect(TokenKind::In)?;
        let iter = self.parse_testlist()?;
        let body = self.parse_loop_body()?;
        let orelse = self.parse_else()?;
        Ok(Stmt {
            kind: StmtKind::For {
                target,
                iter,
                body,
                orelse,
            },
            span: self.span_from(start),
        })
    }

    fn parse_try(&mut self) -> Result<Stmt> {
        let start = self.span();
        self.expect(TokenKind::Try)?;
        let body = self.parse_suite()?;

        let mut handlers = Vec::new();
        while self.at(TokenKind::Except) {
            let handler_start = self.advance().span;
            let (kind, target) = if self.at(TokenKind::Colon) {
                (None, None)
            } else {
                let kind = self.parse_test()?;
                let target = if self.eat(TokenKind::Comma) {
                    let expr = self.parse_test()?;
                    Some(self.to_target(expr)?)
                } else {
                    None
                };
                (Some(kind), target)
            };
            let body = self.parse_suite()?;
            handlers.push(ExceptHandler {
                kind,
                target,
                body,
                span: self.span_from(handler_start),
            });
        }

        let orelse = if handlers.is_empty() {
            None
        } else {
            self.parse_else()?
        };
        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_suite()?)
        } else {
            None
        };
        if handlers.is_empty() && finally.is_none() {
            return Err(self.unexpected("`except` or `finally`"));
        }

        Ok(Stmt {
            kind: StmtKind::Try(TryStmt {
                body,
                handlers,
                orelse,
                finally,
            }),
            span: self.span_from(start),
        })
    }

    fn parse_def(&mut self) -> Result<Stmt> {
        let start = self.span();
        self.expect(TokenKind::Def)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params(TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;

        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.fn_depth += 1;
        let body = self.parse_suite();
        self.fn_depth -= 1;
        self.loop_depth = saved_loops;

        let span = self.span_from(start);
        Ok(Stmt {
            kind: StmtKind::Def(Rc::new(FunctionDef {
                name,
                params,
                body: body?,
                span,
            })),
            span,
        })
    }

    /// Parameter list up to (not including) `close`
    fn parse_params(&mut self, close: TokenKind) -> Result<Params> {
        let mut params = Params::default();
        while !self.at(close) {
            if self.eat(TokenKind::StarStar) {
                params.kwrest = Some(self.expect_ident()?);
            } else if self.eat(TokenKind::Star) {
                params.rest = Some(self.expect_ident()?);
            } else {
                if params.rest.is_some() || params.kwrest.is_some() {
                    return Err(self.unexpected(&format!("`{}`", close)));
                }
                let name = self.expect_ident()?;
                let default = if self.eat(TokenKind::Eq) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                if default.is_none() && params.positional.iter().any(|p| p.default.is_some()) {
                    return Err(self.unexpected("default value"));
                }
                params.positional.push(Param { name, default });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class(&mut self) -> Result<Stmt> {
        let start = self.span();
        self.expect(TokenKind::Class)?;
        let name = self.expect_ident()?;
        let mut bases = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) {
                bases.push(self.parse_test()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        let saved_fns = std::mem::replace(&mut self.fn_depth, 0);
        let body = self.parse_suite();
        self.loop_depth = saved_loops;
        self.fn_depth = saved_fns;

        Ok(Stmt {
            kind: StmtKind::Class(ClassDef {
                name,
                bases,
                body: body?,
            }),
            span: self.span_from(start),
        })
    }

    // ==================== TARGETS ====================

    fn to_target(&self, expr: Expr) -> Result<Target> {
        let what = match expr.kind {
            ExprKind::Name(name) => return Ok(Target::Name(name)),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                return items
                    .into_iter()
                    .map(|e| self.to_target(e))
                    .collect::<Result<Vec<_>>>()
                    .map(Target::Unpack);
            }
            ExprKind::Attribute { value, attr } => {
                return Ok(Target::Attribute { value: *value, attr });
            }
            ExprKind::Subscript { value, index } => {
                return Ok(Target::Subscript {
                    value: *value,
                    index: *index,
                });
            }
            ExprKind::Slice {
                value,
                lower,
                upper,
            } => {
                return Ok(Target::Slice {
                    value: *value,
                    lower: lower.map(|e| *e),
                    upper: upper.map(|e| *e),
                });
            }
            ExprKind::Int { .. } | ExprKind::Str(_) => "literal",
            ExprKind::Dict(_) => "dictionary display",
            ExprKind::Repr(_) => "backquote",
            ExprKind::Call { .. } => "function call",
            ExprKind::Lambda(_) => "lambda",
            ExprKind::Compare { .. } => "comparison",
            ExprKind::Unary { .. }
            | ExprKind::Binary { .. }
            | ExprKind::And(..)
            | ExprKind::Or(..)
            | ExprKind::Not(_) => "operator",
        };
        Err(SyntaxError::InvalidTarget {
            what: what.to_string(),
            span: expr.span.into(),
            src: self.file.to_named_source(),
        })
    }

    // ==================== EXPRESSIONS ====================

    /// `test (',' test)* [',']`; a comma anywhere makes it a tuple
    fn parse_testlist(&mut self) -> Result<Expr> {
        self.parse_sequence(Self::parse_test)
    }

    /// Like a testlist but with bitwise-or expressions, so a following
    /// `in` is not taken as a comparison
    fn parse_exprlist(&mut self) -> Result<Expr> {
        self.parse_sequence(Self::parse_expr)
    }

    fn parse_sequence(&mut self, item: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        let start = self.span();
        let first = item(self)?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if !self.peek().starts_expr() {
                break;
            }
            items.push(item(self)?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), self.span_from(start)))
    }

    fn parse_test(&mut self) -> Result<Expr> {
        self.nested(|p| {
            if p.at(TokenKind::Lambda) {
                p.parse_lambda()
            } else {
                p.parse_or()
            }
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr> {
        let start = self.span();
        self.expect(TokenKind::Lambda)?;
        let params = self.parse_params(TokenKind::Colon)?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_test()?;
        let span = self.span_from(start);
        let def = FunctionDef {
            name: "<lambda>".to_string(),
            params,
            body: vec![Stmt {
                span: body.span,
                kind: StmtKind::Return(Some(body)),
            }],
            span,
        };
        Ok(Expr::new(ExprKind::Lambda(Rc::new(def)), span))
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let start = self.span();
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::new(
                ExprKind::Or(Box::new(left), Box::new(right)),
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let start = self.span();
        let mut left = self.parse_not()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_not()?;
            left = Expr::new(
                ExprKind::And(Box::new(left), Box::new(right)),
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        let start = self.span();
        if self.eat(TokenKind::Not) {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::new(
                ExprKind::Not(Box::new(operand)),
                self.span_from(start),
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let start = self.span();
        let first = self.parse_expr()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            let right = self.parse_expr()?;
            rest.push((op, right));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                first: Box::new(first),
                rest,
            },
            self.span_from(start),
        ))
    }

    /// Consume a comparison operator if one is next
    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek() {
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Le => CompareOp::Le,
            TokenKind::Ge => CompareOp::Ge,
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::Ne | TokenKind::LtGt => CompareOp::Ne,
            TokenKind::In => CompareOp::In,
            TokenKind::Not if self.peek_n(1) == TokenKind::In => {
                self.advance();
                CompareOp::NotIn
            }
            TokenKind::Is if self.peek_n(1) == TokenKind::Not => {
                self.advance();
                CompareOp::IsNot
            }
            TokenKind::Is => CompareOp::Is,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr> {
        let start = self.span();
        let mut left = self.parse_factor()?;

        while let Some((op, prec)) = self.binary_op_info() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }

        Ok(left)
    }

    /// All of these are left associative
    fn binary_op_info(&self) -> Option<(BinaryOp, u8)> {
        let info = match self.peek() {
            TokenKind::Pipe => (BinaryOp::BitOr, 1),
            TokenKind::Caret => (BinaryOp::BitXor, 2),
            TokenKind::Amp => (BinaryOp::BitAnd, 3),
            TokenKind::Shl => (BinaryOp::Shl, 4),
            TokenKind::Shr => (BinaryOp::Shr, 4),
            TokenKind::Plus => (BinaryOp::Add, 5),
            TokenKind::Minus => (BinaryOp::Sub, 5),
            TokenKind::Star => (BinaryOp::Mul, 6),
            TokenKind::Slash => (BinaryOp::Div, 6),
            TokenKind::Percent => (BinaryOp::Mod, 6),
            _ => return None,
        };
        Some(info)
    }

    /// Unary `+`, `-`, `~`
    ///
    /// A minus directly in front of an integer literal is folded into the
    /// literal, so `-2147483648` is the most negative small integer rather
    /// than the negation of a long.
    fn parse_factor(&mut self) -> Result<Expr> {
        let start = self.span();
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.nested(Self::parse_factor)?;
        let span = self.span_from(start);

        if op == UnaryOp::Neg {
            if let ExprKind::Int { value, long } = &operand.kind {
                return Ok(Expr::new(
                    ExprKind::Int {
                        value: -value,
                        long: *long,
                    },
                    span,
                ));
            }
        }
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `primary ['**' factor]`, right associative through `parse_factor`
    fn parse_power(&mut self) -> Result<Expr> {
        let start = self.span();
        let base = self.parse_primary()?;
        if !self.eat(TokenKind::StarStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_factor)?;
        Ok(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            },
            self.span_from(start),
        ))
    }

    /// Atom followed by calls, subscripts, slices and attribute references
    fn parse_primary(&mut self) -> Result<Expr> {
        let start = self.span();
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.parse_subscript(expr, start)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_ident()?;
                    expr = Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        },
                        self.span_from(start),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        let mut seen_keyword = false;
        while !self.at(TokenKind::RParen) {
            if self.at(TokenKind::Ident) && self.peek_n(1) == TokenKind::Eq {
                let name = self.advance().text;
                self.advance();
                args.push(Arg::Keyword(name, self.parse_test()?));
                seen_keyword = true;
            } else if seen_keyword {
                return Err(self.unexpected("keyword argument"));
            } else {
                args.push(Arg::Positional(self.parse_test()?));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    /// After `[`: an index, a tuple index, or a `lower:upper` slice
    fn parse_subscript(&mut self, value: Expr, start: Span) -> Result<Expr> {
        let lower = if self.at(TokenKind::Colon) {
            None
        } else {
            let index = self.parse_testlist()?;
            if !self.at(TokenKind::Colon) {
                self.expect(TokenKind::RBracket)?;
                return Ok(Expr::new(
                    ExprKind::Subscript {
                        value: Box::new(value),
                        index: Box::new(index),
                    },
                    self.span_from(start),
                ));
            }
            Some(Box::new(index))
        };
        self.expect(TokenKind::Colon)?;
        let upper = if self.at(TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Slice {
                value: Box::new(value),
                lower,
                upper,
            },
            self.span_from(start),
        ))
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let start = self.span();
        let kind = match self.peek() {
            TokenKind::Ident => ExprKind::Name(self.advance().text),
            TokenKind::IntLit | TokenKind::HexLit => {
                let tok = self.advance();
                self.int_literal(&tok)?
            }
            TokenKind::StringLit | TokenKind::TripleStringLit => {
                let mut value = String::new();
                while self.at_any(&[TokenKind::StringLit, TokenKind::TripleStringLit]) {
                    value.push_str(&lexer::unquote(&self.advance().text));
                }
                ExprKind::Str(value)
            }
            TokenKind::LParen => {
                self.advance();
                if self.eat(TokenKind::RParen) {
                    ExprKind::Tuple(Vec::new())
                } else {
                    // Parentheses only group; `(x)` is `x`
                    let inner = self.parse_testlist()?;
                    self.expect(TokenKind::RParen)?;
                    return Ok(inner);
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    items.push(self.parse_test()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket)?;
                ExprKind::List(items)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                while !self.at(TokenKind::RBrace) {
                    let key = self.parse_test()?;
                    self.expect(TokenKind::Colon)?;
                    let value = self.parse_test()?;
                    entries.push((key, value));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace)?;
                ExprKind::Dict(entries)
            }
            TokenKind::Backtick => {
                self.advance();
                let inner = self.parse_testlist()?;
                self.expect(TokenKind::Backtick)?;
                ExprKind::Repr(Box::new(inner))
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Decimal, octal (leading `0`) or hex literal with optional `L`
    fn int_literal(&self, tok: &Token) -> Result<ExprKind> {
        let text = tok.text.as_str();
        let (digits, long) = match text.strip_suffix(['l', 'L']) {
            Some(digits) => (digits, true),
            None => (text, false),
        };
        let (digits, radix) = if let Some(hex) = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            (hex, 16)
        } else if digits.len() > 1 && digits.starts_with('0') {
            (&digits[1..], 8)
        } else {
            (digits, 10)
        };

        match BigInt::parse_bytes(digits.as_bytes(), radix) {
            Some(value) => Ok(ExprKind::Int { value, long }),
            None => Err(SyntaxError::InvalidLiteral {
                text: text.to_string(),
                reason: format!("invalid digit for base {}", radix),
                span: tok.span.into(),
                src: self.file.to_named_source(),
            }),
        }
    }
}
