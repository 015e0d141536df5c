//! Abstract Syntax Tree
//!
//! This module defines the AST types produced by the parser. Function
//! bodies are reference counted so the interpreter can keep them alive in
//! function values without copying the tree.

use crate::common::Span;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A parsed source unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    /// Render the tree as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// An indented block or the statements of a simple suite
pub type Suite = Vec<Stmt>;

// ==================== STATEMENTS ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Expression statement; its value is the value of the statement
    Expr(Expr),
    /// `t1 = t2 = value`
    Assign { targets: Vec<Target>, value: Expr },
    Print { values: Vec<Expr>, trailing_comma: bool },
    Del(Vec<Target>),
    Pass,
    Break,
    Continue,
    Return(Option<Expr>),
    Raise { kind: Expr, payload: Option<Expr> },
    Global(Vec<String>),
    /// `import a.b, c`; each entry is a dotted path
    Import(Vec<Vec<String>>),
    FromImport { module: Vec<String>, names: ImportNames },
    Assert { test: Expr, message: Option<Expr> },
    If { branches: Vec<(Expr, Suite)>, orelse: Option<Suite> },
    While { test: Expr, body: Suite, orelse: Option<Suite> },
    For { target: Target, iter: Expr, body: Suite, orelse: Option<Suite> },
    Try(TryStmt),
    Def(Rc<FunctionDef>),
    Class(ClassDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportNames {
    /// `from m import *`
    All,
    Names(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryStmt {
    pub body: Suite,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Option<Suite>,
    pub finally: Option<Suite>,
}

/// `except [kind [, target]]: body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub target: Option<Target>,
    pub body: Suite,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Params,
    pub body: Suite,
    pub span: Span,
}

/// Declared parameters of a `def` or `lambda`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub positional: Vec<Param>,
    /// `*rest`
    pub rest: Option<String>,
    /// `**kwrest`
    pub kwrest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Suite,
}

// ==================== TARGETS ====================

/// Left-hand side of an assignment, `del`, `for` or `except ..., target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Name(String),
    Attribute { value: Expr, attr: String },
    Subscript { value: Expr, index: Expr },
    Slice { value: Expr, lower: Option<Expr>, upper: Option<Expr> },
    /// Destructuring into a tuple or list of targets
    Unpack(Vec<Target>),
}

// ==================== EXPRESSIONS ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal; `long` records an explicit `L` suffix
    Int { value: BigInt, long: bool },
    Str(String),
    Name(String),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// Backquote conversion to the printed form
    Repr(Box<Expr>),
    Attribute { value: Box<Expr>, attr: String },
    Subscript { value: Box<Expr>, index: Box<Expr> },
    Slice {
        value: Box<Expr>,
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
    },
    Call { func: Box<Expr>, args: Vec<Arg> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    /// `first op1 e1 op2 e2 ...`, evaluated pairwise with short circuit
    Compare { first: Box<Expr>, rest: Vec<(CompareOp, Expr)> },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Lambda(Rc<FunctionDef>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    In,
    NotIn,
    Is,
    IsNot,
}
