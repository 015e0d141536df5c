//! Parser tests

use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use serpent::ast::*;
use serpent::diagnostics::SyntaxError;
use serpent::parser::parse_source;

fn parse(source: &str) -> Module {
    match parse_source(source) {
        Ok(module) => module,
        Err(e) => panic!("Parse failed: {}", e),
    }
}

fn parse_err(source: &str) -> SyntaxError {
    match parse_source(source) {
        Ok(module) => panic!("Expected a syntax error, parsed {:?}", module),
        Err(e) => e,
    }
}

/// The single expression statement of `source`
fn expr(source: &str) -> ExprKind {
    let module = parse(source);
    assert_eq!(module.body.len(), 1);
    match &module.body[0].kind {
        StmtKind::Expr(e) => e.kind.clone(),
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

fn int(value: i64) -> ExprKind {
    ExprKind::Int {
        value: BigInt::from(value),
        long: false,
    }
}

// ==================== Statements ====================

#[test]
fn test_parse_empty_module() {
    assert!(parse("").body.is_empty());
    assert!(parse("\n\n# nothing\n").body.is_empty());
}

#[test]
fn test_parse_semicolon_separated() {
    let module = parse("a = 1; b = 2; a");
    assert_eq!(module.body.len(), 3);
    assert!(matches!(module.body[2].kind, StmtKind::Expr(_)));
}

#[test]
fn test_parse_chained_assignment() {
    let module = parse("a = b = 1");
    match &module.body[0].kind {
        StmtKind::Assign { targets, value } => {
            assert_eq!(
                targets,
                &vec![Target::Name("a".into()), Target::Name("b".into())]
            );
            assert_eq!(value.kind, int(1));
        }
        other => panic!("Expected assignment, got {:?}", other),
    }
}

#[test]
fn test_parse_nested_unpack_target() {
    let module = parse("a, (b, c), d = x");
    let StmtKind::Assign { targets, .. } = &module.body[0].kind else {
        panic!("Expected assignment");
    };
    assert_eq!(
        targets[0],
        Target::Unpack(vec![
            Target::Name("a".into()),
            Target::Unpack(vec![Target::Name("b".into()), Target::Name("c".into())]),
            Target::Name("d".into()),
        ])
    );
}

#[test]
fn test_parse_parenthesized_name_is_plain_target() {
    let module = parse("(x) = 1,");
    let StmtKind::Assign { targets, value } = &module.body[0].kind else {
        panic!("Expected assignment");
    };
    assert_eq!(targets[0], Target::Name("x".into()));
    assert!(matches!(value.kind, ExprKind::Tuple(ref items) if items.len() == 1));

    let module = parse("x, = 1,");
    let StmtKind::Assign { targets, .. } = &module.body[0].kind else {
        panic!("Expected assignment");
    };
    assert_eq!(targets[0], Target::Unpack(vec![Target::Name("x".into())]));
}

#[test]
fn test_parse_if_elif_else() {
    let source = "if a: x = 1\nelif b: x = 2\nelif c:\n  x = 3\nelse:\n  x = 4\n";
    let module = parse(source);
    match &module.body[0].kind {
        StmtKind::If { branches, orelse } => {
            assert_eq!(branches.len(), 3);
            assert_eq!(orelse.as_ref().map(Vec::len), Some(1));
        }
        other => panic!("Expected if, got {:?}", other),
    }
}

#[test]
fn test_parse_while_else() {
    let module = parse("while x:\n  x = x - 1\n  break\nelse: pass\n");
    match &module.body[0].kind {
        StmtKind::While { body, orelse, .. } => {
            assert_eq!(body.len(), 2);
            assert!(orelse.is_some());
        }
        other => panic!("Expected while, got {:?}", other),
    }
}

#[test]
fn test_parse_for_with_tuple_target() {
    let module = parse("for a, b in pairs: pass");
    match &module.body[0].kind {
        StmtKind::For { target, iter, .. } => {
            assert_eq!(
                *target,
                Target::Unpack(vec![Target::Name("a".into()), Target::Name("b".into())])
            );
            assert_eq!(iter.kind, ExprKind::Name("pairs".into()));
        }
        other => panic!("Expected for, got {:?}", other),
    }
}

#[test]
fn test_parse_try_except_else_finally() {
    let source = "try: a\nexcept \"NameError\", n: b\nexcept (IndexError, KeyError): c\nexcept: d\nelse: e\nfinally: f\n";
    let module = parse(source);
    let StmtKind::Try(stmt) = &module.body[0].kind else {
        panic!("Expected try");
    };
    assert_eq!(stmt.handlers.len(), 3);
    assert_eq!(stmt.handlers[0].target, Some(Target::Name("n".into())));
    assert!(matches!(stmt.handlers[1].kind, Some(Expr { kind: ExprKind::Tuple(_), .. })));
    assert!(stmt.handlers[2].kind.is_none());
    assert!(stmt.orelse.is_some());
    assert!(stmt.finally.is_some());
}

#[test]
fn test_parse_try_needs_handler_or_finally() {
    let err = parse_err("try: a\nb\n");
    assert!(matches!(err, SyntaxError::UnexpectedToken { .. }), "got {:?}", err);
}

#[test]
fn test_parse_def_parameters() {
    let module = parse("def f(a, b=1, *rest, **kw): return a");
    let StmtKind::Def(def) = &module.body[0].kind else {
        panic!("Expected def");
    };
    assert_eq!(def.name, "f");
    let names: Vec<_> = def.params.positional.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(def.params.positional[0].default.is_none());
    assert!(def.params.positional[1].default.is_some());
    assert_eq!(def.params.rest.as_deref(), Some("rest"));
    assert_eq!(def.params.kwrest.as_deref(), Some("kw"));
}

#[test]
fn test_parse_non_default_after_default() {
    let err = parse_err("def f(a=1, b): pass");
    assert!(matches!(err, SyntaxError::UnexpectedToken { .. }), "got {:?}", err);
}

#[test]
fn test_parse_class_with_bases() {
    let module = parse("class D(B, C):\n  x = 1\n  def m(self): return self.x\n");
    let StmtKind::Class(class) = &module.body[0].kind else {
        panic!("Expected class");
    };
    assert_eq!(class.name, "D");
    assert_eq!(class.bases.len(), 2);
    assert_eq!(class.body.len(), 2);
}

#[test]
fn test_parse_imports() {
    let module = parse("import a.b, c\nfrom sys import maxint\nfrom m import *\n");
    assert_eq!(
        module.body[0].kind,
        StmtKind::Import(vec![vec!["a".into(), "b".into()], vec!["c".into()]])
    );
    assert_eq!(
        module.body[1].kind,
        StmtKind::FromImport {
            module: vec!["sys".into()],
            names: ImportNames::Names(vec!["maxint".into()]),
        }
    );
    assert!(matches!(
        module.body[2].kind,
        StmtKind::FromImport { names: ImportNames::All, .. }
    ));
}

#[test]
fn test_parse_print_trailing_comma() {
    let module = parse("print 1, 2,\nprint\n");
    assert!(matches!(
        &module.body[0].kind,
        StmtKind::Print { values, trailing_comma: true } if values.len() == 2
    ));
    assert!(matches!(
        &module.body[1].kind,
        StmtKind::Print { values, trailing_comma: false } if values.is_empty()
    ));
}

#[test]
fn test_parse_del_multiple_targets() {
    let module = parse("del a, b[0], c[1:]");
    let StmtKind::Del(targets) = &module.body[0].kind else {
        panic!("Expected del");
    };
    assert_eq!(targets.len(), 3);
    assert!(matches!(targets[1], Target::Subscript { .. }));
    assert!(matches!(targets[2], Target::Slice { upper: None, .. }));
}

// ==================== Context Errors ====================

#[test]
fn test_parse_break_outside_loop() {
    let err = parse_err("break");
    assert!(matches!(err, SyntaxError::OutsideContext { .. }), "got {:?}", err);
    assert_eq!(err.to_string(), "'break' outside loop");
}

#[test]
fn test_parse_continue_in_def_inside_loop() {
    let err = parse_err("while 1:\n  def f(): continue\n");
    assert!(matches!(err, SyntaxError::OutsideContext { .. }), "got {:?}", err);
}

#[test]
fn test_parse_return_outside_function() {
    let err = parse_err("return 1");
    assert_eq!(err.to_string(), "'return' outside function");
}

#[test]
fn test_parse_invalid_targets() {
    assert_eq!(parse_err("1 = x").to_string(), "can't assign to literal");
    assert_eq!(parse_err("f() = x").to_string(), "can't assign to function call");
    assert_eq!(parse_err("a + b = x").to_string(), "can't assign to operator");
}

#[test]
fn test_parse_bare_raise_is_error() {
    assert!(parse_source("raise").is_err());
}

// ==================== Expressions ====================

#[test]
fn test_parse_precedence() {
    // 1 + (2 * 3)
    let ExprKind::Binary { op, right, .. } = expr("1 + 2 * 3") else {
        panic!("Expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_parse_power_is_right_associative() {
    let ExprKind::Binary { op, right, .. } = expr("2 ** 3 ** 2") else {
        panic!("Expected binary");
    };
    assert_eq!(op, BinaryOp::Pow);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Pow, .. }));
}

#[test]
fn test_parse_bitwise_below_arithmetic() {
    let ExprKind::Binary { op, .. } = expr("1 | 2 + 3 & 4") else {
        panic!("Expected binary");
    };
    assert_eq!(op, BinaryOp::BitOr);
}

#[test]
fn test_parse_chained_comparison() {
    let ExprKind::Compare { rest, .. } = expr("a < b <= c not in d is not e <> f") else {
        panic!("Expected comparison");
    };
    let ops: Vec<_> = rest.iter().map(|(op, _)| *op).collect();
    assert_eq!(
        ops,
        vec![
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::NotIn,
            CompareOp::IsNot,
            CompareOp::Ne
        ]
    );
}

#[test]
fn test_parse_not_binds_looser_than_comparison() {
    assert!(matches!(expr("not 1 == 2"), ExprKind::Not(_)));
}

#[test]
fn test_parse_and_or() {
    let ExprKind::Or(left, _) = expr("a and b or c") else {
        panic!("Expected or");
    };
    assert!(matches!(left.kind, ExprKind::And(..)));
}

#[test]
fn test_parse_negative_literal_folded() {
    assert_eq!(expr("-2147483648"), int(-2147483648));
    assert_eq!(expr("--1"), int(1));
    assert!(matches!(expr("-x"), ExprKind::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn test_parse_integer_radix_and_suffix() {
    assert_eq!(expr("011"), int(9));
    assert_eq!(expr("0xAB"), int(171));
    assert_eq!(
        expr("12L"),
        ExprKind::Int {
            value: BigInt::from(12),
            long: true
        }
    );
}

#[test]
fn test_parse_invalid_octal_digit() {
    let err = parse_err("09");
    assert!(matches!(err, SyntaxError::InvalidLiteral { .. }), "got {:?}", err);
}

#[test]
fn test_parse_adjacent_strings_concatenate() {
    assert_eq!(expr("'a' \"b\" '''c'''"), ExprKind::Str("abc".into()));
}

#[test]
fn test_parse_displays() {
    assert_eq!(expr("()"), ExprKind::Tuple(vec![]));
    assert!(matches!(expr("(1,)"), ExprKind::Tuple(ref items) if items.len() == 1));
    assert_eq!(expr("(1)"), int(1));
    assert!(matches!(expr("[1, 2,]"), ExprKind::List(ref items) if items.len() == 2));
    assert!(matches!(expr("{1: 2, 3: 4}"), ExprKind::Dict(ref entries) if entries.len() == 2));
    assert!(matches!(expr("`1, 2`"), ExprKind::Repr(_)));
}

#[test]
fn test_parse_subscript_and_slices() {
    assert!(matches!(expr("a[1]"), ExprKind::Subscript { .. }));
    assert!(matches!(
        expr("a[1, 2]"),
        ExprKind::Subscript { ref index, .. } if matches!(index.kind, ExprKind::Tuple(_))
    ));
    assert!(matches!(
        expr("a[:]"),
        ExprKind::Slice { lower: None, upper: None, .. }
    ));
    assert!(matches!(
        expr("a[1:]"),
        ExprKind::Slice { lower: Some(_), upper: None, .. }
    ));
    assert!(matches!(
        expr("a[:-1]"),
        ExprKind::Slice { lower: None, upper: Some(_), .. }
    ));
}

#[test]
fn test_parse_call_arguments() {
    let ExprKind::Call { args, .. } = expr("f(1, b=2)") else {
        panic!("Expected call");
    };
    assert!(matches!(args[0], Arg::Positional(_)));
    assert!(matches!(args[1], Arg::Keyword(ref name, _) if name == "b"));
}

#[test]
fn test_parse_positional_after_keyword() {
    assert!(parse_source("f(a=1, 2)").is_err());
}

#[test]
fn test_parse_lambda() {
    let ExprKind::Lambda(def) = expr("lambda x, y=2: x + y") else {
        panic!("Expected lambda");
    };
    assert_eq!(def.name, "<lambda>");
    assert_eq!(def.params.positional.len(), 2);
    assert!(matches!(def.body[0].kind, StmtKind::Return(Some(_))));
}

#[test]
fn test_parse_attribute_chain() {
    let ExprKind::Attribute { value, attr } = expr("a.b.c") else {
        panic!("Expected attribute");
    };
    assert_eq!(attr, "c");
    assert!(matches!(value.kind, ExprKind::Attribute { .. }));
}

// ==================== Nesting ====================

#[test]
fn test_parse_deep_parentheses() {
    let depth = 200;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(expr(&source), int(1));
}

#[test]
fn test_parse_nesting_limit() {
    let depth = serpent::parser::MAX_NESTING + 100;
    let source = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
    let err = parse_err(&source);
    assert!(
        matches!(err, SyntaxError::TooDeeplyNested { limit, .. } if limit == serpent::parser::MAX_NESTING),
        "got {:?}",
        err
    );

    let err = parse_err(&format!("{}1\n", "-".repeat(depth)));
    assert!(matches!(err, SyntaxError::TooDeeplyNested { .. }), "got {:?}", err);
}

#[test]
fn test_parse_keyword_in_expression_position() {
    let err = parse_err("x = class\n");
    let SyntaxError::UnexpectedToken { expected, found, .. } = err else {
        panic!("Expected unexpected token, got {:?}", err);
    };
    assert_eq!(expected, "expression");
    assert_eq!(found, "keyword `class`");
}

// ==================== AST Dump ====================

#[test]
fn test_ast_json_dump() {
    let module = parse("x = 1");
    let json = module.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let stmt = &value["body"][0]["kind"]["Assign"];
    assert_eq!(stmt["targets"][0]["Name"], "x");
    assert!(stmt["value"]["kind"]["Int"].is_object());
}
