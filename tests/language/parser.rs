//! Integration tests for grouping and statement assembly
//!
//! Source text through `code_to_ast`, checked at the statement level.

use nml_language::{
    AssignOp, Node, Ref, Statement, Target, code_to_ast, compile_expr, find_ins, parse_line,
    parse_statement,
};

fn word(w: &str) -> Node {
    Node::Word(w.to_string())
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn verb_statement_splits_objects() {
    let ast = code_to_ast("put the red apple on top of the table").unwrap();
    let Statement::Call(call) = &ast[0] else {
        panic!("expected a call, got {ast:?}");
    };
    assert_eq!(call.verb, "put");
    assert_eq!(
        call.direct_obj,
        Some(vec![word("the"), word("red"), word("apple")])
    );
    assert_eq!(call.preposition.as_deref(), Some("on top of"));
    assert_eq!(call.indirect_obj, Some(vec![word("the"), word("table")]));
    assert_eq!(call.params.len(), 8);
    assert_eq!(call.direct_range(), Some(0..3));
    assert_eq!(call.indirect_range(), Some(6..8));
}

#[test]
fn verb_statement_with_expression_objects() {
    let ast = code_to_ast("give $amount + 1 to ##Bob").unwrap();
    let Statement::Call(call) = &ast[0] else {
        panic!("expected a call");
    };
    assert_eq!(
        call.direct_obj,
        Some(vec![Node::Var(Ref::new("amount")), word("+"), Node::Number(1.0)])
    );
    assert_eq!(call.indirect_obj, Some(vec![Node::Alias("Bob".into())]));
}

#[test]
fn every_assignment_operator() {
    let ast = code_to_ast("$a = 1\n$a += 1\n$a -= 1\n$a *= 2\n$a /= 2").unwrap();
    let ops: Vec<AssignOp> = ast
        .iter()
        .map(|s| match s {
            Statement::Assign { op, .. } => *op,
            other => panic!("expected an assignment, got {other:?}"),
        })
        .collect();
    assert_eq!(
        ops,
        vec![
            AssignOp::Set,
            AssignOp::Add,
            AssignOp::Sub,
            AssignOp::Mul,
            AssignOp::Div
        ]
    );
}

#[test]
fn assignment_from_inline_call() {
    let stmt = parse_statement(parse_line("%best = max(%a %b)").unwrap(), 1).unwrap();
    let Statement::Assign { dst, src, .. } = stmt else {
        panic!("expected an assignment");
    };
    assert_eq!(dst, Target::Prop(Ref::new("best")));
    let Node::Call(call) = &src[0] else {
        panic!("expected a call, got {src:?}");
    };
    assert_eq!(call.verb, "max");
    assert_eq!(call.params.len(), 2);
}

// =============================================================================
// Blocks
// =============================================================================

#[test]
fn deep_nesting_and_paths() {
    let src = "\
; greet everyone twice
$n = 0
while $n < 2
  if %awake
    if $n == 0
      say good morning
    end
    say hello
  end
  $n += 1
end";
    let ast = code_to_ast(src).unwrap();
    assert_eq!(ast.len(), 2);
    assert_eq!(find_ins(&[1, 0, 0, 0], &ast).map(Statement::kind), Some("call"));
    assert_eq!(find_ins(&[1, 0, 1], &ast).map(Statement::kind), Some("call"));
    assert_eq!(find_ins(&[1, 1], &ast).map(Statement::kind), Some("assign"));
    assert!(find_ins(&[1, 2], &ast).is_none());
    assert!(find_ins(&[0, 0], &ast).is_none());
}

#[test]
fn keywords_close_in_order() {
    let err = code_to_ast("if 1\nwhile 2\nend").unwrap_err();
    assert_eq!(err.to_string(), "line 3: 1 block(s) are still open.");

    let err = code_to_ast("if 1\nend\nend").unwrap_err();
    assert_eq!(err.to_string(), "line 3: no blocks to end");
}

#[test]
fn errors_point_at_the_bad_line() {
    let err = code_to_ast("$a = 1\n$b = 2\n4 = $a").unwrap_err();
    assert_eq!(err.line, 3);
    assert_eq!(err.message, "type on left of assignment cannot be set");

    let err = code_to_ast("say ok\n$x = [1 2").unwrap_err();
    assert_eq!(err.line, 2);
}

#[test]
fn compile_expr_keeps_operators_flat() {
    let expr = compile_expr("(1 + 2) * $x").unwrap();
    assert_eq!(expr.len(), 3);
    assert!(matches!(expr[0], Node::List(_)));
    assert_eq!(expr[1], word("*"));
}
