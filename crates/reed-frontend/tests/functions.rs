use reed_frontend::ast::{BlockItem, Expr, ExprKind, FnBody, Type};
use reed_frontend::parse_source;

fn init_expr(src: &str) -> Expr {
    let program = parse_source(src).expect("parse ok");
    program.decls.into_iter().next().expect("one decl").expr
}

#[test]
fn fn_literal_with_params_and_block_body() {
    let e = init_expr("let add = fn (a int, b int) int { a + b }");
    let ExprKind::Func { params, ret, body } = e.kind else {
        panic!("expected function literal");
    };
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].name, "a");
    assert_eq!(params[0].ty, Type::Int);
    assert_eq!(params[1].name, "b");
    assert_eq!(ret, Type::Int);
    let FnBody::Block(block) = body else { panic!("expected block body") };
    assert_eq!(block.bodies.len(), 1);
    assert!(!block.return_void);
}

#[test]
fn fn_literal_with_expression_body() {
    let e = init_expr("let id = fn (x int) int x");
    let ExprKind::Func { body, .. } = e.kind else { panic!("expected function literal") };
    let FnBody::Expr(inner) = body else { panic!("expected expression body") };
    assert!(matches!(inner.kind, ExprKind::Ident(_)));
}

#[test]
fn zero_parameter_function() {
    let e = init_expr("let f = fn () void { }");
    let ExprKind::Func { params, ret, body } = e.kind else {
        panic!("expected function literal");
    };
    assert!(params.is_empty());
    assert_eq!(ret, Type::Void);
    let FnBody::Block(block) = body else { panic!("expected block body") };
    assert!(block.bodies.is_empty());
    assert!(block.return_void);
}

#[test]
fn call_applies_a_tuple_of_arguments() {
    let e = init_expr("let r = f(1, 2)");
    let ExprKind::Call { func, args } = e.kind else { panic!("expected call") };
    assert!(matches!(func.kind, ExprKind::Ident(ref n) if n == "f"));
    let ExprKind::Tuple(items) = args.kind else { panic!("expected tuple args") };
    assert_eq!(items.len(), 2);
}

#[test]
fn calls_chain_left_to_right() {
    let e = init_expr("let r = f(1)(2)");
    let ExprKind::Call { func, .. } = e.kind else { panic!("expected outer call") };
    assert!(matches!(func.kind, ExprKind::Call { .. }));
}

#[test]
fn nested_function_body_declarations() {
    let e = init_expr("let f = fn () int { let a = 1 a }");
    let ExprKind::Func { body: FnBody::Block(block), .. } = e.kind else {
        panic!("expected block-bodied function");
    };
    assert!(matches!(block.bodies[0], BlockItem::Decl(_)));
    assert!(matches!(block.bodies[1], BlockItem::Expr(_)));
    assert!(!block.return_void);
}

#[test]
fn block_ending_in_declaration_returns_void() {
    let e = init_expr("let f = fn () void { let a = 1 }");
    let ExprKind::Func { body: FnBody::Block(block), .. } = e.kind else {
        panic!("expected block-bodied function");
    };
    assert_eq!(block.bodies.len(), 1);
    assert!(block.return_void);
}
