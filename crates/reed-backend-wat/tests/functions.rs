use reed_backend_wat::WatCodegen;
use reed_codegen::CodeGenerator;
use reed_frontend::parse_and_annotate;

fn emit(src: &str) -> String {
    let program = parse_and_annotate(src).expect("frontend ok");
    WatCodegen::new("main").generate(&program).expect("codegen ok")
}

#[test]
fn minimal_module_matches_exactly() {
    let out = emit("let main = fn () int { }");
    assert_eq!(
        out,
        "(module (func $main (result i32) (return)) (export \"main\" (func $main)))"
    );
}

#[test]
fn void_result_is_omitted() {
    let out = emit("let main = fn () void { }");
    assert!(out.contains("(func $main (return))"));
    assert!(!out.contains("result"));
}

#[test]
fn parameters_and_result_carry_wasm_types() {
    let out = emit("let mix = fn (a int, b float) float { } let main = fn () void { }");
    assert!(out.contains("(func $mix (param $a i32) (param $b f64) (result f64)"));
}

#[test]
fn call_emits_arguments_left_to_right_then_call() {
    let out =
        emit("let add = fn (a int, b int) int { a + b } let main = fn () int { add(1, 2) }");
    assert!(out.contains("(i32.const 1) (i32.const 2) (call $add)"));
}

#[test]
fn expression_bodied_function() {
    let out = emit("let id = fn (x int) int x let main = fn () int { id(7) }");
    assert!(out.contains("(func $id (param $x i32) (result i32) (get_local $x) (return))"));
    assert!(out.contains("(i32.const 7) (call $id)"));
}

#[test]
fn body_ends_with_an_unconditional_return() {
    let out = emit("let main = fn () int { 1 + 2 }");
    assert!(out.contains("(i32.add) (return)"));
}

#[test]
fn unknown_export_name_is_an_error() {
    let program = parse_and_annotate("let a = 1").expect("frontend ok");
    let err = WatCodegen::new("main").generate(&program).expect_err("must fail");
    assert!(format!("{err}").contains("export 'main'"));
}
