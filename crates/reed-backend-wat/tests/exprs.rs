use reed_backend_wat::WatCodegen;
use reed_codegen::CodeGenerator;
use reed_frontend::parse_and_annotate;

fn emit(src: &str) -> String {
    let program = parse_and_annotate(src).expect("frontend ok");
    WatCodegen::new("main").generate(&program).expect("codegen ok")
}

#[test]
fn unary_minus_on_ints_subtracts_from_zero() {
    let out = emit("let main = fn () int { -5 }");
    assert!(out.contains("(i32.const 0) (i32.const 5) (i32.sub)"));
}

#[test]
fn unary_minus_on_floats_negates() {
    let out = emit("let main = fn () float { -2.5 }");
    assert!(out.contains("(f64.const 2.5) (f64.neg)"));
}

#[test]
fn unary_plus_is_transparent() {
    let out = emit("let main = fn () int { +5 }");
    assert!(out.contains("(i32.const 5) (return)"));
}

#[test]
fn not_lowers_to_eqz() {
    let out = emit("let main = fn () boolean { !true }");
    assert!(out.contains("(i32.const 1) (i32.eqz)"));
}

#[test]
fn float_arithmetic_uses_f64_instructions() {
    let out = emit("let main = fn () float { 1.5 + 2.0 * 3.0 }");
    assert!(out.contains("(f64.const 1.5)"));
    assert!(out.contains("(f64.mul)"));
    assert!(out.contains("(f64.add)"));
}

#[test]
fn division_and_remainder_are_signed() {
    let out = emit("let main = fn () int { 7 / 2 % 3 }");
    assert!(out.contains("(i32.const 7) (i32.const 2) (i32.div_s) (i32.const 3) (i32.rem_s)"));
}

#[test]
fn comparisons_and_logic_lower_to_i32() {
    let out = emit("let main = fn () boolean { 1 < 2 && 3 >= 4 }");
    assert!(out.contains("(i32.lt_s)"));
    assert!(out.contains("(i32.ge_s)"));
    assert!(out.contains("(i32.and)"));
}

#[test]
fn float_comparisons_use_f64_instructions() {
    let out = emit("let main = fn () boolean { 1.5 < 2.5 }");
    assert!(out.contains("(f64.const 1.5) (f64.const 2.5) (f64.lt)"));
}

#[test]
fn bitwise_operators() {
    let out = emit("let main = fn () int { 1 | 2 ^ 3 & 4 }");
    assert!(out.contains("(i32.or)"));
    assert!(out.contains("(i32.xor)"));
    assert!(out.contains("(i32.and)"));
}

#[test]
fn char_literals_lower_to_code_points() {
    let out = emit("let main = fn () char { 'A' }");
    assert!(out.contains("(i32.const 65) (return)"));
}

#[test]
fn non_identifier_callee_is_dropped() {
    let out = emit("let f = fn () int 1 let main = fn () void { (f)(1) }");
    assert!(!out.contains("(call"));
}

#[test]
fn string_literal_values_emit_nothing() {
    let out = emit(r#"let main = fn () void { "side effect free" }"#);
    assert!(out.contains("(func $main (return))"));
}
