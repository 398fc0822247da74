use reed_backend_wat::WatCodegen;
use reed_codegen::CodeGenerator;
use reed_frontend::parse_and_annotate;

fn emit(src: &str) -> String {
    let program = parse_and_annotate(src).expect("frontend ok");
    WatCodegen::new("main").generate(&program).expect("codegen ok")
}

#[test]
fn function_rebinding_emits_no_copy() {
    let out = emit("let f = fn () int 1 let g = f let main = fn () int { g() }");
    assert!(!out.contains("$g"));
    assert!(out.contains("(call $f)"));
}

#[test]
fn export_resolves_through_an_alias() {
    let out = emit("let f = fn () void { } let main = f");
    assert!(out.contains("(export \"main\" (func $f))"));
}

#[test]
fn non_function_rebinding_stays_a_global() {
    let out = emit("let a = 1 let b = a let main = fn () void { }");
    assert!(out.contains("(global $b (mut i32) (i32.const 0))"));
    assert!(out.contains("(get_global $a) (set_global $b)"));
}

#[test]
fn block_level_alias_resolves_inside_the_function() {
    let out = emit("let f = fn () int 1 let main = fn () int { let g = f g() }");
    assert!(!out.contains("(local $g"));
    assert!(out.contains("(call $f)"));
}
