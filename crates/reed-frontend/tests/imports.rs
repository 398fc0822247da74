use reed_frontend::parse_source;

#[test]
fn import_elements_with_and_without_alias() {
    let src = r#"import "math" (sin, cos as cosine) let main = fn () void { }"#;
    let program = parse_source(src).expect("parse ok");
    assert_eq!(program.imports.len(), 1);
    let imp = &program.imports[0];
    assert_eq!(imp.path, "math");
    assert_eq!(imp.elems.len(), 2);
    assert_eq!(imp.elems[0].name, "sin");
    assert_eq!(imp.elems[0].alias, None);
    assert_eq!(imp.elems[1].name, "cos");
    assert_eq!(imp.elems[1].alias.as_deref(), Some("cosine"));
}

#[test]
fn multiple_imports_precede_declarations() {
    let src = r#"
        import "a" (x)
        import "b" (y, z)
        let main = fn () void { }
    "#;
    let program = parse_source(src).expect("parse ok");
    assert_eq!(program.imports.len(), 2);
    assert_eq!(program.decls.len(), 1);
}

#[test]
fn import_after_declaration_is_rejected() {
    let src = r#"let main = fn () void { } import "a" (x)"#;
    assert!(parse_source(src).is_err());
}
