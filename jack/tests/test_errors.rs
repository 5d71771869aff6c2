use jack::{
    compile_str,
    error::{JackError, LexErrorKind, SemanticErrorKind},
};

#[test]
fn test_undefined_variable() {
    let source = "class E {\n    function void f() {\n        return y;\n    }\n}";

    match compile_str(source) {
        Err(JackError::Semantic(err)) => {
            assert_eq!(err.kind, SemanticErrorKind::Undefined("y".into()));
            assert_eq!(err.line.number, 3);
            assert_eq!(err.line.text, "        return y;");
        }
        other => panic!("expected semantic error, got {other:?}"),
    }
}

#[test]
fn test_undefined_assignment_target() {
    let source = "class E { function void f() { let x = 1; return; } }";

    assert!(matches!(
        compile_str(source),
        Err(JackError::Semantic(err)) if err.kind == SemanticErrorKind::Undefined("x".into())
    ));
}

#[test]
fn test_class_name_needs_no_declaration() {
    let source = "class E { function void f() { do Foo.bar(); return; } }";

    let vm = compile_str(source).unwrap();
    assert!(vm.contains("call Foo.bar 0\n"));
}

#[test]
fn test_redefinition() {
    let source = "class E {\n    field int x;\n    static boolean x;\n}";

    match compile_str(source) {
        Err(JackError::Semantic(err)) => {
            assert_eq!(err.kind, SemanticErrorKind::Redefined("x".into()));
            assert_eq!(err.line.number, 3);
            assert_eq!(
                err.to_string(),
                "line:3:     static boolean x;\nvariable already defined: x"
            );
        }
        other => panic!("expected semantic error, got {other:?}"),
    }
}

#[test]
fn test_local_redefines_argument() {
    let source = "class E { function void f(int a) { var int a; return; } }";

    assert!(matches!(
        compile_str(source),
        Err(JackError::Semantic(err)) if err.kind == SemanticErrorKind::Redefined("a".into())
    ));
}

#[test]
fn test_syntax_error() {
    let source = "class E {\n    function void f() {\n        var int x;\n        let x 1;\n        return;\n    }\n}";

    match compile_str(source) {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.expected, "symbol '='");
            assert_eq!(err.encountered, "integer constant 1");
            assert_eq!(err.line.number, 4);
            assert_eq!(
                err.to_string(),
                "line:4:         let x 1;\nexpected symbol '=' but encountered integer constant 1"
            );
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_unexpected_end_of_stream() {
    match compile_str("class A {") {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.expected, "symbol '}'");
            assert_eq!(err.encountered, "end-of-stream");
            assert_eq!(err.line.number, 1);
            assert_eq!(err.line.text, "class A {");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_one_class_per_source() {
    match compile_str("class A { } class B { }") {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.expected, "end-of-stream");
            assert_eq!(err.encountered, "keyword 'class'");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_bad_statement_start() {
    let source = "class A { function void f() { x = 1; return; } }";

    match compile_str(source) {
        Err(JackError::Syntax(err)) => {
            assert_eq!(err.expected, "symbol '}'");
            assert_eq!(err.encountered, "identifier 'x'");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_lex_error_surfaces() {
    let source = "class A {\n    function int f() {\n        return 40000;\n    }\n}";

    match compile_str(source) {
        Err(JackError::Lex(err)) => {
            assert_eq!(err.kind, LexErrorKind::IntegerRange("40000".to_owned()));
            assert_eq!(err.line.number, 3);
        }
        other => panic!("expected lexical error, got {other:?}"),
    }
}

#[test]
fn test_source_line() {
    let err = compile_str("class 7 { }").unwrap_err();

    let line = err.source_line().unwrap();
    assert_eq!(line.to_string(), "line:1: class 7 { }");
}

#[test]
fn test_too_many_locals() {
    let names = (0..=u16::MAX)
        .map(|i| format!("v{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let source = format!("class E {{ function void f() {{ var int {names}; return; }} }}");

    match compile_str(&source) {
        Err(JackError::Semantic(err)) => {
            assert_eq!(
                err.kind,
                SemanticErrorKind::TooManyVariables(format!("v{}", u16::MAX).into())
            );
        }
        other => panic!("expected semantic error, got {:?}", other.map(|vm| vm.len())),
    }
}

#[test]
fn test_too_many_call_arguments() {
    let args = vec!["0"; usize::from(u16::MAX) + 1].join(",");
    let source = format!("class E {{ function void f() {{ do Foo.bar({args}); return; }} }}");

    match compile_str(&source) {
        Err(JackError::Semantic(err)) => {
            assert_eq!(err.kind, SemanticErrorKind::TooManyArguments("Foo.bar".into()));
        }
        other => panic!("expected semantic error, got {:?}", other.map(|vm| vm.len())),
    }
}

#[test]
fn test_most_call_arguments() {
    let args = vec!["0"; usize::from(u16::MAX)].join(",");
    let source = format!("class E {{ function void f() {{ do Foo.bar({args}); return; }} }}");

    let vm = compile_str(&source).unwrap();
    assert!(vm.contains(&format!("call Foo.bar {}\n", u16::MAX)));
}
