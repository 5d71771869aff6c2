use std::io::BufWriter;

use jack::{
    compile::{Engine, IoSink},
    compile_str, compile_to,
};

#[test]
fn test_compile_main() {
    let vm = compile_str(include_str!("main.jack")).unwrap();
    assert_eq!(vm, include_str!("main.vm"));
}

#[test]
fn test_compile_point() {
    let vm = compile_str(include_str!("point.jack")).unwrap();
    assert_eq!(vm, include_str!("point.vm"));
}

#[test]
fn test_compile_control_flow() {
    let vm = compile_str(include_str!("control.jack")).unwrap();
    assert_eq!(vm, include_str!("control.vm"));
}

#[test]
fn test_keyword_constants() {
    let source = "
class K {
    function void f() {
        var boolean b;
        var K k;
        let b = true;
        let b = false;
        let k = null;
        return;
    }

    method K me() {
        return this;
    }
}";

    let expected = "\
function K.f 2
push constant 0
not
pop local 0
push constant 0
pop local 0
push constant 0
pop local 1
push constant 0
return
function K.me 0
push argument 0
pop pointer 0
push pointer 0
return
";
    assert_eq!(compile_str(source).unwrap(), expected);
}

#[test]
fn test_string_constant() {
    let source = r#"class S { function void f() { do Output.printString("Hi!"); return; } }"#;

    let expected = "\
function S.f 0
push constant 3
call String.new 1
push constant 72
call String.appendChar 2
push constant 105
call String.appendChar 2
push constant 33
call String.appendChar 2
call Output.printString 1
pop temp 0
push constant 0
return
";
    assert_eq!(compile_str(source).unwrap(), expected);
}

#[test]
fn test_unqualified_call_targets_this() {
    let source = "
class G {
    method void draw() {
        do erase();
        return;
    }

    method void erase() {
        return;
    }
}";

    let expected = "\
function G.draw 0
push argument 0
pop pointer 0
push pointer 0
call G.erase 1
pop temp 0
push constant 0
return
function G.erase 0
push argument 0
pop pointer 0
push constant 0
return
";
    assert_eq!(compile_str(source).unwrap(), expected);
}

#[test]
fn test_method_arguments_start_after_receiver() {
    let source = "class M { method int add(int a, int b) { return a + b; } }";

    let vm = compile_str(source).unwrap();
    assert!(vm.contains("push argument 1\npush argument 2\nadd\nreturn\n"));
}

#[test]
fn test_method_call_on_variable_uses_declared_type() {
    let source = "
class Game {
    field Ball ball;

    method void step(int dx) {
        do ball.move(dx, 0);
        return;
    }
}";

    let vm = compile_str(source).unwrap();
    assert!(vm.contains(
        "push this 0\npush argument 1\npush constant 0\ncall Ball.move 3\npop temp 0\n"
    ));
}

#[test]
fn test_operators_left_to_right() {
    // No precedence: (1 + 2) * 3
    let source = "class Op { function int f() { return 1 + 2 * 3; } }";

    let expected = "\
function Op.f 0
push constant 1
push constant 2
add
push constant 3
call Math.multiply 2
return
";
    assert_eq!(compile_str(source).unwrap(), expected);
}

#[test]
fn test_all_binary_operators() {
    let source = "class Op { function int f(int a) { return a - a / a & a | a < a > a = ~a; } }";

    let vm = compile_str(source).unwrap();
    let ops = vm
        .lines()
        .filter(|line| !line.starts_with("push") && !line.starts_with("function"))
        .collect::<Vec<_>>();
    assert_eq!(
        ops,
        vec!["sub", "call Math.divide 2", "and", "or", "lt", "gt", "not", "eq", "return"]
    );
}

#[test]
fn test_label_counters_per_subroutine() {
    let source = "
class L {
    function void a() {
        if (true) { }
        while (false) { }
        if (false) { }
        while (true) { }
        return;
    }

    function void b() {
        if (true) { }
        return;
    }
}";

    let vm = compile_str(source).unwrap();
    let labels = vm
        .lines()
        .filter(|line| line.starts_with("label"))
        .collect::<Vec<_>>();

    assert_eq!(
        labels,
        vec![
            "label ELSE_1",
            "label ENDIF_1",
            "label WHILE_1",
            "label ENDWHILE_1",
            "label ELSE_2",
            "label ENDIF_2",
            "label WHILE_2",
            "label ENDWHILE_2",
            // Numbering starts over in the next subroutine.
            "label ELSE_1",
            "label ENDIF_1",
        ]
    );
}

#[test]
fn test_nested_array_assignment() {
    let source = "
class A {
    function void copy(Array dst, Array src) {
        let dst[0] = src[1];
        return;
    }
}";

    let expected = "\
function A.copy 0
push argument 0
push constant 0
add
push argument 1
push constant 1
add
pop pointer 1
push that 0
pop temp 0
pop pointer 1
push temp 0
pop that 0
push constant 0
return
";
    assert_eq!(compile_str(source).unwrap(), expected);
}

#[test]
fn test_parameter_shadows_field() {
    let source = "
class S {
    field int x;

    method int f(int x) {
        return x;
    }

    method int g() {
        return x;
    }
}";

    let vm = compile_str(source).unwrap();
    let returned = vm
        .lines()
        .zip(vm.lines().skip(1))
        .filter(|(_, next)| *next == "return")
        .map(|(line, _)| line)
        .collect::<Vec<_>>();
    assert_eq!(returned, vec!["push argument 1", "push this 0"]);
}

#[test]
fn test_engine_symbols_keep_class_scope() {
    let source = "class C { field int a, b; static C instance; function void f(int p) { return; } }";

    let mut vm = String::new();
    let mut engine = Engine::new(source, &mut vm);
    engine.compile_class().unwrap();

    assert_eq!(engine.class_name(), "C");
    let symbols = engine.symbols();
    assert_eq!(symbols.index_of("b"), Some(1));
    assert_eq!(symbols.index_of("instance"), Some(0));
    assert_eq!(symbols.index_of("p"), Some(0));
}

#[test]
fn test_compile_to_keeps_partial_output() {
    let source = "
class P {
    function void ok() {
        return;
    }

    function void broken() {
        return missing;
    }
}";

    let mut vm = String::new();
    assert!(compile_to(source, &mut vm).is_err());
    assert!(vm.starts_with("function P.ok 0\npush constant 0\nreturn\nfunction P.broken 0\n"));
}

#[test]
fn test_compile_to_flushes_buffered_writer_on_error() {
    let source = "
class P {
    function void ok() {
        return;
    }

    function void bad() {
        return missing;
    }
}";

    let mut sink = IoSink::new(BufWriter::new(Vec::<u8>::new()));
    assert!(compile_to(source, &mut sink).is_err());

    // Nothing may be left sitting in the buffer.
    let writer = sink.into_inner();
    assert!(writer.buffer().is_empty());
    assert_eq!(
        writer.get_ref().as_slice(),
        b"function P.ok 0\npush constant 0\nreturn\nfunction P.bad 0\n"
    );
}
