use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use zen_lang::error::RuntimeErrorKind;
use zen_lang::runtime::ScopeError;
use zen_lang::{parse_source, Interpreter, SourceCode, Value, ZenError};

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

/// Parse and run `source`, failing the test on syntax errors
fn interpret(source: &str) -> (Interpreter, Captured, Result<(), ZenError>) {
    let program = match parse_source(&SourceCode::inline(source)) {
        Ok(program) => program,
        Err(e) => panic!("unexpected syntax error(s) in:\n{}\n{}", source, e),
    };
    let output = Captured::default();
    let mut interpreter = Interpreter::new().with_output(Box::new(output.clone()));
    let result = interpreter.execute(&program).map_err(ZenError::from);
    (interpreter, output, result)
}

fn assert_success(source: &str) -> (Interpreter, String) {
    let (interpreter, output, result) = interpret(source);
    if let Err(e) = result {
        panic!("program failed:\n{}\nError: {}", source, e);
    }
    (interpreter, output.text())
}

fn runtime_error(source: &str) -> RuntimeErrorKind {
    match interpret(source).2 {
        Err(ZenError::Runtime(e)) => e.kind,
        Err(e) => panic!("expected a runtime error, got {:?}", e),
        Ok(()) => panic!("expected a runtime error for:\n{}", source),
    }
}

fn assert_value(interpreter: &Interpreter, name: &str, expected: impl Into<Value>) {
    match interpreter.get_value(name) {
        Ok(value) => assert_eq!(value, expected.into(), "variable {}", name),
        Err(e) => panic!("variable {} should be defined: {}", name, e),
    }
}

fn assert_undefined(interpreter: &Interpreter, name: &str) {
    assert!(
        interpreter.get_value(name).is_err(),
        "variable {} should not be defined",
        name
    );
}

#[test]
fn variables_script() {
    let (i, _) = assert_success(include_str!("scripts/variables.zen"));

    assert_value(&i, "x", 42i64);
    assert_value(&i, "y", "hello");
    assert_value(&i, "z", true);
    assert_value(&i, "PI", 3.14159f64);
    assert_value(&i, "MAX_SIZE", 100i64);
    assert_value(&i, "nullableInt", Value::Null);
    assert_value(&i, "initializedNullable", "can be null");
    assert_value(&i, "counter", 2i64);
    assert_value(&i, "global", "modified");
    assert_undefined(&i, "local");
    assert_value(&i, "sum", 15i64);
    assert_value(&i, "product", 50i64);
    assert_value(&i, "comparison", true);
    assert_value(&i, "fullName", "John Doe");
    assert_value(&i, "andResult", false);
    assert_value(&i, "orResult", true);
}

#[test]
fn functions_script() {
    let (i, output) = assert_success(include_str!("scripts/functions.zen"));

    assert_value(&i, "squared", 49i64);
    assert_value(&i, "summed", 5050i64);
    assert_value(&i, "big", "value is big");
    assert_value(&i, "small", "n is small");
    assert_value(&i, "best", "alice");
    assert_value(&i, "bestScore", 90i64);
    assert_value(&i, "evenCount", 5i64);
    assert_eq!(output, "2\n4\n6\n8\n10\n");
}

#[test]
fn precedence() {
    let (i, _) = assert_success("var x = 2 + 3 * 4\nvar y = (2 + 3) * 4\nvar z = -2 * 3");
    assert_value(&i, "x", 14i64);
    assert_value(&i, "y", 20i64);
    assert_value(&i, "z", -6i64);
}

#[test]
fn print_inside_if() {
    let (_, output) = assert_success("if true { print(\"positive\") }");
    assert_eq!(output, "positive\n");
}

#[test]
fn string_plus_number_is_a_type_error() {
    assert!(matches!(
        runtime_error("var x = \"hello\" + 42"),
        RuntimeErrorKind::Type(_)
    ));
}

#[test]
fn constants_cannot_change() {
    assert_eq!(
        runtime_error("const X = 1\nX = 2"),
        RuntimeErrorKind::Scope(ScopeError::ConstantAssignment("X".to_string()))
    );
    assert_eq!(
        runtime_error("const X = 1\nconst X = 2"),
        RuntimeErrorKind::Scope(ScopeError::Redefinition("X".to_string()))
    );
}

#[test]
fn redefinition_in_same_scope() {
    assert_eq!(
        runtime_error("var x = 1\nvar x = 2"),
        RuntimeErrorKind::Scope(ScopeError::Redefinition("x".to_string()))
    );
}

#[test]
fn undefined_container_in_for_in() {
    for source in ["for i, v in items { }", "for item in items { print(item) }"] {
        assert_eq!(
            runtime_error(source),
            RuntimeErrorKind::Scope(ScopeError::Undefined("items".to_string())),
            "{}",
            source
        );
    }
}

#[test]
fn map_access_conditions() {
    let source = r#"
        var m = {"on": true, "off": false, "list": [1, 2]}
        if m{"off"} { print("off") } elif m{"on"} { print("on") }
        var n = 0
        while m{"on"} { n = n + 1 m{"on"} = n < 3 }
        for v in m{"list"} { print(v) }
    "#;
    let (i, output) = assert_success(source);
    assert_eq!(output, "on\n1\n2\n");
    assert_value(&i, "n", 3i64);
}

#[test]
fn shadowing() {
    let source = "
        var x = 1
        var seen = 0
        if true {
            var x = 2
            seen = x
        }
    ";
    let (i, _) = assert_success(source);
    assert_value(&i, "x", 1i64);
    assert_value(&i, "seen", 2i64);
}

#[test]
fn nullable_variables() {
    let (i, _) = assert_success("var a : string?\nvar b : int? = 5\nb = null");
    assert_value(&i, "a", Value::Null);
    assert_value(&i, "b", Value::Null);

    assert_eq!(
        runtime_error("var x : int"),
        RuntimeErrorKind::UninitializedVariable("x".to_string())
    );
    assert_eq!(
        runtime_error("var x = 1\nx = null"),
        RuntimeErrorKind::Scope(ScopeError::NullAssignment("x".to_string()))
    );
}

#[test]
fn while_loops() {
    let source = "
        var counter = 0
        while counter < 3 { counter = counter + 1 }
        var shouldNotChange = 42
        while false { shouldNotChange = 0 }
        var outer = \"\"
        while outer == \"\" {
            var inner = \"done\"
            outer = inner
        }
    ";
    let (i, _) = assert_success(source);
    assert_value(&i, "counter", 3i64);
    assert_value(&i, "shouldNotChange", 42i64);
    assert_value(&i, "outer", "done");
    assert_undefined(&i, "inner");
}

#[test]
fn while_errors() {
    assert!(matches!(
        runtime_error("while 42 { var x = 1 }"),
        RuntimeErrorKind::NonBooleanCondition { construct: "While", .. }
    ));
    assert!(matches!(
        runtime_error("var x = \"string\"\nwhile x < 5 { x = x + 1 }"),
        RuntimeErrorKind::Type(_)
    ));
}

#[test]
fn recursion() {
    let source = "
        func fact(n: int64): int64 {
            if n <= 1 { return 1 }
            return n * fact(n - 1)
        }
        var result = fact(10)
    ";
    let (i, _) = assert_success(source);
    assert_value(&i, "result", 3628800i64);
}

#[test]
fn nested_collections() {
    let source = "
        var grid = [[1, 2], [3, 4]]
        grid[1][0] = 30
        var config = {\"name\": \"zen\", \"tags\": [\"a\"]}
        config.name = \"zen-lang\"
        var cell = grid[1][0]
        var label = config.name + \":\" + to_string(len(config{\"tags\"}))
    ";
    let (i, _) = assert_success(source);
    assert_value(&i, "cell", 30i64);
    assert_value(&i, "label", "zen-lang:1");
}

#[test]
fn division_by_zero() {
    assert!(matches!(
        runtime_error("var x = 10 / 0"),
        RuntimeErrorKind::Type(_)
    ));
    assert!(matches!(
        runtime_error("var x = 1.5 / 0.0"),
        RuntimeErrorKind::Type(_)
    ));
}

#[test]
fn parser_accumulates_errors() {
    let source = "
        var = 1
        var ok = 2
        if { }
        var y = )
        var fine = 3
    ";
    let err = parse_source(&SourceCode::inline(source)).unwrap_err();
    assert!(err.syntax_errors().len() >= 3, "got {:?}", err.syntax_errors());
}

#[test]
fn persistent_interpreter_across_programs() {
    let mut interpreter = Interpreter::new().with_output(Box::new(Captured::default()));
    for line in ["var total = 1", "func double(n: int64): int64 { return n * 2 }", "total = double(total)"] {
        let program = parse_source(&SourceCode::inline(line)).unwrap();
        interpreter.execute(&program).unwrap();
    }
    assert_value(&interpreter, "total", 2i64);
}
