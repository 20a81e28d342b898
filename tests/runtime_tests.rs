// Integration tests for running programs from source text

use serde_json::json;
use treetrace::compiler::errors::CompileError;
use treetrace::driver::{Driver, Execution, RunMode};
use treetrace::parser::{node_to_source, source_to_node, ParseError};
use treetrace::tree::{tags, Node, MAX_TREE_NESTING};

fn run_mode(driver: &Driver, source: &str, mode: RunMode) -> Execution {
    let tree = source_to_node(source).expect("Parsing failed");
    driver.run(&tree, mode).expect("Compilation failed")
}

fn stdout(source: &str) -> String {
    let execution = run_mode(&Driver::default(), source, RunMode::Command);
    assert!(
        execution.capture.last_exception.is_none(),
        "Execution failed: {:?}",
        execution.capture.last_exception
    );
    execution.stdout
}

#[test]
fn test_operator_precedence() {
    let source = "\
print(2 + 3 * 4 ** 2)
print(-2 ** 2, 2 ** 3 ** 2, (1 + 2) * 3)
print(not 1 == 2, 7 // 2 % 3, 1 < 2 < 3)
print(1 or 0 and 0, 'a' in 'cat', 3 not in [1, 2])
";
    assert_eq!(stdout(source), "50\n-4 512 9\nTrue 0 True\n1 True True\n");
}

#[test]
fn test_functions_and_containers() {
    let source = "\
def describe(items):
    counts = {}
    for item in items:
        if item in counts:
            counts[item] = counts[item] + 1
        else:
            counts[item] = 1
    return counts
result = describe(['a', 'b', 'a'])
print(result, len(result))
print(sorted(result.keys()), result['a'])
";
    assert_eq!(stdout(source), "{'a': 2, 'b': 1} 2\n['a', 'b'] 2\n");
}

#[test]
fn test_tuple_unpacking_and_slices() {
    let source = "\
a, b = 1, 2
a, b = b, a
word = 'treetrace'
print(a, b, word[:4], word[-5:])
";
    assert_eq!(stdout(source), "2 1 tree trace\n");
}

#[test]
fn test_from_import() {
    assert_eq!(stdout("from math import floor\nprint(floor(2.7))\n"), "2\n");
}

#[test]
fn test_input_reads_queued_lines_then_raises() {
    let source = "\
name = input('Name? ')
print('Hi ' + name)
again = input()
";
    let driver = Driver::default().with_stdin(["Ada"]);
    let execution = run_mode(&driver, source, RunMode::Command);

    assert_eq!(execution.stdout, "Name? Hi Ada\n");
    assert_eq!(
        execution.capture.to_json()["lastException"],
        json!({"type": "EOFError", "message": "EOF when reading a line"})
    );
}

#[test]
fn test_request_mode_publishes_response() {
    let source = "\
name = request['name']
set_response({'greeting': 'hi ' + name, 'length': len(name)})
";
    let mode = RunMode::Request(json!({"name": "ada"}));
    let execution = run_mode(&Driver::default(), source, mode);

    assert_eq!(execution.response, Some(json!({"greeting": "hi ada", "length": 3})));
}

#[test]
fn test_command_mode_has_no_response() {
    let execution = run_mode(&Driver::default(), "x = 1\n", RunMode::Scheduled);
    assert_eq!(execution.response, None);
    assert!(serde_json::to_value(&execution).unwrap().get("response").is_none());
}

#[test]
fn test_return_outside_function_is_rejected() {
    let tree = source_to_node("return 1\n").unwrap();
    let err = Driver::default().run(&tree, RunMode::Command).unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidStructure {
            message: "'return' outside function".to_string()
        }
    );
}

#[test]
fn test_break_outside_loop_is_rejected() {
    let tree = source_to_node("def f():\n    break\n").unwrap();
    let err = Driver::default().run(&tree, RunMode::Command).unwrap_err();
    assert_eq!(err.to_string(), "'break' outside loop");
}

#[test]
fn test_unsupported_source_is_reported() {
    let err = source_to_node("x += 1\n").unwrap_err();
    assert!(matches!(err, ParseError::Unsupported { .. }), "got {:?}", err);

    let err = source_to_node("def f(:\n    pass\n").unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }), "got {:?}", err);
}

#[test]
fn test_printed_source_runs_identically() {
    let source = "\
def fib(n):
    if n < 2:
        return n
    return fib(n - 1) + fib(n - 2)
for i in range(6):
    print(fib(i), end=' ')
";
    let tree = source_to_node(source).unwrap();
    let printed = node_to_source(&tree).unwrap();
    assert_eq!(printed, source);

    let first = Driver::default().run(&tree, RunMode::Command).unwrap();
    let second = run_mode(&Driver::default(), &printed, RunMode::Command);
    assert_eq!(first, second);
    assert_eq!(first.stdout, "0 1 1 2 3 5 ");
}

#[test]
fn test_deeply_nested_source_is_rejected() {
    let source = format!("x = {}1{}\n", "(".repeat(1000), ")".repeat(1000));
    match source_to_node(&source).unwrap_err() {
        ParseError::Syntax { message, .. } => assert_eq!(message, "Too many nested parentheses"),
        other => panic!("Expected a syntax error, got {:?}", other),
    }

    assert_eq!(stdout(&format!("print({}7{})\n", "(".repeat(50), ")".repeat(50))), "7\n");
}

#[test]
fn test_deeply_nested_tree_is_a_compile_error() {
    let mut expr = Node::new(tags::PYTHON_EXPRESSION)
        .with_child_set("tokens", vec![Node::new(tags::NUMERIC_LITERAL).with_property("value", 1)]);
    for _ in 0..1000 {
        let bracket = Node::new(tags::PY_BRACKET).with_child_set("expr", vec![expr]);
        expr = Node::new(tags::PYTHON_EXPRESSION).with_child_set("tokens", vec![bracket]);
    }
    let tree = Node::new(tags::PYTHON_FILE).with_child_set("body", vec![expr]);

    let err = Driver::default().run(&tree, RunMode::Command).unwrap_err();
    assert_eq!(
        err,
        CompileError::TooDeep {
            what: "Expressions",
            limit: MAX_TREE_NESTING
        }
    );
}

#[test]
fn test_long_negation_chain_is_a_compile_error() {
    let tree = source_to_node(&format!("x = {}1\n", "-".repeat(5000))).unwrap();
    let err = Driver::default().run(&tree, RunMode::Command).unwrap_err();
    assert!(matches!(err, CompileError::TooDeep { .. }), "got {:?}", err);

    assert_eq!(stdout(&format!("print({}1)\n", "-".repeat(101))), "-1\n");
}
