// Integration tests for the lesson runner

use primer::interpreter::engine::{ExecutionLimits, Interpreter};
use primer::interpreter::errors::ErrorKind;
use primer::lesson::{LessonRunner, LessonUnit, RunnerConfig, Verdict};
use primer::parser::parse::Parser;

fn runner() -> LessonRunner {
    LessonRunner::new(RunnerConfig::default())
}

fn run_source(source: &str) -> (Vec<String>, Option<ErrorKind>) {
    let result = runner().run_unit(&LessonUnit::new("test", source));
    (result.output, result.error.map(|e| e.kind))
}

#[test]
fn test_reassigning_constant() {
    let (output, error) = run_source("let x = 1\nx = 2");
    assert!(output.is_empty());
    assert_eq!(error, Some(ErrorKind::ImmutableAssignment));
}

#[test]
fn test_sum_of_five_elements() {
    let source = r#"
let numbers = [1, 2, 3, 4, 5]
var sum = 0
for n in numbers {
    sum += n
}
print(sum)
"#;
    let (output, error) = run_source(source);
    assert_eq!(error, None);
    assert_eq!(output, vec!["15"]);
}

#[test]
fn test_smallest_int() {
    let (output, error) = run_source("let smallest = -9223372036854775808\nprint(smallest)\nprint(smallest - 1)");
    assert_eq!(output, vec!["-9223372036854775808"]);
    assert_eq!(error, Some(ErrorKind::Overflow));
}

#[test]
fn test_missing_key() {
    let (_, error) = run_source("let ages = [\"Tim\": 22]\nlet age = ages[\"Ana\"]");
    assert_eq!(error, Some(ErrorKind::MissingKey));

    let (output, error) = run_source("let ages = [\"Tim\": 22]\nprint(ages[\"Ana\"] ?? 0)");
    assert_eq!(error, None);
    assert_eq!(output, vec!["0"]);
}

#[test]
fn test_no_output_after_failure() {
    let source = "print(\"before\")\nlet x = 1\nx = 2\nprint(\"after\")";
    let result = runner().run_unit(&LessonUnit::new("stops", source));
    assert_eq!(result.output, vec!["before"]);
    let error = result.error.expect("expected an error");
    assert_eq!(error.kind, ErrorKind::ImmutableAssignment);
    assert_eq!(error.line, Some(3));
}

#[test]
fn test_runs_are_deterministic() {
    let source = r#"
var counts: [String: Int] = [:]
for word in ["b", "a", "c", "a", "b", "a"] {
    counts[word] = (counts[word] ?? 0) + 1
}
for (word, count) in counts {
    print(word, count)
}
"#;
    let unit = LessonUnit::new("words", source);
    let config = RunnerConfig {
        record_trace: true,
        ..RunnerConfig::default()
    };
    let runner = LessonRunner::new(config);
    let first = runner.run_unit(&unit);
    let second = runner.run_unit(&unit);
    assert_eq!(first, second);
    assert_eq!(first.output, vec!["b 2", "a 3", "c 1"]);
}

#[test]
fn test_units_are_isolated() {
    let units = vec![
        LessonUnit::new("declares", "var shared = 1\nprint(shared)").expecting_output(["1"]),
        LessonUnit::new("fails", "let x = [1][5]"),
        LessonUnit::new("reads", "print(shared)").expecting_error(ErrorKind::UndefinedName),
    ];
    let results = runner().run_all(&units);
    assert_eq!(results.len(), 3);
    assert!(results[0].passed());
    assert!(!results[1].passed());
    assert_eq!(results[1].error.as_ref().map(|e| e.kind), Some(ErrorKind::IndexOutOfBounds));
    assert!(results[2].passed());
}

#[test]
fn test_scope_violation() {
    let source = r#"
if true {
    let inner = 5
    print(inner)
}
print(inner)
"#;
    let (output, error) = run_source(source);
    assert_eq!(output, vec!["5"]);
    assert_eq!(error, Some(ErrorKind::ScopeViolation));
}

#[test]
fn test_type_mismatch_on_assignment() {
    let (_, error) = run_source("var count = 1\ncount = \"two\"");
    assert_eq!(error, Some(ErrorKind::TypeMismatch));

    let (_, error) = run_source("func double(n: Int) -> Int {\n    return n * 2\n}\nprint(double(n: 1.5))");
    assert_eq!(error, Some(ErrorKind::TypeMismatch));
}

#[test]
fn test_structs_are_copied() {
    let source = r#"
struct Point {
    var x: Int
    var y: Int
}
var a = Point(x: 1, y: 2)
var b = a
b.x = 10
print(a.x, b.x)
print(b)
"#;
    let (output, error) = run_source(source);
    assert_eq!(error, None);
    assert_eq!(output, vec!["1 10", "Point(x: 10, y: 2)"]);
}

#[test]
fn test_recursive_function() {
    let source = r#"
func fib(n: Int) -> Int {
    if n < 2 {
        return n
    }
    return fib(n: n - 1) + fib(n: n - 2)
}
print(fib(n: 15))
"#;
    let (output, error) = run_source(source);
    assert_eq!(error, None);
    assert_eq!(output, vec!["610"]);
}

#[test]
fn test_unexpected_success_fails_verdict() {
    let unit = LessonUnit::new("no error", "let x = 1").expecting_error(ErrorKind::ImmutableAssignment);
    let result = runner().run_unit(&unit);
    assert!(matches!(result.verdict, Verdict::Fail { .. }));
}

#[test]
fn test_interpreter_directly() {
    let source = "var total = 0.5\ntotal += 1\nprint(total)";
    let mut parser = Parser::new(source).expect("Parser creation failed");
    let program = parser.parse_program().expect("Parsing failed");

    let mut interpreter = Interpreter::new(program, ExecutionLimits::default());
    let result = interpreter.run();

    assert!(result.is_ok(), "Execution failed: {:?}", result);
    assert_eq!(interpreter.steps(), 3);
    assert_eq!(interpreter.terminal().get_output(), vec!["1.5"]);
}
