// Interpreter Behavior Tests for Lox
//
// Programs are run end to end with print output captured in a buffer.

use lox::{interpret, parse, scan, Environment, ErrorKind, LoxError, RunOptions, RunStatus, Value};

/// Output of one interpretation pass plus the runtime error, if any
struct Outcome {
    output: String,
    error: Option<LoxError>,
}

fn run_source(source: &str) -> Outcome {
    let mut environment = Environment::new();
    run_source_in(source, &mut environment)
}

fn run_source_in(source: &str, environment: &mut Environment) -> Outcome {
    let (tokens, scan_errors) = scan(source);
    assert!(scan_errors.is_empty(), "scan errors: {:?}", scan_errors);
    let (statements, parse_errors) = parse(tokens);
    assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

    let mut buffer = Vec::new();
    let error = interpret(&statements, environment, &mut buffer).err();
    Outcome {
        output: String::from_utf8(buffer).expect("output is UTF-8"),
        error,
    }
}

fn output_of(source: &str) -> String {
    let outcome = run_source(source);
    if let Some(error) = outcome.error {
        panic!("unexpected runtime error: {}", error);
    }
    outcome.output
}

fn runtime_error_of(source: &str) -> LoxError {
    run_source(source)
        .error
        .unwrap_or_else(|| panic!("expected a runtime error from {:?}", source))
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(output_of("print 1 + 2 * 3;"), "7\n");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(output_of("print (1 + 2) * 3;"), "9\n");
}

#[test]
fn subtraction_and_division_are_left_associative() {
    assert_eq!(output_of("print 10 - 4 - 3;"), "3\n");
    assert_eq!(output_of("print 8 / 4 / 2;"), "1\n");
}

#[test]
fn numbers_print_canonically() {
    assert_eq!(output_of("print 2.5 * 2;"), "5\n");
    assert_eq!(output_of("print 1 / 4;"), "0.25\n");
    assert_eq!(output_of("print -0.5;"), "-0.5\n");
}

#[test]
fn division_by_zero_is_infinite() {
    assert_eq!(output_of("print 1 / 0;"), "Infinity\n");
    assert_eq!(output_of("print -1 / 0;"), "-Infinity\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(output_of("print \"a\" + \"b\";"), "ab\n");
}

#[test]
fn comparisons() {
    assert_eq!(
        output_of("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;"),
        "true\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn equality_across_types() {
    assert_eq!(
        output_of(
            "print nil == nil; print nil == false; print 1 == 1; print \"1\" == 1; \
             print \"x\" != \"x\"; print true == true;"
        ),
        "true\nfalse\ntrue\nfalse\nfalse\ntrue\n"
    );
}

#[test]
fn nan_equals_itself() {
    assert_eq!(
        output_of("print 0/0 == 0/0; var n = 0/0; print n == n; print n != n; print n == 1;"),
        "true\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn nesting_up_to_the_limit_evaluates() {
    let depth = lox::MAX_NESTING - 1;
    let grouped = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(output_of(&grouped), "1\n");

    let negated = format!("print {}1;", "-".repeat(depth));
    assert_eq!(output_of(&negated), "-1\n");
}

#[test]
fn too_much_nesting_is_a_static_error() {
    let depth = 10_000;
    let (status, output) = run_status(&format!("print {}1{};", "(".repeat(depth), ")".repeat(depth)));
    assert_eq!(status, RunStatus::StaticError);
    assert_eq!(output, "");
}

#[test]
fn truthiness_of_not() {
    assert_eq!(
        output_of("print !nil; print !false; print !0; print !\"\"; print !!true;"),
        "true\ntrue\nfalse\nfalse\ntrue\n"
    );
}

// ============================================================================
// Variables and scopes
// ============================================================================

#[test]
fn uninitialized_variable_is_nil() {
    assert_eq!(output_of("var a; print a;"), "nil\n");
}

#[test]
fn block_shadows_then_restores() {
    assert_eq!(
        output_of("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn assignment_reaches_enclosing_scope() {
    assert_eq!(
        output_of("var a = 1; { { a = a + 1; } } print a;"),
        "2\n"
    );
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(output_of("var a; var b; a = b = 3; print a + b;"), "6\n");
    assert_eq!(output_of("var a = 1; print a = 5;"), "5\n");
}

#[test]
fn inner_declarations_vanish_after_block() {
    let error = runtime_error_of("{ var inner = 1; } print inner;");
    assert_eq!(error.message, "Undefined variable 'inner'.");
}

// ============================================================================
// Runtime errors
// ============================================================================

#[test]
fn adding_number_and_string_is_a_type_error() {
    let error = runtime_error_of("print 1 + \"b\";");
    assert_eq!(error.kind, ErrorKind::Runtime);
    assert_eq!(error.message, "Operands must be two numbers or two strings.");
    assert_eq!(error.line, 1);
}

#[test]
fn arithmetic_requires_numbers() {
    assert_eq!(runtime_error_of("print \"a\" * 2;").message, "Operands must be numbers.");
    assert_eq!(runtime_error_of("print nil < 1;").message, "Operands must be numbers.");
    assert_eq!(runtime_error_of("print -\"a\";").message, "Operand must be a number.");
}

#[test]
fn assigning_undeclared_variable_fails() {
    let error = runtime_error_of("a = 5;");
    assert_eq!(error.message, "Undefined variable 'a'.");
    assert_eq!(error.to_string(), "[line 1] Error: Undefined variable 'a'.");
}

#[test]
fn error_reports_offending_line() {
    let error = runtime_error_of("var a = 1;\n\nprint a + true;");
    assert_eq!(error.line, 3);
}

#[test]
fn effects_before_an_error_persist() {
    let mut environment = Environment::new();
    let outcome = run_source_in("var a = 1; print a; a = 2; print a + nil; print 3;", &mut environment);

    assert_eq!(outcome.output, "1\n");
    assert!(outcome.error.is_some());
    assert_eq!(environment.get("a"), Ok(Value::Number(2.0)));
}

#[test]
fn failed_block_still_discards_its_frame() {
    let mut environment = Environment::new();
    let outcome = run_source_in("{ var x = 1; print x + nil; }", &mut environment);

    assert!(outcome.error.is_some());
    assert_eq!(environment.depth(), 1);
    assert!(environment.get("x").is_err());
}

#[test]
fn redeclaring_across_runs_is_a_runtime_error() {
    let mut environment = Environment::new();
    assert!(run_source_in("var a = 1;", &mut environment).error.is_none());

    let outcome = run_source_in("var a = 2;", &mut environment);
    let error = outcome.error.expect("redeclaration should fail");
    assert_eq!(error.message, "Variable 'a' is already declared in this scope.");
    assert_eq!(environment.get("a"), Ok(Value::Number(1.0)));
}

#[test]
fn rerunning_on_fresh_environment_is_deterministic() {
    let source = "var a = \"x\"; { var a = a + \"y\"; print a; } print a; print a + 1;";
    let first = run_source(source);
    let second = run_source(source);

    assert_eq!(first.output, second.output);
    assert_eq!(first.error, second.error);
    assert_eq!(first.output, "xy\nx\n");
}

// ============================================================================
// Runner
// ============================================================================

fn run_status(source: &str) -> (RunStatus, String) {
    let options = RunOptions {
        style: lox::DiagnosticStyle::Plain,
        ..RunOptions::default()
    };
    let mut buffer = Vec::new();
    let status = lox::run(source, Some("test.lox"), &options, &mut buffer);
    (status, String::from_utf8(buffer).expect("output is UTF-8"))
}

#[test]
fn static_errors_prevent_evaluation() {
    let (status, output) = run_status("print 1; print 2 +;");
    assert_eq!(status, RunStatus::StaticError);
    assert_eq!(status.exit_code(), 65);
    assert_eq!(output, "");
}

#[test]
fn runtime_errors_map_to_exit_code_70() {
    let (status, output) = run_status("print 1; print -nil;");
    assert_eq!(status, RunStatus::RuntimeError);
    assert_eq!(status.exit_code(), 70);
    assert_eq!(output, "1\n");
}

#[test]
fn dumps_are_written_before_output() {
    let options = RunOptions {
        style: lox::DiagnosticStyle::Plain,
        dump_tokens: true,
        dump_ast: true,
    };
    let mut buffer = Vec::new();
    let status = lox::run("print 1;", None, &options, &mut buffer);
    assert_eq!(status, RunStatus::Success);
    assert_eq!(
        String::from_utf8(buffer).expect("output is UTF-8"),
        "Print print\nNumber 1 1\nSemicolon ;\nEof \n(print 1)\n1\n"
    );
}

#[test]
fn repl_keeps_bindings_and_survives_errors() {
    let input = "var a = 1;\nprint b;\na + 1;\na = 5;\nprint a;\nexit\nprint 99;\n";
    let mut buffer = Vec::new();
    let options = RunOptions {
        style: lox::DiagnosticStyle::Plain,
        ..RunOptions::default()
    };
    lox::repl::run_session(input.as_bytes(), &mut buffer, &options).expect("session runs");

    let output = String::from_utf8(buffer).expect("output is UTF-8");
    assert!(output.contains("> 2\n"), "echo missing in {:?}", output);
    assert!(output.contains("> 5\n"), "print missing in {:?}", output);
    assert!(output.ends_with("Goodbye!\n"));
    assert!(!output.contains("99"));
}
