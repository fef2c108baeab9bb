use std::io::{self, Write};
use tinypas::ast::{CompoundStmt, Expr, Program, Stmt, VarDecl};
use tinypas::error::{ErrorKind, RuntimeError, Span};
use tinypas::evaluator::{Environment, Evaluator};
use tinypas::lexer::Lexer;
use tinypas::parser::Parser;
use tinypas::runner::evaluate_expression;
use tinypas::token::{Token, TokenType};

fn parse(source: &str) -> Program {
    let mut parser = Parser::new(Lexer::new(source));
    match parser.parse_program() {
        Some(program) => program,
        None => panic!("unexpected parse errors: {:?}", parser.errors()),
    }
}

fn run(source: &str) -> (Result<(), tinypas::Diagnostic>, String) {
    let program = parse(source);
    let mut evaluator = Evaluator::new(Vec::new());
    let result = evaluator.evaluate_program(&program);
    let (_, output) = evaluator.into_parts();
    (result, String::from_utf8(output).expect("output is utf-8"))
}

fn runtime_error_of(source: &str) -> RuntimeError {
    match evaluate_expression(source) {
        Err(errors) => match &errors[0].kind {
            ErrorKind::Runtime(error) => error.clone(),
            other => panic!("expected a runtime error, got {:?}", other),
        },
        Ok(value) => panic!("expected an error, got {}", value),
    }
}

fn span() -> Span {
    Span::new(0, 0)
}

fn literal(value: i64) -> Expr {
    Expr::IntegerLiteral { value, span: span() }
}

#[test]
fn literals_evaluate_to_themselves() {
    let evaluator = Evaluator::new(io::sink());
    for value in [0, 1, 42, i64::MAX] {
        assert_eq!(evaluator.evaluate_expr(&literal(value)), Ok(value));
    }
}

#[test]
fn arithmetic_follows_precedence_and_associativity() {
    let cases = [
        ("2 + 3 * 4", 14),
        ("(2 + 3) * 4", 20),
        ("10 - 4 - 3", 3),
        ("100 / 10 / 5", 2),
        ("2 * 3 + 4 * 5", 26),
        ("8 - 2 * 3", 2),
    ];
    for (source, expected) in cases {
        assert_eq!(evaluate_expression(source), Ok(expected), "{}", source);
    }
}

#[test]
fn division_truncates_toward_zero() {
    assert_eq!(evaluate_expression("7 / 2"), Ok(3));
    assert_eq!(evaluate_expression("(0 - 7) / 2"), Ok(-3));
    assert_eq!(evaluate_expression("7 / (0 - 2)"), Ok(-3));
}

#[test]
fn division_by_zero_is_a_diagnostic() {
    assert_eq!(runtime_error_of("10 / 0"), RuntimeError::DivisionByZero);
    assert_eq!(runtime_error_of("1 / (2 - 2)"), RuntimeError::DivisionByZero);

    let errors = evaluate_expression("10 / 0").unwrap_err();
    assert!(errors[0].span.is_some());
    assert!(errors[0].hint.is_some());
}

#[test]
fn overflow_is_a_diagnostic() {
    assert!(matches!(
        runtime_error_of("9223372036854775807 + 1"),
        RuntimeError::IntegerOverflow { .. }
    ));
    assert!(matches!(
        runtime_error_of("(0 - 9223372036854775807 - 1) / (0 - 1)"),
        RuntimeError::IntegerOverflow { .. }
    ));
    assert!(matches!(
        runtime_error_of("4611686018427387904 * 2"),
        RuntimeError::IntegerOverflow { .. }
    ));
}

#[test]
fn reading_an_unknown_name_is_undefined_variable() {
    assert_eq!(
        runtime_error_of("ghost + 1"),
        RuntimeError::UndefinedVariable {
            name: "ghost".to_string()
        }
    );
}

#[test]
fn declared_variables_start_at_zero() {
    let (result, output) = run("program P; var x, y: integer; begin writeln(x); y := x + 1; writeln(y); end.");
    assert_eq!(result, Ok(()));
    assert_eq!(output, "0\n1\n");
}

#[test]
fn assignment_overwrites_previous_value() {
    let (result, output) =
        run("program P; var x: integer; begin x := 1; x := x + 41; writeln(x); end.");
    assert_eq!(result, Ok(()));
    assert_eq!(output, "42\n");
}

#[test]
fn assigning_undeclared_name_fails_in_nested_blocks() {
    let (result, output) = run(
        "program P; var x: integer; begin writeln(1); begin x := 2; y := 3; end; writeln(4); end.",
    );
    let error = result.unwrap_err();
    assert_eq!(
        error.runtime(),
        Some(&RuntimeError::UndeclaredVariable {
            name: "y".to_string()
        })
    );
    assert_eq!(output, "1\n");
}

#[test]
fn undeclared_target_is_reported_before_its_value_is_evaluated() {
    let (result, _) = run("program P; begin y := 1 / 0; end.");
    assert!(matches!(
        result.unwrap_err().runtime(),
        Some(RuntimeError::UndeclaredVariable { .. })
    ));
}

#[test]
fn first_runtime_error_stops_execution() {
    let (result, output) =
        run("program P; var x: integer; begin writeln(1); x := 1 / 0; writeln(2); end.");
    assert_eq!(result.unwrap_err().runtime(), Some(&RuntimeError::DivisionByZero));
    assert_eq!(output, "1\n");
}

#[test]
fn redeclaration_resets_to_zero() {
    let mut evaluator = Evaluator::new(Vec::new());
    evaluator
        .evaluate_program(&parse("program A; var x: integer; begin x := 7; end."))
        .unwrap();
    assert_eq!(evaluator.environment().get("x"), Some(7));

    evaluator
        .evaluate_program(&parse("program B; var x: integer; begin writeln(x); end."))
        .unwrap();
    assert_eq!(evaluator.output().as_slice(), b"0\n");
}

#[test]
fn non_arithmetic_operator_is_unknown_operator() {
    let expr = Expr::Binary {
        left: Box::new(literal(1)),
        operator: Token::operator(TokenType::Equal),
        right: Box::new(literal(1)),
        span: span(),
    };
    let evaluator = Evaluator::new(io::sink());
    let error = evaluator.evaluate_expr(&expr).unwrap_err();
    assert_eq!(
        error.runtime(),
        Some(&RuntimeError::UnknownOperator {
            operator: "=".to_string()
        })
    );
}

#[test]
fn non_integer_declaration_is_unsupported() {
    let program = Program {
        name: "P".to_string(),
        declarations: vec![VarDecl {
            name: "r".to_string(),
            declared_type: "real".to_string(),
            span: span(),
        }],
        main: CompoundStmt {
            statements: Vec::new(),
            span: span(),
        },
        span: span(),
    };
    let mut evaluator = Evaluator::new(io::sink());
    let error = evaluator.evaluate_program(&program).unwrap_err();
    assert!(matches!(
        error.runtime(),
        Some(RuntimeError::UnsupportedConstruct { .. })
    ));
    assert!(evaluator.environment().is_empty());
}

#[test]
fn evaluator_runs_against_a_supplied_environment() {
    let mut environment = Environment::new();
    environment.declare("n");
    environment.assign("n", 5).unwrap();

    let mut evaluator = Evaluator::with_environment(environment, Vec::new());
    let statement = Stmt::Print {
        argument: Expr::Binary {
            left: Box::new(Expr::Identifier {
                name: "n".to_string(),
                span: span(),
            }),
            operator: Token::operator(TokenType::Star),
            right: Box::new(literal(2)),
            span: span(),
        },
        span: span(),
    };
    evaluator.execute(&statement).unwrap();

    let (environment, output) = evaluator.into_parts();
    assert_eq!(output, b"10\n");
    assert_eq!(environment.variables(), vec![("n", 5)]);
}

#[test]
fn environment_rejects_undeclared_assignment() {
    let mut environment = Environment::new();
    assert_eq!(
        environment.assign("z", 1),
        Err(RuntimeError::UndeclaredVariable {
            name: "z".to_string()
        })
    );
    assert!(!environment.declare("z"));
    assert!(environment.declare("z"));
    assert_eq!(environment.len(), 1);
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn output_failures_become_diagnostics() {
    let program = parse("program P; begin writeln(1); end.");
    let mut evaluator = Evaluator::new(BrokenPipe);
    let error = evaluator.evaluate_program(&program).unwrap_err();
    assert!(matches!(error.runtime(), Some(RuntimeError::Output { .. })));
}

#[test]
fn long_flat_sum_evaluates_and_drops() {
    let terms = 100_000;
    let source = vec!["1"; terms].join(" + ");
    let mut parser = Parser::new(Lexer::new(source.as_str()));
    let expr = parser.parse_expression().expect("flat sum parses");

    let evaluator = Evaluator::new(io::sink());
    assert_eq!(evaluator.evaluate_expr(&expr), Ok(terms as i64));
    drop(expr);

    assert_eq!(evaluate_expression(&source), Ok(terms as i64));
}

#[test]
fn long_mixed_chain_keeps_left_to_right_order() {
    // 100 - 1 + 2 * 3 - 1 + 2 * 3 ... each "- 1 + 2 * 3" adds 5
    let mut source = String::from("100");
    for _ in 0..50_000 {
        source.push_str(" - 1 + 2 * 3");
    }
    let program = format!("program P; var x: integer; begin x := {}; writeln(x); end.", source);
    let (result, output) = run(&program);
    assert_eq!(result, Ok(()));
    assert_eq!(output, format!("{}\n", 100 + 5 * 50_000));
}

#[test]
fn error_in_long_chain_reports_the_failing_operation() {
    let source = format!("{} + 1 / 0 + 1", vec!["1"; 20_000].join(" + "));
    let errors = evaluate_expression(&source).unwrap_err();
    assert_eq!(errors[0].runtime(), Some(&RuntimeError::DivisionByZero));
}
