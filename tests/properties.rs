use proptest::prelude::*;
use tinypas::config::RunConfig;
use tinypas::error::RuntimeError;
use tinypas::lexer::Lexer;
use tinypas::parser::Parser;
use tinypas::runner::{evaluate_expression, interpret};

/// Well-formed expression source over literals and the variable `x`, fully
/// parenthesized so the generated shape is unambiguous.
fn expression_source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i64..1000).prop_map(|n| n.to_string()),
        Just("x".to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/"]), inner)
            .prop_map(|(left, op, right)| format!("({} {} {})", left, op, right))
    })
}

proptest! {
    #[test]
    fn literal_evaluates_to_itself(n in 0i64..=i64::MAX) {
        prop_assert_eq!(evaluate_expression(&n.to_string()), Ok(n));
    }

    #[test]
    fn arithmetic_matches_integer_semantics(a in 0i64..10_000, b in 0i64..10_000, c in 1i64..10_000) {
        prop_assert_eq!(evaluate_expression(&format!("{} + {} * {}", a, b, c)), Ok(a + b * c));
        prop_assert_eq!(evaluate_expression(&format!("({} + {}) * {}", a, b, c)), Ok((a + b) * c));
        prop_assert_eq!(evaluate_expression(&format!("{} - {} - {}", a, b, c)), Ok(a - b - c));
        prop_assert_eq!(evaluate_expression(&format!("{} / {}", a, c)), Ok(a / c));
        prop_assert_eq!(evaluate_expression(&format!("(0 - {}) / {}", a, c)), Ok(-a / c));
    }

    #[test]
    fn division_by_zero_never_panics(a in 0i64..1_000_000, b in 0i64..1000) {
        let errors = evaluate_expression(&format!("{} / ({} - {})", a, b, b)).unwrap_err();
        prop_assert_eq!(errors[0].runtime(), Some(&RuntimeError::DivisionByZero));
    }

    #[test]
    fn undeclared_assignment_fails_wherever_it_appears(before in 0usize..5, after in 0usize..5) {
        let mut body = String::new();
        for i in 0..before {
            body.push_str(&format!("writeln({});\n", i));
        }
        body.push_str("ghost := 1;\n");
        for i in 0..after {
            body.push_str(&format!("writeln({});\n", i));
        }
        let source = format!("program P; var x: integer; begin\n{}end.", body);

        let mut output = Vec::new();
        let errors = interpret(&source, &RunConfig::default(), &mut output).unwrap_err();
        prop_assert_eq!(
            errors[0].runtime(),
            Some(&RuntimeError::UndeclaredVariable { name: "ghost".to_string() })
        );
        prop_assert_eq!(output.iter().filter(|&&byte| byte == b'\n').count(), before);
    }

    #[test]
    fn printed_expression_reparses_to_same_tree(source in expression_source()) {
        let mut parser = Parser::new(Lexer::new(source.as_str()));
        let expr = parser.parse_expression();
        prop_assert!(expr.is_some(), "{:?}", parser.errors());
        let expr = expr.unwrap();

        let printed = expr.to_string();
        let mut reparser = Parser::new(Lexer::new(printed.as_str()));
        let reparsed = reparser.parse_expression();
        prop_assert!(reparsed.is_some(), "{:?}", reparser.errors());
        prop_assert!(expr.same_shape(&reparsed.unwrap()), "{} printed as {}", source, printed);
    }
}
