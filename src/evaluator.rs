use crate::ast::{CompoundStmt, Expr, Program, Stmt, VarDecl};
use crate::error::{Diagnostic, RuntimeError, Span};
use crate::token::{Token, TokenType};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, trace, warn};

/// Variables of one evaluation session.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, i64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `name` with value 0, resetting it if it already exists.
    /// Returns `true` when the name was already declared.
    pub fn declare(&mut self, name: &str) -> bool {
        self.values.insert(name.to_string(), 0).is_some()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn assign(&mut self, name: &str, value: i64) -> Result<(), RuntimeError> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::UndeclaredVariable {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Variables in name order.
    pub fn variables(&self) -> Vec<(&str, i64)> {
        let mut variables: Vec<_> = self
            .values
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        variables.sort_by(|a, b| a.0.cmp(b.0));
        variables
    }
}

/// Tree-walking evaluator. `writeln` output goes to `output`.
pub struct Evaluator<W: Write> {
    environment: Environment,
    output: W,
}

impl<W: Write> Evaluator<W> {
    pub fn new(output: W) -> Self {
        Self::with_environment(Environment::new(), output)
    }

    pub fn with_environment(environment: Environment, output: W) -> Self {
        Self {
            environment,
            output,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_parts(self) -> (Environment, W) {
        (self.environment, self.output)
    }

    /// Declares every variable at 0, then runs the main block. Stops at the
    /// first runtime error.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), Diagnostic> {
        debug!(
            program = %program.name,
            declarations = program.declarations.len(),
            "evaluating program"
        );
        for declaration in &program.declarations {
            self.declare(declaration)?;
        }
        self.execute_block(&program.main)?;
        self.output.flush().map_err(|error| output_error(error, None))
    }

    pub fn declare(&mut self, declaration: &VarDecl) -> Result<(), Diagnostic> {
        if !declaration.declared_type.eq_ignore_ascii_case("integer") {
            return Err(Diagnostic::runtime_error(
                RuntimeError::UnsupportedConstruct {
                    construct: format!("variables of type '{}'", declaration.declared_type),
                },
                Some(declaration.span),
            )
            .with_detail(format!(
                "'{}' is declared as '{}'",
                declaration.name, declaration.declared_type
            ))
            .with_hint("Declare variables as 'integer', the only type available."));
        }

        if self.environment.declare(&declaration.name) {
            warn!(name = %declaration.name, "variable declared more than once, reset to 0");
        }
        Ok(())
    }

    pub fn execute(&mut self, statement: &Stmt) -> Result<(), Diagnostic> {
        match statement {
            Stmt::Assign { name, value, span } => {
                if !self.environment.contains(name) {
                    return Err(undeclared(name, *span));
                }
                let value = self.evaluate_expr(value)?;
                trace!(%name, value, "assign");
                self.environment
                    .assign(name, value)
                    .map_err(|error| Diagnostic::runtime_error(error, Some(*span)))
            }
            Stmt::Print { argument, span } => {
                let value = self.evaluate_expr(argument)?;
                writeln!(self.output, "{}", value).map_err(|error| output_error(error, Some(*span)))
            }
            Stmt::Compound(block) => self.execute_block(block),
        }
    }

    fn execute_block(&mut self, block: &CompoundStmt) -> Result<(), Diagnostic> {
        for statement in &block.statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    pub fn evaluate_expr(&self, expr: &Expr) -> Result<i64, Diagnostic> {
        match expr {
            Expr::IntegerLiteral { value, .. } => Ok(*value),
            Expr::Identifier { name, span } => self.environment.get(name).ok_or_else(|| {
                Diagnostic::runtime_error(
                    RuntimeError::UndefinedVariable { name: name.clone() },
                    Some(*span),
                )
                .with_detail(format!("'{}' is read here but was never declared", name))
                .with_hint(format!(
                    "Declare it before 'begin': 'var {}: integer;'.",
                    name
                ))
            }),
            Expr::Binary { .. } => {
                // Operators fold to the left, so walk the left spine in a
                // loop and only recurse into right operands.
                let mut spine = Vec::new();
                let mut node = expr;
                while let Expr::Binary {
                    left,
                    operator,
                    right,
                    span,
                } = node
                {
                    spine.push((operator, &**right, *span));
                    node = &**left;
                }

                let mut value = self.evaluate_expr(node)?;
                for (operator, right, span) in spine.into_iter().rev() {
                    let right_val = self.evaluate_expr(right)?;
                    value = evaluate_binary_op(operator, value, right_val, span)?;
                }
                Ok(value)
            }
        }
    }
}

fn evaluate_binary_op(operator: &Token, left: i64, right: i64, span: Span) -> Result<i64, Diagnostic> {
    let (result, operation) = match operator.token_type {
        TokenType::Plus => (left.checked_add(right), "addition"),
        TokenType::Minus => (left.checked_sub(right), "subtraction"),
        TokenType::Star => (left.checked_mul(right), "multiplication"),
        TokenType::Slash => {
            if right == 0 {
                return Err(Diagnostic::runtime_error(RuntimeError::DivisionByZero, Some(span))
                    .with_detail(format!("{} / 0: the divisor evaluated to 0", left))
                    .with_hint("Make sure the right-hand side of '/' can never be zero."));
            }
            // Truncates toward zero.
            (left.checked_div(right), "division")
        }
        _ => {
            return Err(Diagnostic::runtime_error(
                RuntimeError::UnknownOperator {
                    operator: operator.lexeme.clone(),
                },
                Some(span),
            )
            .with_hint("Only '+', '-', '*' and '/' can combine integers."));
        }
    };

    result.ok_or_else(|| {
        Diagnostic::runtime_error(
            RuntimeError::IntegerOverflow {
                operation: operation.to_string(),
            },
            Some(span),
        )
        .with_detail(format!(
            "{} {} {} does not fit in a 64-bit integer",
            left, operator.lexeme, right
        ))
        .with_hint(format!(
            "Integers must lie between {} and {}.",
            i64::MIN,
            i64::MAX
        ))
    })
}

fn undeclared(name: &str, span: Span) -> Diagnostic {
    Diagnostic::runtime_error(
        RuntimeError::UndeclaredVariable {
            name: name.to_string(),
        },
        Some(span),
    )
    .with_detail(format!("'{}' is assigned here but was never declared", name))
    .with_hint(format!("Declare it before 'begin': 'var {}: integer;'.", name))
}

fn output_error(error: std::io::Error, span: Option<Span>) -> Diagnostic {
    Diagnostic::runtime_error(
        RuntimeError::Output {
            reason: error.to_string(),
        },
        span,
    )
}
