use crate::ast::Program;
use crate::config::{RenderStyle, RunConfig};
use crate::error::Diagnostic;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, Write};
use tracing::info;

/// Outcome of a run, mapped to the process exit code by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    SyntaxErrors(usize),
    RuntimeError,
}

impl RunStatus {
    /// `sysexits`-style codes: 65 for bad input, 70 for a failed run.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::SyntaxErrors(_) => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub fn parse(source: &str, config: &RunConfig) -> Result<Program, Vec<Diagnostic>> {
    let mut parser = Parser::new(Lexer::new(source)).with_recovery(config.recovery);
    match parser.parse_program() {
        Some(program) => Ok(program),
        None => Err(parser.into_errors()),
    }
}

/// Parses `source`, stopping on syntax errors, then runs it with `writeln`
/// output going to `output`. Returns every parse diagnostic, or the single
/// runtime diagnostic that stopped execution.
pub fn interpret<W: Write>(
    source: &str,
    config: &RunConfig,
    output: W,
) -> Result<(), Vec<Diagnostic>> {
    let program = parse(source, config)?;
    let mut evaluator = Evaluator::new(output);
    evaluator
        .evaluate_program(&program)
        .map_err(|error| vec![error])
}

/// Evaluates a standalone expression. Every name in it is undefined, so only
/// literal arithmetic succeeds.
pub fn evaluate_expression(source: &str) -> Result<i64, Vec<Diagnostic>> {
    let mut parser = Parser::new(Lexer::new(source));
    let expr = match parser.parse_expression() {
        Some(expr) => expr,
        None => return Err(parser.into_errors()),
    };
    let evaluator = Evaluator::new(io::sink());
    evaluator.evaluate_expr(&expr).map_err(|error| vec![error])
}

pub fn run(source: &str, filename: Option<&str>, config: &RunConfig) -> RunStatus {
    let program = match parse(source, config) {
        Ok(program) => program,
        Err(errors) => {
            for error in &errors {
                report(error, source, filename, config);
            }
            return RunStatus::SyntaxErrors(errors.len());
        }
    };

    if config.dump_ast {
        print!("{}", program);
    }

    let stdout = io::stdout();
    let mut evaluator = Evaluator::new(stdout.lock());
    match evaluator.evaluate_program(&program) {
        Ok(()) => {
            info!(program = %program.name, "program completed");
            eprintln!("Program '{}' completed successfully.", program.name);
            RunStatus::Completed
        }
        Err(error) => {
            report(&error, source, filename, config);
            RunStatus::RuntimeError
        }
    }
}

pub fn run_expression(source: &str, config: &RunConfig) -> RunStatus {
    match evaluate_expression(source) {
        Ok(value) => {
            println!("{}", value);
            RunStatus::Completed
        }
        Err(errors) => {
            for error in &errors {
                report(error, source, Some("<expr>"), config);
            }
            if errors.iter().all(Diagnostic::is_syntax) {
                RunStatus::SyntaxErrors(errors.len())
            } else {
                RunStatus::RuntimeError
            }
        }
    }
}

pub fn report(error: &Diagnostic, source: &str, filename: Option<&str>, config: &RunConfig) {
    match config.render {
        RenderStyle::Annotated => error.report(source, filename),
        RenderStyle::Plain => eprintln!("{}", error.render_plain(source)),
    }
}
