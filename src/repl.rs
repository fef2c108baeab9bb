use crate::config::RunConfig;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::{Fragment, Parser};
use crate::runner::report;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Interactive loop. Declarations, statements and expressions are accepted
/// one line at a time and share one environment until `:reset`.
pub fn start(config: &RunConfig) {
    println!("tinypas {}", env!("CARGO_PKG_VERSION"));
    println!("Declare with 'var x: integer', assign with 'x := 1', print with 'writeln(x)'.");
    println!("Type ':vars' to list variables, ':reset' to clear them, 'exit' to quit.");
    println!();

    let stdin = io::stdin();
    let mut session = Session::new(config.clone());
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            // EOF (Ctrl+D or piped input ended)
            None => {
                println!();
                break;
            }
            Some(Ok(line)) => line,
            Some(Err(error)) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            println!("Goodbye!");
            break;
        }

        session.handle_line(line);
    }
}

struct Session {
    config: RunConfig,
    evaluator: Evaluator<io::Stdout>,
}

impl Session {
    fn new(config: RunConfig) -> Self {
        Self {
            config,
            evaluator: Evaluator::new(io::stdout()),
        }
    }

    fn handle_line(&mut self, line: &str) {
        match line {
            ":vars" => {
                for (name, value) in self.evaluator.environment().variables() {
                    println!("{} = {}", name, value);
                }
                return;
            }
            ":reset" => {
                self.evaluator = Evaluator::new(io::stdout());
                println!("Environment cleared.");
                return;
            }
            _ => {}
        }

        let mut parser = Parser::new(Lexer::new(line)).with_recovery(self.config.recovery);
        let fragment = match parser.parse_fragment() {
            Some(fragment) => fragment,
            None => {
                for error in parser.errors() {
                    report(error, line, None, &self.config);
                }
                return;
            }
        };
        debug!(?fragment, "repl input");

        let result = match &fragment {
            Fragment::Declarations(declarations) => declarations
                .iter()
                .try_for_each(|declaration| self.evaluator.declare(declaration)),
            Fragment::Statement(statement) => self.evaluator.execute(statement),
            Fragment::Expression(expr) => self.evaluator.evaluate_expr(expr).map(|value| {
                println!("{}", value);
            }),
        };

        if let Err(error) = result {
            report(&error, line, None, &self.config);
        }
    }
}
