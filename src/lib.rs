// tinypas interpreter library
//
// Front end and tree-walking evaluator for a small Pascal subset:
// source text is scanned into tokens, parsed into an AST and executed
// directly, with structured diagnostics for syntax and runtime errors.

// Public modules
pub mod ast;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod token;

// Re-export commonly used items
pub use ast::{CompoundStmt, Expr, Program, Stmt, VarDecl};
pub use config::{RenderStyle, RunConfig};
pub use error::{Diagnostic, ErrorKind, RuntimeError, Span};
pub use evaluator::{Environment, Evaluator};
pub use lexer::Lexer;
pub use parser::{Fragment, Parser, RecoveryMode};
pub use token::{Token, TokenType};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{interpret, run, RunStatus};
