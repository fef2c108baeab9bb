use crate::ast::{CompoundStmt, Expr, Program, Stmt, VarDecl};
use crate::error::{Diagnostic, Span};
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};
use tracing::{debug, trace};

type ParseResult<T> = Result<T, Diagnostic>;

/// How statement-level syntax errors inside `begin ... end` are handled.
///
/// Errors in the program header, the `var` section and the closing `end.`
/// always abort the parse: there is no safe point to resume from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Stop at the first error.
    #[default]
    Strict,
    /// Record the error, skip past the next `;` and keep parsing statements so
    /// that several mistakes can be reported in one run.
    BestEffort,
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Declarations(Vec<VarDecl>),
    Statement(Stmt),
    Expression(Expr),
}

pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    previous_end: usize,
    errors: Vec<Diagnostic>,
    recovery: RecoveryMode,
    // REPL input may end a statement at end of input instead of ';'.
    eof_terminates: bool,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            previous_end: 0,
            errors: Vec::new(),
            recovery: RecoveryMode::default(),
            eof_terminates: false,
        }
    }

    pub fn with_recovery(mut self, recovery: RecoveryMode) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Diagnostic> {
        self.errors
    }

    /// Parses a complete program. Returns `None` when any diagnostic was
    /// recorded; see [`Parser::errors`].
    pub fn parse_program(&mut self) -> Option<Program> {
        debug!(recovery = ?self.recovery, "parsing program");
        let result = self.program();
        let program = self.finish(result);
        debug!(
            parsed = program.is_some(),
            errors = self.errors.len(),
            "finished parsing program"
        );
        program
    }

    /// Parses input that must consist of exactly one expression.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        let result = self.standalone_expression();
        self.finish(result)
    }

    /// Parses a single line of interactive input.
    pub fn parse_fragment(&mut self) -> Option<Fragment> {
        self.eof_terminates = true;
        let result = self.fragment();
        self.finish(result)
    }

    fn finish<T>(&mut self, result: ParseResult<T>) -> Option<T> {
        match result {
            Ok(value) if self.errors.is_empty() => Some(value),
            Ok(_) => None,
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    fn program(&mut self) -> ParseResult<Program> {
        let start = self.current.span;
        self.consume_with_help(
            TokenType::Program,
            "Expected 'program' at the start of the source",
            "Every program starts with a header such as 'program Demo;'.",
        )?;
        let name = self
            .expect_identifier(
                "Expected a program name after 'program'",
                "Name the program in its header: 'program Demo;'.",
            )?
            .lexeme;
        self.consume_with_help(
            TokenType::Semicolon,
            "Expected ';' after the program name",
            "The program header ends with a semicolon: 'program Demo;'.",
        )?;

        let mut declarations = Vec::new();
        while self.check(TokenType::Var) {
            declarations.extend(self.var_section()?);
        }

        if !self.check(TokenType::Begin) {
            return Err(self.unexpected(
                "Expected 'begin' to start the program body",
                "The body of a program is a 'begin ... end.' block placed after the 'var' declarations.",
            ));
        }
        let main = self.compound_statement()?;

        let dot = self.consume_with_help(
            TokenType::Dot,
            "Expected '.' after the final 'end'",
            "A program must finish with 'end.' (note the period).",
        )?;
        if !self.check(TokenType::Eof) {
            return Err(self.unexpected(
                "Unexpected input after the end of the program",
                "Nothing may follow the closing 'end.'.",
            ));
        }

        Ok(Program {
            name,
            declarations,
            main,
            span: start.to(dot.span),
        })
    }

    fn var_section(&mut self) -> ParseResult<Vec<VarDecl>> {
        self.advance(); // 'var'
        let mut declarations = self.var_group()?;
        while self.check(TokenType::Identifier) {
            declarations.extend(self.var_group()?);
        }
        Ok(declarations)
    }

    fn var_group(&mut self) -> ParseResult<Vec<VarDecl>> {
        let mut names = vec![self.expect_identifier(
            "Expected a variable name in declaration",
            "Declare variables as 'var x: integer;' or 'var x, y: integer;'.",
        )?];
        while self.match_type(TokenType::Comma) {
            names.push(self.expect_identifier(
                "Expected a variable name after ','",
                "Separate the names of variables sharing a type with commas: 'var x, y: integer;'.",
            )?);
        }

        self.consume_with_help(
            TokenType::Colon,
            "Expected ':' after variable name",
            "Give each variable a type: 'var x: integer;'.",
        )?;

        let type_token = if self.check(TokenType::IntegerType) {
            self.advance()
        } else if self.check(TokenType::Identifier) {
            let found = self.current.clone();
            return Err(Diagnostic::syntax_error_with_help(
                found.span,
                format!("Unknown type '{}'", found.lexeme),
                "'integer' is the only type available.".to_string(),
            ));
        } else {
            return Err(self.unexpected(
                "Expected a type after ':'",
                "Give each variable a type: 'var x: integer;'.",
            ));
        };

        let end = self.statement_terminator("variable declaration")?;
        Ok(names
            .into_iter()
            .map(|name| VarDecl {
                name: name.lexeme,
                declared_type: type_token.lexeme.clone(),
                span: name.span.to(end),
            })
            .collect())
    }

    fn compound_statement(&mut self) -> ParseResult<CompoundStmt> {
        let begin = self.consume_with_help(
            TokenType::Begin,
            "Expected 'begin'",
            "Blocks are written as 'begin ... end'.",
        )?;

        let mut statements = Vec::new();
        while !self.check(TokenType::End) && !self.check(TokenType::Eof) {
            match self.statement() {
                Ok(statement) => statements.push(statement),
                Err(error) if self.recovery == RecoveryMode::BestEffort => {
                    debug!(message = %error.message, "recovering from statement error");
                    self.errors.push(error);
                    self.synchronize();
                }
                Err(error) => return Err(error),
            }
        }

        let end = self.consume_with_help(
            TokenType::End,
            "Expected 'end' to close 'begin'",
            "Every 'begin' must be matched by an 'end'.",
        )?;
        Ok(CompoundStmt {
            statements,
            span: begin.span.to(end.span),
        })
    }

    /// Skips the offending token and everything up to and including the next
    /// `;`, stopping early in front of `end` or end of input.
    fn synchronize(&mut self) {
        while !self.check(TokenType::End) && !self.check(TokenType::Eof) {
            if self.advance().is(TokenType::Semicolon) {
                return;
            }
        }
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.current.token_type {
            TokenType::Identifier => self.assignment(),
            TokenType::Writeln => self.print_statement(),
            TokenType::Begin => {
                let block = self.compound_statement()?;
                self.match_type(TokenType::Semicolon);
                Ok(Stmt::Compound(block))
            }
            TokenType::If | TokenType::Then | TokenType::While | TokenType::Do => {
                let keyword = self.current.clone();
                Err(Diagnostic::syntax_error_with_help(
                    keyword.span,
                    format!(
                        "'{}' is not supported",
                        keyword.lexeme.to_ascii_lowercase()
                    ),
                    "Only assignments, writeln(...) and 'begin ... end' blocks can be used as statements.".to_string(),
                )
                .with_detail("'if', 'then', 'while' and 'do' are reserved words, but conditionals and loops are not part of the language yet"))
            }
            _ => Err(self.unexpected(
                "Expected a statement",
                "Statements are assignments such as 'x := 1;', 'writeln(x);' or a 'begin ... end' block.",
            )),
        }
    }

    fn assignment(&mut self) -> ParseResult<Stmt> {
        let name = self.advance();

        if self.check(TokenType::Equal) {
            return Err(Diagnostic::syntax_error_with_help(
                self.current.span,
                format!("Expected ':=' after '{}', found '='", name.lexeme),
                "Assignment is written ':='; a single '=' is not an assignment.".to_string(),
            ));
        }
        self.consume_with_help(
            TokenType::Assign,
            &format!("Expected ':=' after '{}'", name.lexeme),
            "Assign values with ':=' as in 'x := 1;'.",
        )?;

        self.expect_operand("':='")?;
        let value = self.expression()?;
        let end = self.statement_terminator("assignment")?;
        Ok(Stmt::Assign {
            name: name.lexeme,
            value,
            span: name.span.to(end),
        })
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance();
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'writeln'",
            "Print values with 'writeln(expression);'.",
        )?;
        if self.check(TokenType::RightParen) {
            return Err(Diagnostic::syntax_error_with_help(
                self.current.span,
                "'writeln' needs an expression to print".to_string(),
                "Pass exactly one expression: 'writeln(x);'.".to_string(),
            ));
        }

        let argument = self.expression()?;
        if self.check(TokenType::Comma) {
            return Err(Diagnostic::syntax_error_with_help(
                self.current.span,
                "'writeln' takes a single expression".to_string(),
                "Print each value with its own 'writeln(...)' statement.".to_string(),
            ));
        }
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after the 'writeln' argument",
            "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
        )?;

        let end = self.statement_terminator("'writeln' statement")?;
        Ok(Stmt::Print {
            argument,
            span: keyword.span.to(end),
        })
    }

    fn statement_terminator(&mut self, what: &str) -> ParseResult<Span> {
        if self.check(TokenType::Semicolon) {
            return Ok(self.advance().span);
        }
        if self.eof_terminates && self.check(TokenType::Eof) {
            return Ok(Span::new(self.previous_end, self.previous_end));
        }
        Err(self.unexpected(
            &format!("Expected ';' after {}", what),
            "End each declaration and statement with a semicolon.",
        ))
    }

    fn standalone_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.expression()?;
        self.expect_end("expression")?;
        Ok(expr)
    }

    fn fragment(&mut self) -> ParseResult<Fragment> {
        let fragment = match self.current.token_type {
            TokenType::Var => Fragment::Declarations(self.var_section()?),
            TokenType::Identifier
                if matches!(self.peek.token_type, TokenType::Assign | TokenType::Equal) =>
            {
                Fragment::Statement(self.statement()?)
            }
            TokenType::Writeln
            | TokenType::Begin
            | TokenType::If
            | TokenType::Then
            | TokenType::While
            | TokenType::Do => Fragment::Statement(self.statement()?),
            _ => Fragment::Expression(self.expression()?),
        };
        self.expect_end("input")?;
        Ok(fragment)
    }

    fn expect_end(&mut self, what: &str) -> ParseResult<()> {
        if self.check(TokenType::Eof) {
            Ok(())
        } else {
            Err(self.unexpected(
                &format!("Unexpected input after {}", what),
                "Check for a missing operator or an unbalanced ')'.",
            ))
        }
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.check(TokenType::Plus) || self.check(TokenType::Minus) {
            let operator = self.advance();
            self.expect_operand(&format!("'{}'", operator.lexeme))?;
            let right = self.term()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while self.check(TokenType::Star) || self.check(TokenType::Slash) {
            let operator = self.advance();
            self.expect_operand(&format!("'{}'", operator.lexeme))?;
            let right = self.factor()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// Fails with a targeted message when nothing after `what` can start an
    /// operand.
    fn expect_operand(&self, what: &str) -> ParseResult<()> {
        if self.can_start_factor() {
            return Ok(());
        }
        Err(self.unexpected(
            &format!("Expected an expression after {}", what),
            "Operators and ':=' need a number, a variable or a parenthesized expression after them.",
        ))
    }

    fn can_start_factor(&self) -> bool {
        matches!(
            self.current.token_type,
            TokenType::Integer | TokenType::Identifier | TokenType::LeftParen | TokenType::Minus
        )
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        match self.current.token_type {
            TokenType::Integer => {
                let token = self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    Diagnostic::syntax_error_with_help(
                        token.span,
                        format!("Integer literal {} is too large", token.lexeme),
                        format!("Integers must lie between {} and {}.", i64::MIN, i64::MAX),
                    )
                })?;
                Ok(Expr::IntegerLiteral {
                    value,
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                let token = self.advance();
                Ok(Expr::Identifier {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            TokenType::LeftParen => {
                let open = self.advance();
                if self.check(TokenType::RightParen) {
                    return Err(Diagnostic::syntax_error_with_help(
                        open.span.to(self.current.span),
                        "Empty parentheses are not allowed".to_string(),
                        "Parentheses must contain an expression, for example (x + 1).".to_string(),
                    ));
                }
                let expr = self.expression()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
                )?;
                Ok(expr)
            }
            TokenType::Minus => Err(Diagnostic::syntax_error_with_help(
                self.current.span,
                "Unary minus is not supported".to_string(),
                "Subtract from zero instead: write '0 - x' rather than '-x'.".to_string(),
            )),
            _ => {
                let hint = match self.current.token_type {
                    TokenType::RightParen => {
                        "Found ')' without matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a number, a variable or a parenthesized expression here.",
                };
                Err(self.unexpected("Expected an expression", hint))
            }
        }
    }

    fn match_type(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.current.is(token_type)
    }

    /// Moves the window forward and returns the token that was current.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let peeked = std::mem::replace(&mut self.peek, next);
        let token = std::mem::replace(&mut self.current, peeked);
        trace!(token = ?token.token_type, lexeme = %token.lexeme, "consumed token");
        if !token.is(TokenType::Eof) {
            self.previous_end = token.span.end;
        }
        token
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: &str,
    ) -> ParseResult<Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message, help))
        }
    }

    fn expect_identifier(&mut self, message: &str, help: &str) -> ParseResult<Token> {
        if self.current.token_type.is_keyword() {
            let keyword = &self.current;
            return Err(Diagnostic::syntax_error_with_help(
                keyword.span,
                format!("'{}' is a reserved word and cannot be used as a name", keyword.lexeme),
                "Pick a different name; reserved words are matched in any letter case.".to_string(),
            )
            .with_detail(message.to_string()));
        }
        self.consume_with_help(TokenType::Identifier, message, help)
    }

    fn error_span(&self) -> Span {
        if self.check(TokenType::Eof) {
            // Point just past the last real token.
            Span::single(self.previous_end)
        } else {
            self.current.span
        }
    }

    /// Diagnostic for a token that does not fit the grammar here. Illegal
    /// tokens are reported as such, whatever was expected.
    fn unexpected(&self, message: &str, help: &str) -> Diagnostic {
        if self.check(TokenType::Illegal) {
            return self.illegal_token();
        }
        Diagnostic::syntax_error_with_help(self.error_span(), message.to_string(), help.to_string())
            .with_detail(format!("found {}", self.current.display_text()))
    }

    fn illegal_token(&self) -> Diagnostic {
        let token = &self.current;
        if token.lexeme == "{" || token.lexeme == "(*" {
            Diagnostic::lexical_error(token.span, "Unterminated comment".to_string())
                .with_detail(format!("the comment opened by '{}' is never closed", token.lexeme))
                .with_hint("Close '{' comments with '}' and '(*' comments with '*)'.")
        } else {
            Diagnostic::lexical_error(token.span, format!("Unexpected character '{}'", token.lexeme))
                .with_hint("Programs may only contain letters, digits, underscores, comments and the symbols + - * / = < > ( ) , ; : .")
        }
    }
}

fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}
