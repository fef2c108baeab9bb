use crate::error::Span;
use crate::token::Token;
use std::fmt;

/// A whole `program ... end.` unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub declarations: Vec<VarDecl>,
    pub main: CompoundStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub declared_type: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStmt {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    Print {
        argument: Expr,
        span: Span,
    },
    Compound(CompoundStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. } => *span,
            Stmt::Print { span, .. } => *span,
            Stmt::Compound(block) => block.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntegerLiteral {
        value: i64,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntegerLiteral { span, .. } => *span,
            Expr::Identifier { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
        }
    }

    /// Compares two trees ignoring spans, so a re-parsed printout can be
    /// checked against the tree it came from.
    pub fn same_shape(&self, other: &Expr) -> bool {
        let (mut a, mut b) = (self, other);
        // Walks the left spines together; only right operands recurse.
        loop {
            match (a, b) {
                (
                    Expr::Binary {
                        left: left_a,
                        operator: op_a,
                        right: right_a,
                        ..
                    },
                    Expr::Binary {
                        left: left_b,
                        operator: op_b,
                        right: right_b,
                        ..
                    },
                ) => {
                    if op_a.token_type != op_b.token_type || !right_a.same_shape(right_b) {
                        return false;
                    }
                    a = &**left_a;
                    b = &**left_b;
                }
                (Expr::IntegerLiteral { value: x, .. }, Expr::IntegerLiteral { value: y, .. }) => {
                    return x == y
                }
                (Expr::Identifier { name: x, .. }, Expr::Identifier { name: y, .. }) => {
                    return x == y
                }
                _ => return false,
            }
        }
    }

    fn binding_power(&self) -> u8 {
        match self {
            Expr::Binary { operator, .. } => match operator.lexeme.as_str() {
                "+" | "-" => 1,
                _ => 2,
            },
            _ => 3,
        }
    }
}

// Long `a + b + ...` chains lean left; freeing them from a work list keeps
// the stack flat.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut expr) = pending.pop() {
            detach_children(&mut expr, &mut pending);
        }
    }
}

fn detach_children(expr: &mut Expr, pending: &mut Vec<Expr>) {
    if let Expr::Binary { left, right, .. } = expr {
        for child in [left, right] {
            if matches!(**child, Expr::Binary { .. }) {
                pending.push(std::mem::replace(&mut **child, Expr::placeholder()));
            }
        }
    }
}

impl Expr {
    fn placeholder() -> Expr {
        Expr::IntegerLiteral {
            value: 0,
            span: Span::new(0, 0),
        }
    }
}

impl Stmt {
    pub fn same_shape(&self, other: &Stmt) -> bool {
        match (self, other) {
            (
                Stmt::Assign { name: a, value: x, .. },
                Stmt::Assign { name: b, value: y, .. },
            ) => a == b && x.same_shape(y),
            (Stmt::Print { argument: x, .. }, Stmt::Print { argument: y, .. }) => x.same_shape(y),
            (Stmt::Compound(a), Stmt::Compound(b)) => a.same_shape(b),
            _ => false,
        }
    }
}

impl CompoundStmt {
    pub fn same_shape(&self, other: &CompoundStmt) -> bool {
        self.statements.len() == other.statements.len()
            && self
                .statements
                .iter()
                .zip(&other.statements)
                .all(|(a, b)| a.same_shape(b))
    }
}

impl Program {
    pub fn same_shape(&self, other: &Program) -> bool {
        self.name == other.name
            && self.declarations.len() == other.declarations.len()
            && self
                .declarations
                .iter()
                .zip(&other.declarations)
                .all(|(a, b)| a.name == b.name && a.declared_type == b.declared_type)
            && self.main.same_shape(&other.main)
    }
}

// Source printer. Output re-parses to a tree of the same shape.

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::IntegerLiteral { value, .. } => write!(f, "{}", value),
            Expr::Identifier { name, .. } => write!(f, "{}", name),
            Expr::Binary { .. } => {
                // Left operands only need parens when looser; right operands
                // also need them at equal power to keep left associativity.
                let mut spine = Vec::new();
                let mut node = self;
                while let Expr::Binary {
                    left,
                    operator,
                    right,
                    ..
                } = node
                {
                    let power = node.binding_power();
                    spine.push((power, left.binding_power() < power, operator, right));
                    node = &**left;
                }

                let opened = spine.iter().filter(|(_, wrap_left, _, _)| *wrap_left).count();
                write!(f, "{}{}", "(".repeat(opened), node)?;
                for (power, wrap_left, operator, right) in spine.into_iter().rev() {
                    if wrap_left {
                        f.write_str(")")?;
                    }
                    write!(f, " {} ", operator.lexeme)?;
                    if right.binding_power() <= power {
                        write!(f, "({})", right)?;
                    } else {
                        write!(f, "{}", right)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl CompoundStmt {
    fn write_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        writeln!(f, "{}begin", "  ".repeat(depth))?;
        for statement in &self.statements {
            statement.write_indented(f, depth + 1)?;
        }
        write!(f, "{}end", "  ".repeat(depth))
    }
}

impl Stmt {
    fn write_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Stmt::Assign { name, value, .. } => writeln!(f, "{}{} := {};", indent, name, value),
            Stmt::Print { argument, .. } => writeln!(f, "{}writeln({});", indent, argument),
            Stmt::Compound(block) => {
                block.write_indented(f, depth)?;
                writeln!(f, ";")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "program {};", self.name)?;
        for decl in &self.declarations {
            writeln!(f, "var {}: {};", decl.name, decl.declared_type)?;
        }
        self.main.write_indented(f, 0)?;
        writeln!(f, ".")
    }
}
