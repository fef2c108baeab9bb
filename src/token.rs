use crate::error::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    Comma,
    Colon,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Equal,

    // One or two character tokens
    Assign,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,

    // Literals
    Identifier,
    Integer,

    // Keywords
    Program,
    Var,
    Begin,
    End,
    IntegerType,
    If,
    Then,
    While,
    Do,
    Writeln,

    // Special
    Illegal,
    Eof,
}

impl TokenType {
    /// Case-insensitive keyword lookup; anything else is an identifier.
    pub fn lookup_ident(ident: &str) -> TokenType {
        match ident.to_ascii_lowercase().as_str() {
            "program" => TokenType::Program,
            "var" => TokenType::Var,
            "begin" => TokenType::Begin,
            "end" => TokenType::End,
            "integer" => TokenType::IntegerType,
            "if" => TokenType::If,
            "then" => TokenType::Then,
            "while" => TokenType::While,
            "do" => TokenType::Do,
            "writeln" => TokenType::Writeln,
            _ => TokenType::Identifier,
        }
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenType::Program
                | TokenType::Var
                | TokenType::Begin
                | TokenType::End
                | TokenType::IntegerType
                | TokenType::If
                | TokenType::Then
                | TokenType::While
                | TokenType::Do
                | TokenType::Writeln
        )
    }

    /// How the token kind is named in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenType::LeftParen => "'('",
            TokenType::RightParen => "')'",
            TokenType::Comma => "','",
            TokenType::Colon => "':'",
            TokenType::Dot => "'.'",
            TokenType::Minus => "'-'",
            TokenType::Plus => "'+'",
            TokenType::Semicolon => "';'",
            TokenType::Slash => "'/'",
            TokenType::Star => "'*'",
            TokenType::Equal => "'='",
            TokenType::Assign => "':='",
            TokenType::Less => "'<'",
            TokenType::LessEqual => "'<='",
            TokenType::Greater => "'>'",
            TokenType::GreaterEqual => "'>='",
            TokenType::NotEqual => "'<>'",
            TokenType::Identifier => "identifier",
            TokenType::Integer => "integer literal",
            TokenType::Program => "'program'",
            TokenType::Var => "'var'",
            TokenType::Begin => "'begin'",
            TokenType::End => "'end'",
            TokenType::IntegerType => "'integer'",
            TokenType::If => "'if'",
            TokenType::Then => "'then'",
            TokenType::While => "'while'",
            TokenType::Do => "'do'",
            TokenType::Writeln => "'writeln'",
            TokenType::Illegal => "illegal character",
            TokenType::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    /// Token for an arithmetic operator, used when building trees by hand.
    pub fn operator(token_type: TokenType) -> Self {
        let lexeme = match token_type {
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::Slash => "/",
            other => other.describe().trim_matches('\''),
        };
        Self::new(token_type, lexeme.to_string(), Span::new(0, 0))
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }

    /// Text to quote back to the user when this token is unexpected.
    pub fn display_text(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}
