use crate::error::Span;
use crate::token::{Token, TokenType};

/// On-demand scanner: each call to [`Lexer::next_token`] reads just enough
/// source to produce one token.
pub struct Lexer {
    source: String,
    start: usize,
    current: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start: 0,
            current: 0,
            finished: false,
        }
    }

    /// Drains the scanner, keeping the trailing `Eof` token.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let at_end = token.is(TokenType::Eof);
            tokens.push(token);
            if at_end {
                return tokens;
            }
        }
    }

    /// Returns the next token. Once `Eof` has been produced it is produced again
    /// on every call.
    pub fn next_token(&mut self) -> Token {
        if let Some(illegal) = self.skip_trivia() {
            return illegal;
        }

        self.start = self.current;
        if self.is_at_end() {
            self.finished = true;
            return Token::new(TokenType::Eof, String::new(), Span::new(self.current, self.current));
        }

        let c = self.advance();
        match c {
            '(' => self.make_token(TokenType::LeftParen),
            ')' => self.make_token(TokenType::RightParen),
            ',' => self.make_token(TokenType::Comma),
            ';' => self.make_token(TokenType::Semicolon),
            '.' => self.make_token(TokenType::Dot),
            '+' => self.make_token(TokenType::Plus),
            '-' => self.make_token(TokenType::Minus),
            '*' => self.make_token(TokenType::Star),
            '/' => self.make_token(TokenType::Slash),
            '=' => self.make_token(TokenType::Equal),
            ':' => {
                let token_type = if self.match_char('=') {
                    TokenType::Assign
                } else {
                    TokenType::Colon
                };
                self.make_token(token_type)
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else if self.match_char('>') {
                    TokenType::NotEqual
                } else {
                    TokenType::Less
                };
                self.make_token(token_type)
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.make_token(token_type)
            }
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => self.make_token(TokenType::Illegal),
        }
    }

    /// Skips whitespace and comments. An unterminated block comment comes back
    /// as an `Illegal` token spanning the opening delimiter.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == '/' => {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                '{' => {
                    let open = self.current;
                    self.advance();
                    if !self.skip_until("}") {
                        return Some(self.unterminated_comment(open, "{"));
                    }
                }
                '(' if self.peek_next() == '*' => {
                    let open = self.current;
                    self.advance();
                    self.advance();
                    if !self.skip_until("*)") {
                        return Some(self.unterminated_comment(open, "(*"));
                    }
                }
                _ => return None,
            }
        }
    }

    fn skip_until(&mut self, close: &str) -> bool {
        match self.source[self.current..].find(close) {
            Some(offset) => {
                self.current += offset + close.len();
                true
            }
            None => {
                self.current = self.source.len();
                false
            }
        }
    }

    fn unterminated_comment(&mut self, open: usize, delimiter: &str) -> Token {
        self.start = open;
        Token::new(
            TokenType::Illegal,
            delimiter.to_string(),
            Span::new(open, open + delimiter.len()),
        )
    }

    fn is_at_end(&self) -> bool {
        self.finished || self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current..].chars().nth(1).unwrap_or('\0')
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        self.make_token(TokenType::Integer)
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = TokenType::lookup_ident(text);
        self.make_token(token_type)
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        let text = &self.source[self.start..self.current];
        Token::new(token_type, text.to_string(), Span::new(self.start, self.current))
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token before `Eof`.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        if token.is(TokenType::Eof) {
            None
        } else {
            Some(token)
        }
    }
}
