//! Lexer/Scanner implementation for the Zen language
//!
//! Converts source text into tokens in a single pass. Lexical errors are
//! collected rather than returned immediately, so one scan reports every
//! bad character and malformed string in the file.

use std::rc::Rc;

use log::{debug, trace};

use super::token::{Keyword, Token, TokenType};
use crate::error::{SyntaxError, ZenError, ZenResult};
use crate::source::{SourceCode, SourceLocation};

/// Lexer for Zen source code
pub struct Lexer {
    source: Rc<SourceCode>,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
    current: usize,
    line: usize,
    column: usize,
    start: usize,
    start_line: usize,
    start_column: usize,
}

impl Lexer {
    /// Create a new lexer
    pub fn new(source: Rc<SourceCode>) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
            current: 0,
            line: 1,
            column: 0,
            start: 0,
            start_line: 1,
            start_column: 0,
        }
    }

    /// Tokenize the whole source
    ///
    /// Returns every lexical error at once. The partial token list stays
    /// available through [`Lexer::tokens`] either way.
    pub fn scan(&mut self) -> ZenResult<Vec<Token>> {
        trace!("Lexing {:?}", self.source);

        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token();
        }

        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column;
        self.add_token(TokenType::Eof, "");

        debug!(
            "scanned {} tokens with {} error(s)",
            self.tokens.len(),
            self.errors.len()
        );

        if self.errors.is_empty() {
            Ok(self.tokens.clone())
        } else {
            Err(ZenError::Syntax(self.errors.clone()))
        }
    }

    /// Tokens produced so far, including those before any error
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Scan a single token
    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            // Comments
            '/' if self.peek() == '/' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }

            '"' => self.scan_string(),

            c if c.is_alphabetic() => self.scan_identifier(),

            c if c.is_ascii_digit() => self.scan_number(),

            // Compound operators
            '+' if self.match_char('+') => self.add_lexeme(TokenType::Increment),
            '-' if self.match_char('-') => self.add_lexeme(TokenType::Decrement),
            '+' if self.match_char('=') => self.add_lexeme(TokenType::PlusAssign),
            '-' if self.match_char('=') => self.add_lexeme(TokenType::MinusAssign),
            '*' if self.match_char('=') => self.add_lexeme(TokenType::StarAssign),
            '/' if self.match_char('=') => self.add_lexeme(TokenType::SlashAssign),

            '+' => self.add_lexeme(TokenType::Plus),
            '-' => self.add_lexeme(TokenType::Minus),
            '*' => self.add_lexeme(TokenType::Star),
            '/' => self.add_lexeme(TokenType::Slash),

            '=' if self.match_char('=') => self.add_lexeme(TokenType::Equal),
            '!' if self.match_char('=') => self.add_lexeme(TokenType::NotEqual),
            '>' if self.match_char('=') => self.add_lexeme(TokenType::GreaterEqual),
            '<' if self.match_char('=') => self.add_lexeme(TokenType::LessEqual),
            '>' => self.add_lexeme(TokenType::Greater),
            '<' => self.add_lexeme(TokenType::Less),

            ',' => self.add_lexeme(TokenType::Comma),
            ';' => self.add_lexeme(TokenType::Semicolon),
            '(' => self.add_lexeme(TokenType::LeftParen),
            ')' => self.add_lexeme(TokenType::RightParen),
            '{' => self.add_lexeme(TokenType::LeftBrace),
            '}' => self.add_lexeme(TokenType::RightBrace),
            '[' => self.add_lexeme(TokenType::LeftBracket),
            ']' => self.add_lexeme(TokenType::RightBracket),
            ':' => self.add_lexeme(TokenType::Colon),
            '.' => self.add_lexeme(TokenType::Dot),
            '=' => self.add_lexeme(TokenType::Assign),
            '?' => self.add_lexeme(TokenType::Question),

            c if c.is_whitespace() => {}

            _ => {
                let location = self.start_location();
                self.error(format!("Unexpected character: '{}'", c), location);
            }
        }
    }

    /// Scan a string literal, storing the unescaped contents
    fn scan_string(&mut self) {
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                let location = self.start_location();
                self.error("Unterminated string literal", location);
                return;
            }

            match self.peek() {
                '"' => {
                    self.advance();
                    break;
                }
                '\n' => {
                    let location = self.current_location();
                    self.error("Unexpected newline in string literal", location);
                    return;
                }
                '\\' => {
                    let location = self.current_location();
                    self.advance();
                    if self.is_at_end() {
                        continue;
                    }
                    match self.advance() {
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        other => {
                            self.error(format!("Invalid escape sequence: \\{}", other), location)
                        }
                    }
                }
                _ => value.push(self.advance()),
            }
        }

        self.add_token(TokenType::String, value);
    }

    /// Scan a number literal; a single '.' makes it a float
    fn scan_number(&mut self) {
        let mut seen_dot = false;

        loop {
            let c = self.peek();
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let token_type = if seen_dot { TokenType::Float } else { TokenType::Int };
        self.add_lexeme(token_type);
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let lexeme = self.lexeme();
        let token_type = match Keyword::from_str(&lexeme) {
            Some(keyword) => TokenType::Keyword(keyword),
            None => TokenType::Identifier,
        };

        self.add_token(token_type, lexeme);
    }

    fn lexeme(&self) -> String {
        (self.start..self.current)
            .map(|index| self.source.char_at(index))
            .collect()
    }

    /// Add a token whose lexeme is the consumed source text
    fn add_lexeme(&mut self, token_type: TokenType) {
        let lexeme = self.lexeme();
        self.add_token(token_type, lexeme);
    }

    fn add_token(&mut self, token_type: TokenType, lexeme: impl Into<String>) {
        let token = Token::new(token_type, lexeme, self.start_location());
        trace!("token {} {:?}", token.token_type, token.lexeme);
        self.tokens.push(token);
    }

    /// Advance to the next character
    fn advance(&mut self) -> char {
        let c = self.source.char_at(self.current);
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        c
    }

    /// Check if the next character matches and consume it if so
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    /// Peek at the current character without consuming it
    fn peek(&self) -> char {
        self.source.char_at(self.current)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn start_location(&self) -> SourceLocation {
        self.source.location(self.start_line, self.start_column)
    }

    fn current_location(&self) -> SourceLocation {
        self.source.location(self.line, self.column)
    }

    fn error(&mut self, message: impl Into<String>, location: SourceLocation) {
        let error = SyntaxError::new(message, location);
        trace!("lexical error: {}", error.message);
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize_source(source: &str) -> ZenResult<Vec<Token>> {
        let mut lexer = Lexer::new(SourceCode::inline(source));
        lexer.scan()
    }

    fn token_types(source: &str) -> Vec<TokenType> {
        tokenize_source(source)
            .unwrap()
            .into_iter()
            .map(|token| token.token_type)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        let tokens = tokenize_source("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::Eof);
    }

    #[test]
    fn test_single_character_tokens() {
        assert_eq!(
            token_types("(){}[],;.:?=+-*/<>"),
            vec![
                TokenType::LeftParen,
                TokenType::RightParen,
                TokenType::LeftBrace,
                TokenType::RightBrace,
                TokenType::LeftBracket,
                TokenType::RightBracket,
                TokenType::Comma,
                TokenType::Semicolon,
                TokenType::Dot,
                TokenType::Colon,
                TokenType::Question,
                TokenType::Assign,
                TokenType::Plus,
                TokenType::Minus,
                TokenType::Star,
                TokenType::Slash,
                TokenType::Less,
                TokenType::Greater,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_tokens() {
        assert_eq!(
            token_types("== != <= >= ++ -- += -= *= /="),
            vec![
                TokenType::Equal,
                TokenType::NotEqual,
                TokenType::LessEqual,
                TokenType::GreaterEqual,
                TokenType::Increment,
                TokenType::Decrement,
                TokenType::PlusAssign,
                TokenType::MinusAssign,
                TokenType::StarAssign,
                TokenType::SlashAssign,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_whitespace_separated_round_trip() {
        let words = ["var", "x", "=", "(", "elif", "and", "<=", "}", "not", "?"];
        let tokens = tokenize_source(&words.join(" ")).unwrap();
        assert_eq!(tokens.len(), words.len() + 1);
        for (token, word) in tokens.iter().zip(words) {
            assert_eq!(token.lexeme, word);
        }
        assert_eq!(tokens.last().unwrap().token_type, TokenType::Eof);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            token_types("var const func if elif else while for in"),
            vec![
                TokenType::Keyword(Keyword::Var),
                TokenType::Keyword(Keyword::Const),
                TokenType::Keyword(Keyword::Func),
                TokenType::Keyword(Keyword::If),
                TokenType::Keyword(Keyword::Elif),
                TokenType::Keyword(Keyword::Else),
                TokenType::Keyword(Keyword::While),
                TokenType::Keyword(Keyword::For),
                TokenType::Keyword(Keyword::In),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_unicode_whitespace_is_skipped() {
        let tokens = tokenize_source("a\u{0B}b\u{0C}c\u{00A0}d\u{2003}e").unwrap();
        let lexemes: Vec<&str> = tokens.iter().map(|token| token.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["a", "b", "c", "d", "e", ""]);
    }

    #[test]
    fn test_identifiers() {
        let tokens = tokenize_source("foo bar_baz myVar123").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Identifier);
        assert_eq!(tokens[0].lexeme, "foo");
        assert_eq!(tokens[1].lexeme, "bar_baz");
        assert_eq!(tokens[2].lexeme, "myVar123");
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize_source("42 3.14 1.2.3").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Int);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].token_type, TokenType::Float);
        assert_eq!(tokens[1].lexeme, "3.14");
        assert_eq!(tokens[2].token_type, TokenType::Float);
        assert_eq!(tokens[2].lexeme, "1.2");
        assert_eq!(tokens[3].token_type, TokenType::Dot);
        assert_eq!(tokens[4].token_type, TokenType::Int);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize_source(r#""a\"b\\c\nd\te""#).unwrap();
        assert_eq!(tokens[0].token_type, TokenType::String);
        assert_eq!(tokens[0].lexeme, "a\"b\\c\nd\te");
    }

    #[test]
    fn test_unterminated_string() {
        let result = tokenize_source("\"hello");
        if let Err(ZenError::Syntax(errors)) = result {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].message.contains("Unterminated string literal"));
        } else {
            panic!("expected a syntax error");
        }
    }

    #[test]
    fn test_newline_in_string() {
        let result = tokenize_source("\"abc\ndef\"");
        let errors = result.unwrap_err();
        assert!(errors.syntax_errors()[0]
            .message
            .contains("Unexpected newline in string literal"));
    }

    #[test]
    fn test_invalid_escape() {
        let errors = tokenize_source(r#""\q""#).unwrap_err();
        assert_eq!(errors.syntax_errors()[0].message, "Invalid escape sequence: \\q");
    }

    #[test]
    fn test_errors_accumulate() {
        let mut lexer = Lexer::new(SourceCode::inline("var a = @\nvar b = #\nvar c = 1"));
        assert!(lexer.scan().is_err());
        assert_eq!(lexer.errors().len(), 2);
        assert_eq!(lexer.errors()[1].location.as_ref().unwrap().line, 2);
        // scanning carried on past both bad characters
        assert!(lexer.tokens().iter().any(|token| token.lexeme == "c"));
        assert_eq!(lexer.tokens().last().unwrap().token_type, TokenType::Eof);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            token_types("x // comment\ny"),
            vec![TokenType::Identifier, TokenType::Identifier, TokenType::Eof]
        );
    }

    #[test]
    fn test_locations() {
        let tokens = tokenize_source("var x\n  y").unwrap();
        assert_eq!((tokens[0].location.line, tokens[0].location.column), (1, 0));
        assert_eq!((tokens[1].location.line, tokens[1].location.column), (1, 4));
        assert_eq!((tokens[2].location.line, tokens[2].location.column), (2, 2));
    }
}
