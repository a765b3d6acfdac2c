//! Token definitions for the Zen language
//!
//! This module defines all token types used in lexical analysis.

use crate::source::SourceLocation;
use std::fmt;

/// A token in the Zen language
///
/// For string literals `lexeme` holds the unescaped contents, without quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    /// Create a new token
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            token_type,
            lexeme: lexeme.into(),
            location,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.token_type == TokenType::Keyword(keyword)
    }
}

/// Token types in the Zen language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    Int,
    Float,
    String,

    // Identifiers and keywords
    Identifier,
    Keyword(Keyword),

    // Arithmetic
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /

    // Comparison
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=

    // Assignment
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=
    Increment,   // ++
    Decrement,   // --

    // Delimiters
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Dot,          // .
    Colon,        // :
    Semicolon,    // ;
    Question,     // ?

    Eof,
}

/// Keywords in the Zen language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Declarations
    Var,
    Const,
    Func,
    Async,

    // Control flow
    If,
    Elif,
    Else,
    For,
    In,
    While,
    When,
    Where,
    Break,
    Continue,
    Return,

    // Operators
    And,
    Or,
    Not,
    Await,

    // Literals
    True,
    False,
    Null,

    // Reserved
    Import,
    Package,
    Class,
    Interface,
    Implements,
    Extends,
    New,
    This,
    Super,
    Pub,
}

impl Keyword {
    /// Get keyword from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "var" => Some(Self::Var),
            "const" => Some(Self::Const),
            "func" => Some(Self::Func),
            "async" => Some(Self::Async),
            "if" => Some(Self::If),
            "elif" => Some(Self::Elif),
            "else" => Some(Self::Else),
            "for" => Some(Self::For),
            "in" => Some(Self::In),
            "while" => Some(Self::While),
            "when" => Some(Self::When),
            "where" => Some(Self::Where),
            "break" => Some(Self::Break),
            "continue" => Some(Self::Continue),
            "return" => Some(Self::Return),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "await" => Some(Self::Await),
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "null" => Some(Self::Null),
            "import" => Some(Self::Import),
            "package" => Some(Self::Package),
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "implements" => Some(Self::Implements),
            "extends" => Some(Self::Extends),
            "new" => Some(Self::New),
            "this" => Some(Self::This),
            "super" => Some(Self::Super),
            "pub" => Some(Self::Pub),
            _ => None,
        }
    }

    /// Get string representation of keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Const => "const",
            Self::Func => "func",
            Self::Async => "async",
            Self::If => "if",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::While => "while",
            Self::When => "when",
            Self::Where => "where",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Return => "return",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Await => "await",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Import => "import",
            Self::Package => "package",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Implements => "implements",
            Self::Extends => "extends",
            Self::New => "new",
            Self::This => "this",
            Self::Super => "super",
            Self::Pub => "pub",
        }
    }

    /// Keywords the parser resynchronizes on after an error
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Var
                | Self::Const
                | Self::Func
                | Self::Class
                | Self::If
                | Self::For
                | Self::While
                | Self::Return
                | Self::When
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Identifier => write!(f, "identifier"),
            Self::Keyword(kw) => write!(f, "keyword '{}'", kw),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Equal => write!(f, "=="),
            Self::NotEqual => write!(f, "!="),
            Self::Less => write!(f, "<"),
            Self::LessEqual => write!(f, "<="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEqual => write!(f, ">="),
            Self::Assign => write!(f, "="),
            Self::PlusAssign => write!(f, "+="),
            Self::MinusAssign => write!(f, "-="),
            Self::StarAssign => write!(f, "*="),
            Self::SlashAssign => write!(f, "/="),
            Self::Increment => write!(f, "++"),
            Self::Decrement => write!(f, "--"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Question => write!(f, "?"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceCode;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("var"), Some(Keyword::Var));
        assert_eq!(Keyword::from_str("func"), Some(Keyword::Func));
        assert_eq!(Keyword::from_str("elif"), Some(Keyword::Elif));
        assert_eq!(Keyword::from_str("null"), Some(Keyword::Null));
        assert_eq!(Keyword::from_str("print"), None);
        assert_eq!(Keyword::from_str("Var"), None);
    }

    #[test]
    fn test_keyword_round_trip() {
        for word in ["and", "or", "not", "await", "async", "when", "pub"] {
            let keyword = Keyword::from_str(word).unwrap();
            assert_eq!(keyword.as_str(), word);
        }
    }

    #[test]
    fn test_token_is_keyword() {
        let location = SourceCode::inline("if").location(1, 0);
        let token = Token::new(TokenType::Keyword(Keyword::If), "if", location.clone());
        assert!(token.is_keyword(Keyword::If));
        assert!(!token.is_keyword(Keyword::Elif));
        assert!(!Token::new(TokenType::Identifier, "if_", location).is_keyword(Keyword::If));
    }

    #[test]
    fn test_sync_keywords() {
        assert!(Keyword::Var.starts_statement());
        assert!(Keyword::When.starts_statement());
        assert!(!Keyword::Else.starts_statement());
        assert!(!Keyword::Break.starts_statement());
    }
}
