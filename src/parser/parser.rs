//! Parser implementation
//!
//! Recursive descent with one token of lookahead. Every failure is
//! recorded as a `SyntaxError`; in the default accumulating mode the
//! parser then resynchronizes on the next statement keyword (or the end
//! of the enclosing block) and keeps going.

use std::rc::Rc;

use log::{debug, trace};

use super::ast::*;
use crate::error::{SyntaxError, ZenError, ZenResult};
use crate::lexer::{Keyword, Token, TokenType};
use crate::source::{SourceCode, SourceLocation};

type ParseResult<T> = Result<T, SyntaxError>;

/// Deepest expression, type or block nesting accepted
pub const MAX_NESTING_DEPTH: usize = 64;

/// Saved parser position for speculative parsing
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    current: usize,
    errors: usize,
    allow_map_access: bool,
}

/// Parser for Zen source code
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<SyntaxError>,
    stop_at_first_error: bool,
    allow_map_access: bool,
    /// Token index where a `{` must open the block, not a map access
    map_access_limit: Option<usize>,
    /// Map access `{` positions seen while speculating on a condition
    map_access_opens: Option<Vec<usize>>,
    depth: usize,
}

impl Parser {
    /// Create a new parser from tokens
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.token_type) != Some(TokenType::Eof) {
            let location = match tokens.last() {
                Some(token) => token.location.clone(),
                None => SourceCode::inline("").location(1, 0),
            };
            tokens.push(Token::new(TokenType::Eof, "", location));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            stop_at_first_error: false,
            allow_map_access: true,
            map_access_limit: None,
            map_access_opens: None,
            depth: 0,
        }
    }

    /// Abort on the first syntax error instead of resynchronizing
    pub fn stop_at_first_error(mut self, stop: bool) -> Self {
        self.stop_at_first_error = stop;
        self
    }

    /// Parse tokens into a program, returning every syntax error found
    ///
    /// The program holds every statement that parsed, even when errors
    /// were reported elsewhere.
    pub fn parse(&mut self) -> (Program, Vec<SyntaxError>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            let start = self.current;
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(_) if self.stop_at_first_error => break,
                Err(_) => self.synchronize(start, false),
            }
        }

        debug!(
            "parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        (Program { statements }, self.errors.clone())
    }

    /// Parse and fail if any syntax error was found
    pub fn parse_program(mut self) -> ZenResult<Program> {
        let (program, errors) = self.parse();
        if errors.is_empty() {
            Ok(program)
        } else {
            Err(ZenError::Syntax(errors))
        }
    }

    // ===== Error Recovery =====

    /// Skip ahead to a point where a new statement can start
    ///
    /// Always makes progress: if the failure happened on the statement's
    /// first token, that token is skipped. Braces opened by the broken
    /// statement are skipped as a unit.
    fn synchronize(&mut self, start: usize, in_block: bool) {
        if self.current == start {
            self.advance();
        }

        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek().token_type {
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace if depth == 0 && in_block => return,
                TokenType::RightBrace => depth = depth.saturating_sub(1),
                TokenType::Keyword(keyword) if depth == 0 && keyword.starts_statement() => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn mark(&self) -> Checkpoint {
        Checkpoint {
            current: self.current,
            errors: self.errors.len(),
            allow_map_access: self.allow_map_access,
        }
    }

    fn reset(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.current;
        self.errors.truncate(checkpoint.errors);
        self.allow_map_access = checkpoint.allow_map_access;
    }

    fn with_map_access<T>(
        &mut self,
        allowed: bool,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = self.allow_map_access;
        self.allow_map_access = allowed;
        let result = parse(self);
        self.allow_map_access = saved;
        result
    }

    /// Parse an expression that is immediately followed by a block
    ///
    /// `{` opens both map access and blocks. If the first attempt swallowed
    /// the block as a map key, parse again with each map access `{` it saw
    /// (last first) reserved for the block. Map access is disabled entirely
    /// only when none of those fits.
    fn condition_before_block(&mut self) -> ParseResult<Expr> {
        let checkpoint = self.mark();

        self.map_access_opens = Some(Vec::new());
        let first = self.expression();
        let mut opens = self.map_access_opens.take().unwrap_or_default();

        match first {
            Ok(expr) if self.check(TokenType::LeftBrace) || !expr.contains_map_access() => {
                return Ok(expr)
            }
            _ => {}
        }

        while let Some(open) = opens.pop() {
            trace!("re-parsing condition with the block at token {}", open);
            self.reset(checkpoint);
            self.map_access_limit = Some(open);
            let attempt = self.expression();
            self.map_access_limit = None;

            if let Ok(expr) = attempt {
                if self.current == open {
                    return Ok(expr);
                }
            }
        }

        trace!("re-parsing condition without map access");
        self.reset(checkpoint);
        self.with_map_access(false, |parser| parser.expression())
    }

    /// Run `parse` one nesting level deeper, failing past the limit
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            let location = self.peek().location.clone();
            return Err(self.error(
                format!("Nesting too deep (more than {} levels)", MAX_NESTING_DEPTH),
                location,
            ));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ===== Declarations =====

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.match_keyword(Keyword::Var) {
            self.var_declaration(false)
        } else if self.match_keyword(Keyword::Const) {
            self.var_declaration(true)
        } else if self.check_keyword(Keyword::Func) || self.check_keyword(Keyword::Async) {
            self.function_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self, is_const: bool) -> ParseResult<Stmt> {
        let location = self.previous().location.clone();
        let name = self.consume_identifier("Expected variable name")?;

        let type_annotation = if self.match_token(TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let is_nullable = self.match_token(TokenType::Question);

        let initializer = if self.match_token(TokenType::Assign) {
            Some(self.expression()?)
        } else {
            None
        };

        if is_const && initializer.is_none() {
            return Err(self.error(format!("Constant '{}' must be initialized", name), location));
        }

        Ok(Stmt::VarDecl {
            name,
            type_annotation,
            initializer,
            is_const,
            is_nullable,
            location,
        })
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let is_async = self.match_keyword(Keyword::Async);
        let location = self
            .consume_keyword(Keyword::Func, "Expected 'func' after 'async'")?
            .location
            .clone();
        let name = self.consume_identifier("Expected function name")?;

        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                params.push(self.parameter()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;

        let return_type = if self.match_token(TokenType::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.consume(TokenType::LeftBrace, "Expected '{' before function body")?;
        let body = self.block("Expected '}' after function body")?;

        Ok(Stmt::FunctionDecl(Rc::new(FunctionDecl {
            name,
            params,
            return_type,
            body,
            is_async,
            location,
        })))
    }

    fn parameter(&mut self) -> ParseResult<Parameter> {
        let location = self.peek().location.clone();
        let name = self.consume_identifier("Expected parameter name")?;
        self.consume(TokenType::Colon, "Expected ':' after parameter name")?;
        let type_annotation = self.parse_type()?;
        let is_nullable = self.match_token(TokenType::Question);

        let default = if self.match_token(TokenType::Assign) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Parameter {
            name,
            type_annotation,
            is_nullable,
            default,
            location,
        })
    }

    // ===== Statements =====

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_keyword(Keyword::If) {
            self.if_statement()
        } else if self.match_keyword(Keyword::For) {
            self.for_statement()
        } else if self.match_keyword(Keyword::While) {
            self.while_statement()
        } else if self.match_keyword(Keyword::Break) {
            Ok(Stmt::Break {
                location: self.previous().location.clone(),
            })
        } else if self.match_keyword(Keyword::Continue) {
            Ok(Stmt::Continue {
                location: self.previous().location.clone(),
            })
        } else if self.match_keyword(Keyword::Return) {
            self.return_statement()
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let location = self.previous().location.clone();
        let condition = self.condition_before_block()?;
        self.consume(TokenType::LeftBrace, "Expected '{' after 'if' condition")?;
        let then_branch = self.block("Expected '}' after if body")?;

        let mut elif_branches = Vec::new();
        while self.match_keyword(Keyword::Elif) {
            let location = self.previous().location.clone();
            let condition = self.condition_before_block()?;
            self.consume(TokenType::LeftBrace, "Expected '{' after 'elif' condition")?;
            let body = self.block("Expected '}' after elif body")?;
            elif_branches.push(ElifBranch {
                condition,
                body,
                location,
            });
        }

        let else_branch = if self.match_keyword(Keyword::Else) {
            self.consume(TokenType::LeftBrace, "Expected '{' after 'else'")?;
            Some(self.block("Expected '}' after else body")?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            elif_branches,
            else_branch,
            location,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let location = self.previous().location.clone();
        let condition = self.condition_before_block()?;
        self.consume(TokenType::LeftBrace, "Expected '{' after 'while' condition")?;
        let body = self.block("Expected '}' after while body")?;

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let location = self.previous().location.clone();

        if self.check(TokenType::Identifier) {
            let next = self.peek_next().token_type;
            if next == TokenType::Comma || next == TokenType::Keyword(Keyword::In) {
                return self.for_in_statement(location);
            }
        }

        let initializer = if self.check(TokenType::Semicolon) {
            None
        } else if self.match_keyword(Keyword::Var) {
            Some(Box::new(self.var_declaration(false)?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };
        self.consume(TokenType::Semicolon, "Expected ';' after for loop initializer")?;

        let condition = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::Semicolon, "Expected ';' after for loop condition")?;

        let increment = if self.check(TokenType::LeftBrace) {
            None
        } else {
            Some(self.condition_before_block()?)
        };

        self.consume(TokenType::LeftBrace, "Expected '{' after for clauses")?;
        let body = self.block("Expected '}' after for body")?;

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
            location,
        })
    }

    fn for_in_statement(&mut self, location: SourceLocation) -> ParseResult<Stmt> {
        let first = self.consume_identifier("Expected loop variable")?;
        let (key, value) = if self.match_token(TokenType::Comma) {
            let value = self.consume_identifier("Expected value variable after ','")?;
            (Some(first), value)
        } else {
            (None, first)
        };

        self.consume_keyword(Keyword::In, "Expected 'in' after loop variables")?;
        let container = self.condition_before_block()?;
        self.consume(TokenType::LeftBrace, "Expected '{' after for-in container")?;
        let body = self.block("Expected '}' after for body")?;

        Ok(Stmt::ForIn {
            key,
            value,
            container,
            body,
            location,
        })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let location = self.previous().location.clone();

        let ends_here = self.check(TokenType::RightBrace)
            || self.is_at_end()
            || matches!(self.peek().token_type, TokenType::Keyword(k) if k.starts_statement());

        let value = if ends_here {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { value, location })
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        let location = expr.location().clone();
        Ok(Stmt::Expression { expr, location })
    }

    /// Statements up to and including the closing '}'
    fn block(&mut self, close_message: &str) -> ParseResult<Vec<Stmt>> {
        let statements = self.nested(|parser| {
            let mut statements = Vec::new();

            while !parser.check(TokenType::RightBrace) && !parser.is_at_end() {
                let start = parser.current;
                match parser.declaration() {
                    Ok(stmt) => statements.push(stmt),
                    Err(error) if parser.stop_at_first_error => return Err(error),
                    Err(_) => parser.synchronize(start, true),
                }
            }

            Ok(statements)
        })?;

        self.consume(TokenType::RightBrace, close_message)?;
        Ok(statements)
    }

    // ===== Expressions =====

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.logical_or()?;

        if self.match_token(TokenType::Assign) {
            let location = self.previous().location.clone();
            let value = self.nested(Self::assignment)?;
            return Ok(Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::Assign,
                right: Box::new(value),
                location,
            });
        }

        let compound = match self.peek().token_type {
            TokenType::PlusAssign => Some(BinaryOp::Add),
            TokenType::MinusAssign => Some(BinaryOp::Subtract),
            TokenType::StarAssign => Some(BinaryOp::Multiply),
            TokenType::SlashAssign => Some(BinaryOp::Divide),
            _ => None,
        };

        if let Some(operator) = compound {
            let location = self.advance().location.clone();
            let value = self.nested(Self::assignment)?;
            return Ok(desugar_update(expr, operator, value, location));
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logical_and()?;

        while self.match_keyword(Keyword::Or) {
            let location = self.previous().location.clone();
            let right = self.logical_and()?;
            expr = binary(expr, BinaryOp::Or, right, location);
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_keyword(Keyword::And) {
            let location = self.previous().location.clone();
            let right = self.equality()?;
            expr = binary(expr, BinaryOp::And, right, location);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::Equal, BinaryOp::Equal),
            (TokenType::NotEqual, BinaryOp::NotEqual),
        ]) {
            let location = self.previous().location.clone();
            let right = self.comparison()?;
            expr = binary(expr, operator, right, location);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::Less, BinaryOp::Less),
            (TokenType::LessEqual, BinaryOp::LessEqual),
            (TokenType::Greater, BinaryOp::Greater),
            (TokenType::GreaterEqual, BinaryOp::GreaterEqual),
        ]) {
            let location = self.previous().location.clone();
            let right = self.term()?;
            expr = binary(expr, operator, right, location);
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::Plus, BinaryOp::Add),
            (TokenType::Minus, BinaryOp::Subtract),
        ]) {
            let location = self.previous().location.clone();
            let right = self.factor()?;
            expr = binary(expr, operator, right, location);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        if self.check(TokenType::Star) || self.check(TokenType::Slash) {
            let location = self.peek().location.clone();
            return Err(self.error("Expected expression before operator", location));
        }

        let mut expr = self.unary()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::Star, BinaryOp::Multiply),
            (TokenType::Slash, BinaryOp::Divide),
        ]) {
            let location = self.previous().location.clone();
            let right = self.unary()?;
            expr = binary(expr, operator, right, location);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_token(TokenType::Minus) {
            let location = self.previous().location.clone();
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Negate,
                operand: Box::new(operand),
                location,
            });
        }

        if self.match_keyword(Keyword::Not) {
            let location = self.previous().location.clone();
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Not,
                operand: Box::new(operand),
                location,
            });
        }

        if self.match_keyword(Keyword::Await) {
            let location = self.previous().location.clone();
            let expression = self.nested(Self::unary)?;
            return Ok(Expr::Await {
                expression: Box::new(expression),
                location,
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let expr = self.call()?;

        let operator = match self.peek().token_type {
            TokenType::Increment => BinaryOp::Add,
            TokenType::Decrement => BinaryOp::Subtract,
            _ => return Ok(expr),
        };

        let location = self.advance().location.clone();
        let one = Expr::Literal {
            value: Literal::Integer(1),
            location: location.clone(),
        };
        Ok(desugar_update(expr, operator, one, location))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(TokenType::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(TokenType::Dot) {
                let location = self.previous().location.clone();
                let member = self.consume_identifier("Expected property name after '.'")?;
                expr = Expr::MemberAccess {
                    object: Box::new(expr),
                    member,
                    location,
                };
            } else if self.match_token(TokenType::LeftBracket) {
                let location = self.previous().location.clone();
                let index = self.with_map_access(true, |parser| parser.expression())?;
                self.consume(TokenType::RightBracket, "Expected ']' after array index")?;
                expr = Expr::ArrayAccess {
                    array: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else if self.allow_map_access
                && self.map_access_limit != Some(self.current)
                && !is_literal(&expr)
                && self.match_token(TokenType::LeftBrace)
            {
                if let Some(opens) = &mut self.map_access_opens {
                    opens.push(self.current - 1);
                }
                let location = self.previous().location.clone();
                let key = self.with_map_access(true, |parser| parser.expression())?;
                self.consume(TokenType::RightBrace, "Expected '}' after map key")?;
                expr = Expr::MapAccess {
                    map: Box::new(expr),
                    key: Box::new(key),
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let location = self.previous().location.clone();

        let arguments = self.with_map_access(true, |parser| {
            let mut arguments = Vec::new();
            if !parser.check(TokenType::RightParen) {
                loop {
                    arguments.push(parser.expression()?);
                    if !parser.match_token(TokenType::Comma) {
                        break;
                    }
                }
            }
            Ok(arguments)
        })?;

        self.consume(TokenType::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            arguments,
            location,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let location = token.location.clone();

        let literal = match token.token_type {
            TokenType::Int => match token.lexeme.parse::<i64>() {
                Ok(value) => Literal::Integer(value),
                Err(_) => {
                    return Err(self.error(
                        format!("Invalid integer literal: {}", token.lexeme),
                        location,
                    ))
                }
            },
            TokenType::Float => match token.lexeme.parse::<f64>() {
                Ok(value) => Literal::Float(value),
                Err(_) => {
                    return Err(self.error(
                        format!("Invalid float literal: {}", token.lexeme),
                        location,
                    ))
                }
            },
            TokenType::String => Literal::String(token.lexeme.clone()),
            TokenType::Keyword(Keyword::True) => Literal::Boolean(true),
            TokenType::Keyword(Keyword::False) => Literal::Boolean(false),
            TokenType::Keyword(Keyword::Null) => Literal::Null,

            TokenType::Identifier => {
                self.advance();
                return Ok(Expr::Identifier {
                    name: token.lexeme,
                    location,
                });
            }

            TokenType::LeftParen => {
                self.advance();
                let expr = self.with_map_access(true, |parser| parser.expression())?;
                self.consume(TokenType::RightParen, "Expected ')' after expression")?;
                return Ok(expr);
            }

            TokenType::LeftBracket => {
                self.advance();
                return self.array_literal(location);
            }

            TokenType::LeftBrace if self.allow_map_access => {
                self.advance();
                return self.map_literal(location);
            }

            _ => {
                return Err(self.error(
                    format!("Expected expression, got {}", describe(&token)),
                    location,
                ))
            }
        };

        self.advance();
        Ok(Expr::Literal {
            value: literal,
            location,
        })
    }

    fn array_literal(&mut self, location: SourceLocation) -> ParseResult<Expr> {
        let elements = self.with_map_access(true, |parser| {
            let mut elements = Vec::new();
            while !parser.check(TokenType::RightBracket) {
                elements.push(parser.expression()?);
                if !parser.match_token(TokenType::Comma) {
                    break;
                }
            }
            Ok(elements)
        })?;

        self.consume(TokenType::RightBracket, "Expected ']' after array elements")?;
        Ok(Expr::ArrayLiteral { elements, location })
    }

    fn map_literal(&mut self, location: SourceLocation) -> ParseResult<Expr> {
        let entries = self.with_map_access(true, |parser| {
            let mut entries = Vec::new();
            while !parser.check(TokenType::RightBrace) {
                let key = parser.expression()?;
                parser.consume(TokenType::Colon, "Expected ':' after map key")?;
                let value = parser.expression()?;
                entries.push((key, value));
                if !parser.match_token(TokenType::Comma) {
                    break;
                }
            }
            Ok(entries)
        })?;

        self.consume(TokenType::RightBrace, "Expected '}' after map entries")?;
        Ok(Expr::MapLiteral { entries, location })
    }

    // ===== Type Parsing =====

    fn parse_type(&mut self) -> ParseResult<TypeAnnotation> {
        let token = self.peek().clone();
        let name = match token.token_type {
            TokenType::Identifier => token.lexeme,
            TokenType::Keyword(keyword) => keyword.as_str().to_string(),
            _ => return Err(self.error("Expected type name", token.location)),
        };
        self.advance();
        let location = token.location;

        if !self.match_token(TokenType::Less) {
            return Ok(TypeAnnotation::Basic { name, location });
        }

        if self.check(TokenType::Greater) {
            let at = self.peek().location.clone();
            return Err(self.error("Expected at least one type parameter", at));
        }

        let mut params = Vec::new();
        loop {
            if self.check(TokenType::Int) {
                let size = self.advance().clone();
                match size.lexeme.parse::<i64>() {
                    Ok(value) => params.push(TypeParam::Size(value)),
                    Err(_) => {
                        return Err(self.error(
                            format!("Invalid integer literal: {}", size.lexeme),
                            size.location,
                        ))
                    }
                }
            } else {
                params.push(TypeParam::Type(self.nested(Self::parse_type)?));
            }

            if !self.match_token(TokenType::Comma) {
                break;
            }
            if self.check(TokenType::Greater) {
                let at = self.previous().location.clone();
                return Err(self.error("Unexpected trailing comma in type parameters", at));
            }
        }

        self.consume(TokenType::Greater, "Expected '>' after type parameters")?;

        Ok(TypeAnnotation::Parametric {
            base: name,
            params,
            location,
        })
    }

    // ===== Helper Methods =====

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_operator(&mut self, operators: &[(TokenType, BinaryOp)]) -> Option<BinaryOp> {
        let (_, operator) = operators
            .iter()
            .find(|(token_type, _)| self.check(*token_type))?;
        self.advance();
        Some(*operator)
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        self.match_token(TokenType::Keyword(keyword))
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        let index = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<&Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            let location = self.peek().location.clone();
            Err(self.error(message, location))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword, message: &str) -> ParseResult<&Token> {
        self.consume(TokenType::Keyword(keyword), message)
    }

    fn consume_identifier(&mut self, message: &str) -> ParseResult<String> {
        Ok(self.consume(TokenType::Identifier, message)?.lexeme.clone())
    }

    fn error(&mut self, message: impl Into<String>, location: SourceLocation) -> SyntaxError {
        let error = SyntaxError::new(message, location);
        trace!("syntax error: {}", error.message);
        self.errors.push(error.clone());
        error
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr, location: SourceLocation) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        location,
    }
}

/// `target op= value` becomes `target = target op value`
fn desugar_update(target: Expr, operator: BinaryOp, value: Expr, location: SourceLocation) -> Expr {
    let updated = binary(target.clone(), operator, value, location.clone());
    binary(target, BinaryOp::Assign, updated, location)
}

fn is_literal(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Literal { .. } | Expr::ArrayLiteral { .. } | Expr::MapLiteral { .. }
    )
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".to_string(),
        TokenType::String => format!("string \"{}\"", token.lexeme),
        _ => format!("'{}'", token.lexeme),
    }
}
