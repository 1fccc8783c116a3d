use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::error::{LoxError, Location, Span};
use crate::token::{Token, TokenType};
use crate::value::Value;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Deepest grouping, unary, assignment or block nesting accepted in one declaration.
/// Parsing and evaluation recurse once per level and must fit a 2 MiB thread stack.
pub const MAX_NESTING: usize = 64;

/// Recursive-descent parser. Errors are collected rather than returned early: a
/// failed declaration is dropped, the parser skips to the next statement boundary,
/// and parsing carries on.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<LoxError>,
    /// Names declared in each open block, innermost last.
    scopes: Vec<HashSet<String>>,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        // The scanner always terminates with Eof; keep that true for hand-built input too.
        let mut tokens = tokens;
        if tokens.last().map(|t| t.kind) != Some(TokenType::Eof) {
            let (line, span) = tokens
                .last()
                .map(|t| (t.line, Span::new(t.span.end, t.span.end)))
                .unwrap_or((1, Span::default()));
            tokens.push(Token::new(TokenType::Eof, String::new(), None, line, span));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            scopes: vec![HashSet::new()],
            depth: 0,
        }
    }

    pub fn parse(mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parse finished"
        );
        (statements, self.errors)
    }

    /// Parses one declaration, recovering from any error inside it.
    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_types(&[TokenType::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?.clone();

        let redeclared = self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains(&name.lexeme));
        if redeclared {
            let error = self
                .error(&name, format!("Already a variable named '{}' in this scope.", name.lexeme))
                .with_help("Assign to the existing variable, or declare it in a nested block.");
            self.errors.push(error);
        }

        let initializer = if self.match_types(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone());
        }
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        if self.match_types(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_types(&[TokenType::LeftBrace]) {
            let brace = self.previous().clone();
            Ok(Stmt::Block {
                statements: self.nested(&brace, Self::block)?,
            })
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        self.scopes.push(HashSet::new());

        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.scopes.pop();
        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn print_statement(&mut self) -> Result<Stmt, LoxError> {
        let keyword = self.previous().clone();
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { keyword, expr })
    }

    fn expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr = self.equality()?;

        if self.match_types(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.nested(&equals, Self::assignment)?;

            if let Expr::Variable { name } = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }

            // Reported, but the statement itself is still well-formed
            let error = self
                .error(&equals, "Invalid assignment target.".to_string())
                .with_help("Only a variable name can appear on the left-hand side of '='.");
            self.errors.push(error);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.comparison()?;

        while self.match_types(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let token = self.previous().clone();
            let operator = match token.kind {
                TokenType::BangEqual => BinaryOp::NotEqual,
                TokenType::EqualEqual => BinaryOp::Equal,
                _ => unreachable!(),
            };
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.term()?;

        while self.match_types(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let token = self.previous().clone();
            let operator = match token.kind {
                TokenType::Greater => BinaryOp::Greater,
                TokenType::GreaterEqual => BinaryOp::GreaterEqual,
                TokenType::Less => BinaryOp::Less,
                TokenType::LessEqual => BinaryOp::LessEqual,
                _ => unreachable!(),
            };
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.factor()?;

        while self.match_types(&[TokenType::Minus, TokenType::Plus]) {
            let token = self.previous().clone();
            let operator = match token.kind {
                TokenType::Minus => BinaryOp::Subtract,
                TokenType::Plus => BinaryOp::Add,
                _ => unreachable!(),
            };
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Slash, TokenType::Star]) {
            let token = self.previous().clone();
            let operator = match token.kind {
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Star => BinaryOp::Multiply,
                _ => unreachable!(),
            };
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if self.match_types(&[TokenType::Bang, TokenType::Minus]) {
            let token = self.previous().clone();
            let operator = match token.kind {
                TokenType::Bang => UnaryOp::Not,
                TokenType::Minus => UnaryOp::Negate,
                _ => unreachable!(),
            };
            let operand = self.nested(&token, Self::unary)?;
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
                token,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        if self.match_types(&[TokenType::False]) {
            return Ok(Expr::Literal {
                value: Value::Bool(false),
            });
        }
        if self.match_types(&[TokenType::True]) {
            return Ok(Expr::Literal {
                value: Value::Bool(true),
            });
        }
        if self.match_types(&[TokenType::Nil]) {
            return Ok(Expr::Literal { value: Value::Nil });
        }

        if self.match_types(&[TokenType::Number, TokenType::String]) {
            let value = self.previous().literal.clone().unwrap_or(Value::Nil);
            return Ok(Expr::Literal { value });
        }

        if self.match_types(&[TokenType::Identifier]) {
            return Ok(Expr::Variable {
                name: self.previous().clone(),
            });
        }

        if self.match_types(&[TokenType::LeftParen]) {
            let paren = self.previous().clone();
            let expr = self.nested(&paren, Self::expression)?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                expr: Box::new(expr),
            });
        }

        let token = self.peek().clone();
        let error = self.error(&token, "Expect expression.".to_string());
        // Identifiers and literals were handled above, so a word here is reserved
        Err(if token.lexeme.starts_with(|c: char| c.is_alphabetic()) {
            error.with_help(format!("'{}' is a reserved word and cannot be used here.", token.lexeme))
        } else {
            error
        })
    }

    /// Runs one nested rule, failing at `token` once the nesting limit is reached.
    fn nested<T>(
        &mut self,
        token: &Token,
        rule: fn(&mut Self) -> Result<T, LoxError>,
    ) -> Result<T, LoxError> {
        if self.depth >= MAX_NESTING {
            return Err(self
                .error(token, "Too much nesting.".to_string())
                .with_help(format!("At most {} levels of nesting are allowed.", MAX_NESTING)));
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Skips tokens until just after a ';' or just before a statement keyword.
    fn synchronize(&mut self) {
        let from = self.current;
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenType::Semicolon {
                break;
            }
            if self.peek().kind.starts_statement() {
                break;
            }
            self.advance();
        }

        trace!(skipped = self.current - from, line = self.peek().line, "synchronized");
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(*token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().kind == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, LoxError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            Err(self.error(&token, message.to_string()))
        }
    }

    fn error(&self, token: &Token, message: String) -> LoxError {
        let location = if token.kind == TokenType::Eof {
            Location::AtEnd
        } else {
            Location::At(token.lexeme.clone())
        };
        LoxError::parse_error(token.span, token.line, location, message)
    }
}

/// Parses a token stream into statements plus any syntax diagnostics.
pub fn parse(tokens: Vec<Token>) -> (Vec<Stmt>, Vec<LoxError>) {
    Parser::new(tokens).parse()
}
