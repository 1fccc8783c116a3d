use crate::error::{LoxError, Span};
use crate::token::{Token, TokenType};
use crate::value::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Turns source text into tokens. Bad characters are reported and skipped, so a
/// single scan collects every lexical error in the input.
pub struct Scanner {
    source: Vec<char>,
    tokens: Vec<Token>,
    errors: Vec<LoxError>,
    start: usize,
    current: usize,
    line: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("and", TokenType::And);
        keywords.insert("class", TokenType::Class);
        keywords.insert("else", TokenType::Else);
        keywords.insert("false", TokenType::False);
        keywords.insert("for", TokenType::For);
        keywords.insert("fun", TokenType::Fun);
        keywords.insert("if", TokenType::If);
        keywords.insert("nil", TokenType::Nil);
        keywords.insert("or", TokenType::Or);
        keywords.insert("print", TokenType::Print);
        keywords.insert("return", TokenType::Return);
        keywords.insert("super", TokenType::Super);
        keywords.insert("this", TokenType::This);
        keywords.insert("true", TokenType::True);
        keywords.insert("var", TokenType::Var);
        keywords.insert("while", TokenType::While);

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            errors: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            keywords,
        }
    }

    /// Scans the whole input. The token list always ends with `Eof`, even when
    /// errors were reported.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<LoxError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            None,
            self.line,
            Span::new(self.current, self.current),
        ));

        debug!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "scan finished"
        );
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),
            '!' => {
                let token_type = if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(token_type);
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                trace!(line = self.line, character = %c, "unexpected character");
                self.errors.push(
                    LoxError::lex_error(
                        Span::single(self.start),
                        self.line,
                        format!("Unexpected character '{}'.", c),
                    )
                    .with_help("Lox source may only contain operators, literals, identifiers and comments."),
                );
            }
        }
    }

    fn advance(&mut self) -> char {
        match self.source.get(self.current) {
            Some(&c) => {
                self.current += 1;
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    fn string(&mut self) {
        let start_line = self.line;
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.errors.push(
                LoxError::lex_error(
                    Span::new(self.start, self.current),
                    self.line,
                    "Unterminated string.".to_string(),
                )
                .with_help(format!("The string opened on line {} needs a closing '\"'.", start_line)),
            );
            return;
        }

        // Consume the closing "
        self.advance();

        let value = self.text(self.start + 1, self.current - 1);
        self.add_token_with_literal(TokenType::String, Some(Value::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Look for a fractional part; a trailing '.' is left for the next token
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let number_slice = self.text(self.start, self.current);
        match number_slice.parse::<f64>() {
            Ok(n) => self.add_token_with_literal(TokenType::Number, Some(Value::Number(n))),
            Err(_) => self.errors.push(LoxError::lex_error(
                Span::new(self.start, self.current),
                self.line,
                format!("Invalid number '{}'.", number_slice),
            )),
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.text(self.start, self.current);
        let token_type = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_token_with_literal(token_type, None);
    }

    fn add_token_with_literal(&mut self, token_type: TokenType, literal: Option<Value>) {
        let lexeme = self.text(self.start, self.current);
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            literal,
            self.line,
            Span::new(self.start, self.current),
        ));
    }
}

/// Scans `source` into tokens plus any lexical diagnostics.
pub fn scan(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    Scanner::new(source).scan_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        scan(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn two_character_operators() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                TokenType::Bang,
                TokenType::BangEqual,
                TokenType::Equal,
                TokenType::EqualEqual,
                TokenType::Less,
                TokenType::LessEqual,
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 / 2 // three\n4"),
            vec![
                TokenType::Number,
                TokenType::Slash,
                TokenType::Number,
                TokenType::Number,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            kinds("true True var_ print"),
            vec![
                TokenType::True,
                TokenType::Identifier,
                TokenType::Identifier,
                TokenType::Print,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let (tokens, errors) = scan("12.");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Value::Number(12.0)));
        assert_eq!(tokens[1].kind, TokenType::Dot);
    }

    #[test]
    fn multiline_string_advances_line() {
        let (tokens, errors) = scan("\"a\nb\" x");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Value::from("a\nb")));
        assert_eq!(tokens[0].lexeme, "\"a\nb\"");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unexpected_characters_do_not_stop_scanning() {
        let (tokens, errors) = scan("1 @ 2 # 3");
        assert_eq!(errors.len(), 2);
        assert_eq!(tokens.len(), 4);
        assert!(errors.iter().all(|e| e.message.starts_with("Unexpected character")));
    }

    #[test]
    fn unterminated_string_reports_last_line() {
        let (tokens, errors) = scan("\"abc\n\ndef");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].message, "Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenType::Eof));
    }
}
