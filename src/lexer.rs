use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, digit1},
    combinator::{opt, recognize},
    sequence::{pair, tuple},
    IResult,
};

use crate::ast::{Position, Span};
use crate::error::{Result, ShoalError};
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_blank();
            if self.input.is_empty() {
                break;
            }

            let start = self.position();
            if let Some(rest) = self.input.strip_prefix('\n') {
                self.input = rest;
                self.line += 1;
                self.column = 1;
                tokens.push(Token::new(TokenKind::Newline, Span::new(start, self.position())));
                continue;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        let eof = self.position();
        tokens.push(Token::new(TokenKind::Eof, Span::new(eof, eof)));
        Ok(tokens)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Skips spaces, tabs, carriage returns and `#` line comments.
    /// Newlines are significant and stay in the stream.
    fn skip_blank(&mut self) {
        loop {
            let trimmed = self.input.trim_start_matches([' ', '\t', '\r']);
            self.column += self.input.len() - trimmed.len();
            self.input = trimmed;
            if let Some(rest) = self.input.strip_prefix('#') {
                let end = rest.find('\n').unwrap_or(rest.len());
                self.column += 1 + end;
                self.input = &rest[end..];
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let start = self.position();

        if let Ok((_, ident)) = identifier(self.input) {
            let kind = match ident {
                "import" => TokenKind::Import,
                "as" => TokenKind::As,
                "struct" => TokenKind::Struct,
                "func" => TokenKind::Func,
                "let" => TokenKind::Let,
                "return" => TokenKind::Return,
                "if" => TokenKind::If,
                "else" => TokenKind::Else,
                "while" => TokenKind::While,
                "true" => TokenKind::Bool(true),
                "false" => TokenKind::Bool(false),
                _ => TokenKind::Identifier(ident.to_string()),
            };
            self.advance(ident.len());
            return Ok(Token::new(kind, Span::new(start, self.position())));
        }

        if let Ok((_, text)) = number(self.input) {
            let kind = if text.contains('.') {
                TokenKind::Float(text.parse().map_err(|_| {
                    ShoalError::lexer_error(
                        Span::new(start, start),
                        format!("malformed float literal `{}`", text),
                    )
                })?)
            } else {
                TokenKind::Int(text.parse().map_err(|_| {
                    ShoalError::lexer_error(
                        Span::new(start, start),
                        format!("integer literal `{}` out of range", text),
                    )
                })?)
            };
            self.advance(text.len());
            return Ok(Token::new(kind, Span::new(start, self.position())));
        }

        if self.input.starts_with('"') {
            return self.string_token(start);
        }

        if let Ok((_, op)) = operator(self.input) {
            let kind = match op {
                "==" => TokenKind::Eq,
                "!=" => TokenKind::NotEq,
                "<=" => TokenKind::LtEq,
                ">=" => TokenKind::GtEq,
                "&&" => TokenKind::AndAnd,
                "||" => TokenKind::OrOr,
                "(" => TokenKind::LParen,
                ")" => TokenKind::RParen,
                "{" => TokenKind::LBrace,
                "}" => TokenKind::RBrace,
                "[" => TokenKind::LBracket,
                "]" => TokenKind::RBracket,
                "," => TokenKind::Comma,
                ":" => TokenKind::Colon,
                ";" => TokenKind::Semicolon,
                "." => TokenKind::Dot,
                "|" => TokenKind::Pipe,
                "$" => TokenKind::Dollar,
                "=" => TokenKind::Assign,
                "+" => TokenKind::Plus,
                "-" => TokenKind::Minus,
                "*" => TokenKind::Star,
                "/" => TokenKind::Slash,
                "%" => TokenKind::Percent,
                "^" => TokenKind::Caret,
                "<" => TokenKind::Lt,
                ">" => TokenKind::Gt,
                "!" => TokenKind::Bang,
                _ => unreachable!(),
            };
            self.advance(op.len());
            return Ok(Token::new(kind, Span::new(start, self.position())));
        }

        let offending = self.input.chars().next().unwrap_or('\0');
        Err(ShoalError::lexer_error(
            Span::new(start, start),
            format!("unexpected character `{}`", offending),
        ))
    }

    fn string_token(&mut self, start: Position) -> Result<Token> {
        // Opening quote.
        self.advance(1);
        let mut value = String::new();
        loop {
            let mut chars = self.input.chars();
            match chars.next() {
                None => {
                    // The REPL reads this as "keep going", not as an error.
                    return Err(ShoalError::incomplete_input(Span::new(start, self.position())));
                }
                Some('"') => {
                    self.advance(1);
                    return Ok(Token::new(
                        TokenKind::Str(value),
                        Span::new(start, self.position()),
                    ));
                }
                Some('\\') => {
                    let escaped = chars.next().ok_or_else(|| {
                        ShoalError::incomplete_input(Span::new(start, self.position()))
                    })?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        other => {
                            return Err(ShoalError::lexer_error(
                                Span::new(self.position(), self.position()),
                                format!("unknown escape `\\{}`", other),
                            ))
                        }
                    }
                    self.advance(1 + escaped.len_utf8());
                }
                Some('\n') => {
                    value.push('\n');
                    self.input = &self.input[1..];
                    self.line += 1;
                    self.column = 1;
                }
                Some(c) => {
                    value.push(c);
                    self.advance(c.len_utf8());
                }
            }
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.column += self.input[..bytes].chars().count();
        self.input = &self.input[bytes..];
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(tuple((tag("."), digit1)))))(input)
}

fn operator(input: &str) -> IResult<&str, &str> {
    alt((
        alt((
            tag("=="),
            tag("!="),
            tag("<="),
            tag(">="),
            tag("&&"),
            tag("||"),
        )),
        alt((
            tag("("),
            tag(")"),
            tag("{"),
            tag("}"),
            tag("["),
            tag("]"),
            tag(","),
            tag(":"),
            tag(";"),
            tag("."),
            tag("|"),
            tag("$"),
            tag("="),
        )),
        alt((
            tag("+"),
            tag("-"),
            tag("*"),
            tag("/"),
            tag("%"),
            tag("^"),
            tag("<"),
            tag(">"),
            tag("!"),
        )),
    ))(input)
}
