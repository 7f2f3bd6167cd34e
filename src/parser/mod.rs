use std::mem;

use crate::ast::{
    BinaryOperator, Block, Expression, FunctionDecl, ImportDecl, Pipeline, PipelineElement,
    Program, Span, Statement, StructDecl, TypeExpr, UnaryOperator,
};
use crate::error::{Result, ShoalError};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Lex and parse one source unit.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Go-style restriction: no struct literals directly inside an
    /// `if`/`while` condition, so `if x {` is never ambiguous.
    no_struct_literal: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            no_struct_literal: false,
        }
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut program = Program::default();
        let mut top_names: Vec<String> = Vec::new();

        self.skip_separators();
        while !self.at(&TokenKind::Eof) {
            match self.peek().kind {
                TokenKind::Import => {
                    let import = self.parse_import()?;
                    self.claim_top_name(&mut top_names, &import.alias, import.span)?;
                    program.imports.push(import);
                }
                TokenKind::Struct => {
                    let decl = self.parse_struct()?;
                    self.claim_top_name(&mut top_names, &decl.name, decl.span)?;
                    program.structs.push(decl);
                }
                TokenKind::Func => {
                    let decl = self.parse_function()?;
                    self.claim_top_name(&mut top_names, &decl.name, decl.span)?;
                    program.functions.push(decl);
                }
                _ => {
                    let stmt = self.parse_statement()?;
                    program.statements.push(stmt);
                }
            }
            self.skip_separators();
        }
        Ok(program)
    }

    fn claim_top_name(&self, names: &mut Vec<String>, name: &str, span: Span) -> Result<()> {
        if names.iter().any(|n| n == name) {
            return Err(ShoalError::structural_error(
                span,
                format!("duplicate top-level name {}", name),
            ));
        }
        names.push(name.to_string());
        Ok(())
    }

    // Declarations

    fn parse_import(&mut self) -> Result<ImportDecl> {
        let start = self.expect(TokenKind::Import)?.span;
        let (path, path_span) = match self.bump() {
            Token {
                kind: TokenKind::Str(path),
                span,
            } => (path, span),
            Token {
                kind: TokenKind::Eof,
                span,
            } => return Err(ShoalError::incomplete_input(span)),
            other => {
                return Err(self.unexpected(&other, "a quoted module path"));
            }
        };
        let alias = if self.eat(&TokenKind::As) {
            self.expect_identifier()?.0
        } else {
            path.rsplit('/').next().unwrap_or(&path).to_string()
        };
        let end = self.previous_span();
        self.expect_statement_end()?;
        Ok(ImportDecl {
            path,
            alias,
            span: start.to(end.unwrap_or(path_span)),
        })
    }

    fn parse_struct(&mut self) -> Result<StructDecl> {
        let start = self.expect(TokenKind::Struct)?.span;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        loop {
            self.skip_separators();
            if self.at(&TokenKind::RBrace) {
                break;
            }
            let (field, _) = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            fields.push((field, ty));
            if !self.eat(&TokenKind::Comma) && !self.at_separator() && !self.at(&TokenKind::RBrace)
            {
                let tok = self.peek().clone();
                return Err(self.unexpected(&tok, "`,` or a new line between struct fields"));
            }
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(StructDecl {
            name,
            fields,
            span: start.to(end),
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDecl> {
        let start = self.expect(TokenKind::Func)?.span;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        self.skip_newlines();
        while !self.at(&TokenKind::RParen) {
            let (pname, _) = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            params.push((pname, ty));
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen)?;

        let mut returns = Vec::new();
        if self.eat(&TokenKind::Colon) {
            returns.push(self.parse_type_expr()?);
            while self.eat(&TokenKind::Comma) {
                returns.push(self.parse_type_expr()?);
            }
        }

        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(FunctionDecl {
            name,
            params,
            returns,
            body,
            span,
        })
    }

    fn parse_type_expr(&mut self) -> Result<TypeExpr> {
        if self.at(&TokenKind::LBracket) {
            let start = self.bump().span;
            self.expect(TokenKind::RBracket)?;
            let element = self.parse_type_expr()?;
            let span = start.to(element.span());
            return Ok(TypeExpr::Array {
                element: Box::new(element),
                span,
            });
        }
        let (name, span) = self.expect_identifier()?;
        if self.eat(&TokenKind::Dot) {
            let (member, mspan) = self.expect_identifier()?;
            return Ok(TypeExpr::Qualified {
                module: name,
                name: member,
                span: span.to(mspan),
            });
        }
        Ok(TypeExpr::Named { name, span })
    }

    // Statements

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut statements = Vec::new();
        self.skip_separators();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(ShoalError::incomplete_input(self.peek().span));
            }
            statements.push(self.parse_statement()?);
            self.skip_separators();
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Block {
            statements,
            span: start.to(end),
        })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek().kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            _ => self.parse_simple_statement(),
        }
    }

    fn parse_let(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::Let)?.span;
        let mut names = Vec::new();
        loop {
            let (name, _) = self.expect_identifier()?;
            let annotation = if self.eat(&TokenKind::Colon) {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            names.push((name, annotation));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Assign)?;
        let values = self.parse_expression_list()?;
        let end = values.last().map(|e| e.span()).unwrap_or(start);
        self.expect_statement_end()?;
        Ok(Statement::Let {
            names,
            values,
            span: start.to(end),
        })
    }

    fn parse_if(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_condition()?;
        let then_block = self.parse_block()?;
        let mut span = start.to(then_block.span);
        let else_block = if self.eat(&TokenKind::Else) {
            let block = if self.at(&TokenKind::If) {
                // `else if` sugar: a one-statement block.
                let nested = self.parse_if()?;
                let nested_span = nested.span();
                Block {
                    statements: vec![nested],
                    span: nested_span,
                }
            } else {
                self.parse_block()?
            };
            span = span.to(block.span);
            Some(block)
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_block,
            else_block,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::While)?.span;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(Statement::While {
            condition,
            body,
            span,
        })
    }

    fn parse_condition(&mut self) -> Result<Expression> {
        let saved = mem::replace(&mut self.no_struct_literal, true);
        let result = self.parse_expression();
        self.no_struct_literal = saved;
        result
    }

    fn parse_return(&mut self) -> Result<Statement> {
        let start = self.expect(TokenKind::Return)?.span;
        let values = if self.at_separator() || self.at(&TokenKind::RBrace) || self.at(&TokenKind::Eof)
        {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        let end = values.last().map(|e| e.span()).unwrap_or(start);
        self.expect_statement_end()?;
        Ok(Statement::Return {
            values,
            span: start.to(end),
        })
    }

    /// Expression statement, multi-target assignment, or pipeline.
    fn parse_simple_statement(&mut self) -> Result<Statement> {
        let first = self.parse_expression()?;

        if self.at(&TokenKind::Comma) || self.at(&TokenKind::Assign) {
            let mut targets = vec![first];
            while self.eat(&TokenKind::Comma) {
                targets.push(self.parse_expression()?);
            }
            self.expect(TokenKind::Assign)?;
            let values = self.parse_expression_list()?;
            let start = targets[0].span();
            let end = values.last().map(|e| e.span()).unwrap_or(start);
            self.expect_statement_end()?;
            return Ok(Statement::Assign {
                targets,
                values,
                span: start.to(end),
            });
        }

        if self.at(&TokenKind::Pipe) {
            return self.parse_pipeline(first);
        }

        self.expect_statement_end()?;
        Ok(Statement::Expression(first))
    }

    fn parse_pipeline(&mut self, head: Expression) -> Result<Statement> {
        let start = head.span();
        let mut end = start;
        let mut elements = vec![PipelineElement::Exprs {
            span: head.span(),
            exprs: vec![head],
        }];

        while self.eat(&TokenKind::Pipe) {
            // A pipeline may continue on the next line after `|`.
            self.skip_newlines();
            if self.at(&TokenKind::Let) {
                let lstart = self.bump().span;
                let mut names = Vec::new();
                loop {
                    let (name, nspan) = self.expect_identifier()?;
                    end = nspan;
                    names.push(name);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                elements.push(PipelineElement::Let {
                    names,
                    span: lstart.to(end),
                });
            } else {
                let exprs = self.parse_expression_list()?;
                let espan = exprs
                    .first()
                    .map(|e| e.span())
                    .unwrap_or(start)
                    .to(exprs.last().map(|e| e.span()).unwrap_or(start));
                end = espan;
                elements.push(PipelineElement::Exprs { exprs, span: espan });
            }
        }

        self.expect_statement_end()?;
        Ok(Statement::Pipeline(Pipeline {
            elements,
            span: start.to(end),
        }))
    }

    // Expressions

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut exprs = vec![self.parse_expression()?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::OrOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOperator::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOperator::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let op = if self.eat(&TokenKind::Eq) {
                BinaryOperator::Eq
            } else if self.eat(&TokenKind::NotEq) {
                BinaryOperator::NotEq
            } else {
                break;
            };
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.eat(&TokenKind::Lt) {
                BinaryOperator::Lt
            } else if self.eat(&TokenKind::LtEq) {
                BinaryOperator::LtEq
            } else if self.eat(&TokenKind::Gt) {
                BinaryOperator::Gt
            } else if self.eat(&TokenKind::GtEq) {
                BinaryOperator::GtEq
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.eat(&TokenKind::Plus) {
                BinaryOperator::Add
            } else if self.eat(&TokenKind::Minus) {
                BinaryOperator::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_power()?;
        loop {
            let op = if self.eat(&TokenKind::Star) {
                BinaryOperator::Mul
            } else if self.eat(&TokenKind::Slash) {
                BinaryOperator::Div
            } else if self.eat(&TokenKind::Percent) {
                BinaryOperator::Mod
            } else {
                break;
            };
            let right = self.parse_power()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expression> {
        let left = self.parse_unary()?;
        if self.eat(&TokenKind::Caret) {
            // Right-associative.
            let right = self.parse_power()?;
            return Ok(binary(BinaryOperator::Pow, left, right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = if self.at(&TokenKind::Minus) {
            Some(UnaryOperator::Neg)
        } else if self.at(&TokenKind::Bang) {
            Some(UnaryOperator::Not)
        } else {
            None
        };
        if let Some(op) = op {
            let start = self.bump().span;
            let operand = self.parse_unary()?;
            let span = start.to(operand.span());
            return Ok(Expression::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at(&TokenKind::LBracket) {
                self.bump();
                let index = self.in_delimited(Self::parse_expression)?;
                let end = self.expect(TokenKind::RBracket)?.span;
                let span = expr.span().to(end);
                expr = Expression::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.at(&TokenKind::Dot) {
                self.bump();
                let (field, fspan) = self.expect_identifier()?;
                let span = expr.span().to(fspan);
                expr = Expression::Dot {
                    base: Box::new(expr),
                    field,
                    span,
                };
            } else if self.at(&TokenKind::LParen) {
                let args = self.parse_call_args()?;
                let span = expr.span().to(self.previous_span().unwrap_or(expr.span()));
                expr = Expression::Call {
                    callee: Box::new(expr),
                    args,
                    span,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expression>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.at(&TokenKind::RParen) {
            args.push(self.in_delimited(Self::parse_expression)?);
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int(value) => {
                self.bump();
                Ok(Expression::IntLiteral {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Float(value) => {
                self.bump();
                Ok(Expression::FloatLiteral {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Bool(value) => {
                self.bump();
                Ok(Expression::BoolLiteral {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Str(ref value) => {
                self.bump();
                Ok(Expression::StrLiteral {
                    value: value.clone(),
                    span: token.span,
                })
            }
            TokenKind::Identifier(ref name) => {
                self.bump();
                if self.at(&TokenKind::LBrace) && !self.no_struct_literal {
                    return self.parse_struct_literal(name.clone(), token.span);
                }
                Ok(Expression::Identifier {
                    name: name.clone(),
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.in_delimited(Self::parse_expression)?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.bump();
                let mut elements = Vec::new();
                self.skip_newlines();
                while !self.at(&TokenKind::RBracket) {
                    elements.push(self.in_delimited(Self::parse_expression)?);
                    self.skip_newlines();
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                    self.skip_newlines();
                }
                let end = self.expect(TokenKind::RBracket)?.span;
                Ok(Expression::Array {
                    elements,
                    span: token.span.to(end),
                })
            }
            TokenKind::Dollar => {
                self.bump();
                let (command, _) = self.expect_identifier()?;
                let args = self.parse_call_args()?;
                let span = token
                    .span
                    .to(self.previous_span().unwrap_or(token.span));
                Ok(Expression::ProcessCall {
                    command,
                    args,
                    span,
                })
            }
            TokenKind::Eof => Err(ShoalError::incomplete_input(token.span)),
            _ => Err(self.unexpected(&token, "an expression")),
        }
    }

    fn parse_struct_literal(&mut self, name: String, start: Span) -> Result<Expression> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        self.skip_separators();
        while !self.at(&TokenKind::RBrace) {
            let (field, _) = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let value = self.in_delimited(Self::parse_expression)?;
            fields.push((field, value));
            self.skip_separators();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_separators();
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Expression::StructLiteral {
            name,
            fields,
            span: start.to(end),
        })
    }

    /// Runs `f` with struct literals re-enabled; delimiters make the
    /// `if x {` ambiguity impossible inside.
    fn in_delimited<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = mem::replace(&mut self.no_struct_literal, false);
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }

    // Token plumbing

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.peek().kind) == mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(&kind) {
            Ok(self.bump())
        } else {
            let token = self.peek().clone();
            if token.kind == TokenKind::Eof {
                return Err(ShoalError::incomplete_input(token.span));
            }
            Err(ShoalError::parser_error(
                token.span,
                format!("expected {}, found {}", kind, token.kind),
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.bump();
                Ok((name, token.span))
            }
            TokenKind::Eof => Err(ShoalError::incomplete_input(token.span)),
            _ => Err(self.unexpected(&token, "an identifier")),
        }
    }

    fn unexpected(&self, token: &Token, wanted: &str) -> ShoalError {
        ShoalError::parser_error(
            token.span,
            format!("expected {}, found {}", wanted, token.kind),
        )
    }

    fn previous_span(&self) -> Option<Span> {
        self.pos.checked_sub(1).map(|i| self.tokens[i].span)
    }

    fn at_separator(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semicolon)
    }

    fn skip_newlines(&mut self) {
        while self.at(&TokenKind::Newline) {
            self.bump();
        }
    }

    fn skip_separators(&mut self) {
        while self.at_separator() {
            self.bump();
        }
    }

    fn expect_statement_end(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.bump();
                Ok(())
            }
            TokenKind::Eof | TokenKind::RBrace => Ok(()),
            _ => {
                let token = self.peek().clone();
                Err(self.unexpected(&token, "end of statement"))
            }
        }
    }
}

fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
    let span = left.span().to(right.span());
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}
