//! Expression parser for NGML.
//!
//! A strict precedence ladder, lowest to highest binding: assignment,
//! conditional, logical-or, logical-and, equality, relational, additive,
//! multiplicative, unary prefix, postfix, primary. Binary tiers fold
//! left-associatively; assignment and conditional recurse to the right.
//! Precedence is embedded structurally in the tree, so no binding-power
//! table is needed.

use crate::ast::{BinaryOp, Expr, ObjectProperty, PostfixPart, UnaryOp};
use crate::ParseError;
use ngml_lexer::TokenKind;

impl<'a> crate::Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    /// `target = value`, right-associative. The target is whatever the
    /// conditional tier produced; validity of the target is a semantic
    /// question left to downstream passes.
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_conditional()?;
        if self.eat(TokenKind::Equals) {
            let value = self.parse_assignment()?;
            return Ok(Expr::Assign {
                target: Box::new(left),
                value: Box::new(value),
            });
        }
        Ok(left)
    }

    /// `cond ? then : else` — both branches re-enter the full grammar.
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_logical_or()?;
        if self.eat(TokenKind::Question) {
            let then = self.parse_expr()?;
            self.expect(TokenKind::Colon, "':'")?;
            let else_ = self.parse_expr()?;
            return Ok(Expr::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                else_: Box::new(else_),
            });
        }
        Ok(cond)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.eat(TokenKind::OrOr) {
            let right = self.parse_logical_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.eat(TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Lte,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// A primary followed by any number of calls, member accesses, and
    /// post-increments, kept in source order.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        let mut parts = Vec::new();

        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    parts.push(PostfixPart::Call(self.parse_call_args()?));
                }
                TokenKind::Dot => {
                    self.advance();
                    parts.push(PostfixPart::Member(self.expect_identifier("property name")?));
                }
                TokenKind::Increment => {
                    self.advance();
                    parts.push(PostfixPart::Increment);
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            Ok(base)
        } else {
            Ok(Expr::Postfix {
                base: Box::new(base),
                parts,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match &self.peek().kind {
            TokenKind::Number(text) => {
                let text = text.clone();
                self.advance();
                Ok(Expr::NumberLit(text))
            }
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(Expr::StringLit(value))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLit(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit(false))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expr::This)
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::Identifier(name))
            }
            TokenKind::New => self.parse_new(),
            TokenKind::LParen => self.parse_paren_or_arrow(),
            TokenKind::LBrace => Ok(Expr::ObjectLiteral(self.parse_object_properties()?)),
            TokenKind::LBracket => Ok(Expr::ArrayLiteral(self.parse_array_items(false)?)),
            kind => {
                let message = format!("Expected expression, got {kind:?}");
                Err(self.err_at_peek(message))
            }
        }
    }

    /// `new Name(.Name)* ( args? )` — the callee is a dotted qualified
    /// name, not a general expression.
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::New, "'new'")?;
        let mut callee = vec![self.expect_identifier("type name")?];
        while self.eat(TokenKind::Dot) {
            callee.push(self.expect_identifier("type name")?);
        }
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.parse_call_args()?;
        Ok(Expr::New { callee, args })
    }

    /// At a `(`: either a parenthesized expression or an arrow function.
    /// Decided by bounded lookahead — arrow parameters are identifiers
    /// only, so four tokens always settle it: `()` followed by `=>`, or
    /// `(ident,`, or `(ident)` followed by `=>`.
    fn parse_paren_or_arrow(&mut self) -> Result<Expr, ParseError> {
        if self.arrow_ahead() {
            return self.parse_arrow();
        }
        self.expect(TokenKind::LParen, "'('")?;
        let inner = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Grouped(Box::new(inner)))
    }

    fn arrow_ahead(&mut self) -> bool {
        if matches!(self.peek_nth(1).kind, TokenKind::RParen) {
            return matches!(self.peek_nth(2).kind, TokenKind::Arrow);
        }
        if matches!(self.peek_nth(1).kind, TokenKind::Identifier(_)) {
            return match self.peek_nth(2).kind {
                TokenKind::Comma => true,
                TokenKind::RParen => matches!(self.peek_nth(3).kind, TokenKind::Arrow),
                _ => false,
            };
        }
        false
    }

    /// `( ident (, ident)* )? => expr` — single-expression body only.
    fn parse_arrow(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier("arrow parameter")?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Arrow, "'=>'")?;
        let body = self.parse_expr()?;
        Ok(Expr::Arrow {
            params,
            body: Box::new(body),
        })
    }

    /// Arguments after a consumed `(`, through the closing `)`.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    /// `{ key : value (, key : value)* }`, empty allowed.
    pub(crate) fn parse_object_properties(&mut self) -> Result<Vec<ObjectProperty>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut properties = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RBrace) {
            loop {
                let key = self.expect_identifier("object key")?;
                self.expect(TokenKind::Colon, "':'")?;
                let value = self.parse_expr()?;
                properties.push(ObjectProperty { key, value });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(properties)
    }
}
