//! CSS parser for NGML.
//!
//! Parses a backtick-delimited entry of the `styles:` array into a
//! `CssBlock`: rules (`selector { property: value; ... }`) interleaved
//! with raw text runs. The declaration semicolon is optional only on the
//! last declaration of a rule.

use crate::ast::{CssBlock, CssDeclaration, CssItem, CssRule};
use ngml_lexer::TokenKind;

impl<'a> crate::Parser<'a> {
    /// Parse style items up to and including the closing backtick.
    /// Recoverable errors become diagnostics; the returned block covers
    /// whatever parsed cleanly.
    pub(crate) fn parse_css_body(&mut self) -> CssBlock {
        let mut items = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Backtick => {
                    self.advance();
                    break;
                }
                // The scanner has already reported an unterminated body.
                TokenKind::Eof => break,
                TokenKind::CssIdent(text) => {
                    let text = text.clone();
                    self.advance();
                    items.push(self.parse_css_item(text));
                }
                // Stray value text between rules stays as raw text.
                TokenKind::CssText(text) => {
                    let text = text.clone();
                    self.advance();
                    items.push(CssItem::RawText(text));
                }
                // A selector may begin with a pseudo-class marker (`:host`).
                TokenKind::Colon => {
                    self.advance();
                    items.push(self.parse_css_item(":".into()));
                }
                kind => {
                    let message = format!("Unexpected token in styles: {kind:?}");
                    let e = self.err_at_peek(message);
                    self.report(e);
                    self.advance();
                }
            }
        }
        CssBlock { items }
    }

    /// The first selector piece has been consumed. Joins further pieces
    /// (`a:hover` arrives as ident/colon/text), then parses declarations
    /// if a `{` follows; a bare run with no rule body is raw text.
    fn parse_css_item(&mut self, selector_start: String) -> CssItem {
        let mut selector = selector_start;
        loop {
            match &self.peek().kind {
                TokenKind::Colon => {
                    self.advance();
                    selector.push(':');
                }
                TokenKind::CssText(piece) => {
                    let piece = piece.clone();
                    self.advance();
                    selector.push_str(&piece);
                }
                _ => break,
            }
        }

        if !self.eat(TokenKind::LBrace) {
            return CssItem::RawText(selector);
        }

        let mut declarations = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Backtick | TokenKind::Eof => {
                    let e = self.err_at_peek(format!("Unclosed style rule '{selector}'"));
                    self.report(e);
                    break;
                }
                _ => match self.parse_css_declaration() {
                    Ok(declaration) => declarations.push(declaration),
                    Err(e) => {
                        self.report(e);
                        self.recover_css_declaration();
                    }
                },
            }
        }

        CssItem::Rule(CssRule {
            selector,
            declarations,
        })
    }

    /// `property : value ;?` — the semicolon may be omitted only before
    /// the closing `}`.
    fn parse_css_declaration(&mut self) -> Result<CssDeclaration, crate::ParseError> {
        let property = if let TokenKind::CssIdent(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            name
        } else {
            let message = format!("Expected style property, got {:?}", self.peek().kind);
            return Err(self.err_at_peek(message));
        };

        self.expect(TokenKind::Colon, "':'")?;

        let value = if let TokenKind::CssText(value) = &self.peek().kind {
            let value = value.clone();
            self.advance();
            value
        } else {
            let message = format!(
                "Expected value for style property '{property}', got {:?}",
                self.peek().kind
            );
            return Err(self.err_at_peek(message));
        };

        let has_semicolon = self.eat(TokenKind::Semi);
        if !has_semicolon && !matches!(self.peek().kind, TokenKind::RBrace) {
            let e = self.err_at_peek(format!("Expected ';' after declaration '{property}'"));
            self.report(e);
        }

        Ok(CssDeclaration {
            property,
            value,
            has_semicolon,
        })
    }

    /// Skip to the end of a broken declaration: past the next `;`, or up
    /// to the rule or body end.
    fn recover_css_declaration(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::Backtick | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
