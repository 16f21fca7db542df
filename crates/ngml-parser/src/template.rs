//! Template parser for NGML.
//!
//! Parses the HTML-like body of a `template:` value into `TemplateNode`s:
//! elements, interpolations, and text runs. An attribute's form is decided
//! purely by its opening delimiter — bare name, `[name]`, `(name)`,
//! `[(name)]`, or `*name`. Bound forms carry their raw expression text
//! opaquely; re-parsing it is a downstream concern, which keeps this
//! grammar decoupled from expression reentry.

use crate::ast::{Attribute, Element, TemplateAst, TemplateNode};
use crate::ParseError;
use ngml_lexer::TokenKind;

impl<'a> crate::Parser<'a> {
    /// Parse template nodes up to and including the closing backtick.
    /// Recoverable errors become diagnostics; the returned AST covers
    /// whatever parsed cleanly.
    pub(crate) fn parse_template_body(&mut self) -> TemplateAst {
        let mut nodes = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Backtick => {
                    self.advance();
                    break;
                }
                // The scanner has already reported an unterminated body.
                TokenKind::Eof => break,
                _ => match self.parse_template_node() {
                    Ok(Some(node)) => push_node(&mut nodes, node),
                    Ok(None) => {}
                    Err(e) => {
                        self.report(e);
                        self.recover_template();
                    }
                },
            }
        }
        TemplateAst { nodes }
    }

    /// One node. Whitespace-only text yields `None` and is dropped.
    fn parse_template_node(&mut self) -> Result<Option<TemplateNode>, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Text(text) => {
                if text.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(TemplateNode::Text(text)))
                }
            }
            TokenKind::Interpolation(content) => Ok(Some(TemplateNode::Interpolation(content))),
            TokenKind::TagOpen(name) => Ok(Some(TemplateNode::Element(self.parse_element(name)?))),
            TokenKind::TagClose(name) => Err(ParseError::at(
                format!("Unexpected closing tag </{name}>"),
                token.span,
            )),
            kind => Err(ParseError::at(
                format!("Unexpected token in template: {kind:?}"),
                token.span,
            )),
        }
    }

    /// The tag name has been consumed; parse attributes until `>` or
    /// `/>`, then children until the matching closing tag. The closing
    /// name must match the opening name; a mismatch is reported and the
    /// element is closed there so siblings keep parsing.
    fn parse_element(&mut self, tag_name: String) -> Result<Element, ParseError> {
        let mut attributes = Vec::new();

        let self_closing = loop {
            let token = self.advance();
            match token.kind {
                TokenKind::TagEnd => break false,
                TokenKind::TagSelfClose => break true,

                // name or name="value"
                TokenKind::AttrName(name) => {
                    let value = if self.eat(TokenKind::Equals) {
                        Some(self.expect_attr_value()?)
                    } else {
                        None
                    };
                    attributes.push(Attribute::Plain { name, value });
                }

                // [name]="expr" or [(name)]="expr"
                TokenKind::LBracket => {
                    if self.eat(TokenKind::LParen) {
                        let name = self.expect_attr_name()?;
                        self.expect(TokenKind::RParen, "')'")?;
                        self.expect(TokenKind::RBracket, "']'")?;
                        let expr = self.expect_bound_value()?;
                        attributes.push(Attribute::TwoWay { name, expr });
                    } else {
                        let name = self.expect_attr_name()?;
                        self.expect(TokenKind::RBracket, "']'")?;
                        let expr = self.expect_bound_value()?;
                        attributes.push(Attribute::BoundProperty { name, expr });
                    }
                }

                // (name)="expr"
                TokenKind::LParen => {
                    let name = self.expect_attr_name()?;
                    self.expect(TokenKind::RParen, "')'")?;
                    let expr = self.expect_bound_value()?;
                    attributes.push(Attribute::BoundEvent { name, expr });
                }

                // *name="expr"
                TokenKind::Star => {
                    let name = self.expect_attr_name()?;
                    let expr = self.expect_bound_value()?;
                    attributes.push(Attribute::Structural { name, expr });
                }

                // Unterminated tag; already reported by the scanner.
                TokenKind::Eof => {
                    return Ok(Element {
                        tag_name,
                        attributes,
                        children: Vec::new(),
                    });
                }

                kind => {
                    return Err(ParseError::at(
                        format!("Unexpected token in tag <{tag_name}>: {kind:?}"),
                        token.span,
                    ));
                }
            }
        };

        let mut children = Vec::new();
        if !self_closing {
            loop {
                match self.peek().kind {
                    TokenKind::TagClose(_) => {
                        let token = self.advance();
                        if let TokenKind::TagClose(close_name) = token.kind {
                            if close_name != tag_name {
                                self.report(ParseError::at(
                                    format!(
                                        "Mismatched closing tag: expected </{tag_name}>, found </{close_name}>"
                                    ),
                                    token.span,
                                ));
                            }
                        }
                        break;
                    }
                    TokenKind::Backtick | TokenKind::Eof => {
                        let e = self.err_at_peek(format!("Missing closing tag for <{tag_name}>"));
                        self.report(e);
                        break;
                    }
                    _ => match self.parse_template_node() {
                        Ok(Some(node)) => push_node(&mut children, node),
                        Ok(None) => {}
                        Err(e) => {
                            self.report(e);
                            self.recover_template();
                        }
                    },
                }
            }
        }

        Ok(Element {
            tag_name,
            attributes,
            children,
        })
    }

    fn expect_attr_name(&mut self) -> Result<String, ParseError> {
        if let TokenKind::AttrName(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            let message = format!("Expected attribute name, got {:?}", self.peek().kind);
            Err(self.err_at_peek(message))
        }
    }

    fn expect_attr_value(&mut self) -> Result<String, ParseError> {
        if let TokenKind::AttrValue(value) = &self.peek().kind {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            let message = format!("Expected attribute value, got {:?}", self.peek().kind);
            Err(self.err_at_peek(message))
        }
    }

    /// All bound attribute forms require `= "raw text"`.
    fn expect_bound_value(&mut self) -> Result<String, ParseError> {
        self.expect(TokenKind::Equals, "'='")?;
        self.expect_attr_value()
    }

    /// Skip to the next node boundary. Tokens inside a broken tag are
    /// dropped through the closing `>`.
    fn recover_template(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Backtick
                | TokenKind::Eof
                | TokenKind::TagOpen(_)
                | TokenKind::TagClose(_)
                | TokenKind::Text(_)
                | TokenKind::Interpolation(_) => return,
                TokenKind::TagEnd | TokenKind::TagSelfClose => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Append a node, concatenating adjacent text runs into one `Text`.
fn push_node(nodes: &mut Vec<TemplateNode>, node: TemplateNode) {
    if let TemplateNode::Text(new) = &node {
        if let Some(TemplateNode::Text(prev)) = nodes.last_mut() {
            prev.push_str(new);
            return;
        }
    }
    nodes.push(node);
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::{Diagnostic, Parser};
    use ngml_lexer::Mode;
    use pretty_assertions::assert_eq;

    /// Helper: parse a backtick-wrapped template body, returning the AST
    /// and any diagnostics.
    fn template_with_diags(body: &str) -> (TemplateAst, Vec<Diagnostic>) {
        let source = format!("`{body}`");
        let mut parser = Parser::new(&source);
        parser.advance(); // opening backtick
        parser.enter_mode(Mode::Template);
        let ast = parser.parse_template_body();
        let diagnostics = parser.diagnostics().to_vec();
        (ast, diagnostics)
    }

    /// Helper: parse a template body, requiring no diagnostics.
    fn template(body: &str) -> TemplateAst {
        let (ast, diagnostics) = template_with_diags(body);
        assert_eq!(diagnostics, vec![]);
        ast
    }

    fn first_element(ast: &TemplateAst) -> &Element {
        match &ast.nodes[0] {
            TemplateNode::Element(el) => el,
            other => panic!("Expected element, got {other:?}"),
        }
    }

    // =========================================================================
    // Basic nodes
    // =========================================================================

    #[test]
    fn test_empty_template() {
        assert!(template("").nodes.is_empty());
    }

    #[test]
    fn test_text_node() {
        assert_eq!(
            template("hello").nodes,
            vec![TemplateNode::Text("hello".into())]
        );
    }

    #[test]
    fn test_interpolation_trimmed() {
        assert_eq!(
            template("{{ title }}").nodes,
            vec![TemplateNode::Interpolation("title".into())]
        );
    }

    #[test]
    fn test_text_and_interpolation_mix() {
        assert_eq!(
            template("Hello {{ name }}!").nodes,
            vec![
                TemplateNode::Text("Hello ".into()),
                TemplateNode::Interpolation("name".into()),
                TemplateNode::Text("!".into()),
            ]
        );
    }

    #[test]
    fn test_simple_element() {
        let ast = template("<h1>{{ title }}</h1>");
        let el = first_element(&ast);
        assert_eq!(el.tag_name, "h1");
        assert!(el.attributes.is_empty());
        assert_eq!(
            el.children,
            vec![TemplateNode::Interpolation("title".into())]
        );
    }

    #[test]
    fn test_self_closing_element() {
        let ast = template("<input />");
        let el = first_element(&ast);
        assert_eq!(el.tag_name, "input");
        assert!(el.children.is_empty());
    }

    // =========================================================================
    // Attribute classification
    // =========================================================================

    #[test]
    fn test_all_five_attribute_forms_in_source_order() {
        let ast =
            template("<input [value]=\"x\" (click)=\"y()\" [(ngModel)]=\"z\" *ngIf=\"c\" disabled>");
        let el = first_element(&ast);
        assert_eq!(
            el.attributes,
            vec![
                Attribute::BoundProperty {
                    name: "value".into(),
                    expr: "x".into(),
                },
                Attribute::BoundEvent {
                    name: "click".into(),
                    expr: "y()".into(),
                },
                Attribute::TwoWay {
                    name: "ngModel".into(),
                    expr: "z".into(),
                },
                Attribute::Structural {
                    name: "ngIf".into(),
                    expr: "c".into(),
                },
                Attribute::Plain {
                    name: "disabled".into(),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn test_plain_attribute_with_value() {
        let ast = template("<a href=\"/home\">x</a>");
        let el = first_element(&ast);
        assert_eq!(
            el.attributes,
            vec![Attribute::Plain {
                name: "href".into(),
                value: Some("/home".into()),
            }]
        );
    }

    #[test]
    fn test_bound_expr_kept_opaque() {
        let ast = template("<li *ngFor=\"let t of todos\"></li>");
        let el = first_element(&ast);
        assert_eq!(
            el.attributes,
            vec![Attribute::Structural {
                name: "ngFor".into(),
                expr: "let t of todos".into(),
            }]
        );
    }

    #[test]
    fn test_bound_property_requires_value() {
        let (_, diagnostics) = template_with_diags("<p [hidden]></p>");
        assert!(!diagnostics.is_empty());
    }

    // =========================================================================
    // Nesting
    // =========================================================================

    #[test]
    fn test_nested_elements() {
        let ast = template("<div><span>a</span><span>b</span></div>");
        let el = first_element(&ast);
        assert_eq!(el.children.len(), 2);
        match &el.children[0] {
            TemplateNode::Element(span) => {
                assert_eq!(span.tag_name, "span");
                assert_eq!(span.children, vec![TemplateNode::Text("a".into())]);
            }
            other => panic!("Expected span element, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_only_text_dropped() {
        let ast = template("<div>\n  <p>x</p>\n  <p>y</p>\n</div>");
        let el = first_element(&ast);
        assert_eq!(el.children.len(), 2);
        assert!(el
            .children
            .iter()
            .all(|n| matches!(n, TemplateNode::Element(_))));
    }

    #[test]
    fn test_sibling_elements_at_top_level() {
        let ast = template("<header></header><main></main>");
        assert_eq!(ast.nodes.len(), 2);
    }

    // =========================================================================
    // Tag matching and recovery
    // =========================================================================

    #[test]
    fn test_mismatched_tag_reports_and_recovers() {
        let (ast, diagnostics) = template_with_diags("<div></span><p></p>");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("Mismatched closing tag"));
        // Both the broken div and the following sibling are in the AST.
        assert_eq!(ast.nodes.len(), 2);
        match &ast.nodes[1] {
            TemplateNode::Element(p) => assert_eq!(p.tag_name, "p"),
            other => panic!("Expected p element, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_closing_tag_reports() {
        let (ast, diagnostics) = template_with_diags("</div><p></p>");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("Unexpected closing tag"));
        assert_eq!(ast.nodes.len(), 1);
    }

    #[test]
    fn test_missing_closing_tag_reports() {
        let (ast, diagnostics) = template_with_diags("<div><p>x</p>");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("Missing closing tag"));
        // The partial element is still returned.
        assert_eq!(ast.nodes.len(), 1);
    }
}
